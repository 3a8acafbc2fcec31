//! Document store contract.
//!
//! The listing engine only needs a handful of primitives from the backing
//! store: ordered bounded find with projection, count, single-document writes
//! and index creation. Everything is keyed by the 12-byte primary id stored in
//! the `_id` field.

use async_trait::async_trait;
use bizstore_query::{ObjectId, Predicate, SortDir};

/// A stored document: a JSON object with an `_id` field.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Errors surfaced by a [`DocumentStore`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("duplicate key in `{collection}` for index `{key}`")]
    DuplicateKey { collection: String, key: String },

    #[error("collection `{0}` has no text index")]
    MissingTextIndex(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for bizstore_query::Error {
    fn from(e: StoreError) -> Self {
        bizstore_query::Error::Store(e.to_string())
    }
}

/// Row ordering for [`DocumentStore::find`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SortSpec {
    #[default]
    Unordered,
    /// Compound key; earlier keys take precedence.
    Keys(Vec<(String, SortDir)>),
    /// Text-match score descending. Only valid with a text predicate.
    TextScore,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: SortSpec,
    pub limit: Option<u64>,
    /// Top-level fields to return. `_id` is always returned.
    pub projection: Option<Vec<String>>,
    /// When set and the predicate contains a text node, the match score is
    /// written into each returned document under this name.
    pub score_field: Option<String>,
}

impl FindOptions {
    #[must_use]
    pub fn sorted(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn score_into(mut self, field: &str) -> Self {
        self.score_field = Some(field.to_owned());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexKey {
    Asc(String),
    Desc(String),
    Text(String),
}

impl IndexKey {
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            IndexKey::Asc(f) | IndexKey::Desc(f) | IndexKey::Text(f) => f,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub keys: Vec<IndexKey>,
    pub unique: bool,
}

impl IndexSpec {
    #[must_use]
    pub fn new(name: &str, keys: Vec<IndexKey>) -> Self {
        Self {
            name: name.to_owned(),
            keys,
            unique: false,
        }
    }

    /// Text index over `fields`.
    #[must_use]
    pub fn text(name: &str, fields: &[&str]) -> Self {
        Self::new(
            name,
            fields.iter().map(|f| IndexKey::Text((*f).to_owned())).collect(),
        )
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        self.keys.iter().any(|k| matches!(k, IndexKey::Text(_)))
    }
}

/// Backing store for every entity collection.
///
/// Implementations must be safe to share across tasks; the handle is
/// immutable after construction.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create an index if it does not already exist.
    async fn create_index(&self, collection: &str, index: IndexSpec) -> Result<(), StoreError>;

    async fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, collection: &str, predicate: &Predicate) -> Result<u64, StoreError>;

    /// Insert a new document. Fails with `DuplicateKey` if `_id` or any unique
    /// index key is already taken.
    async fn insert_one(&self, collection: &str, doc: Document) -> Result<(), StoreError>;

    /// Replace the document with primary id `id`, inserting it when absent
    /// and `upsert` is set. Returns whether a document was written.
    async fn replace_one(
        &self,
        collection: &str,
        id: ObjectId,
        doc: Document,
        upsert: bool,
    ) -> Result<bool, StoreError>;

    /// Set top-level fields on the document with primary id `id`. Returns
    /// whether it existed.
    async fn update_one(
        &self,
        collection: &str,
        id: ObjectId,
        set: Document,
    ) -> Result<bool, StoreError>;

    /// Returns whether a document was removed.
    async fn delete_one(&self, collection: &str, id: ObjectId) -> Result<bool, StoreError>;
}

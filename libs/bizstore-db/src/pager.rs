//! Pagination executor.
//!
//! [`Pager`] is a small fluent builder that combines the filter builder with
//! one bounded store scan:
//!
//! ```ignore
//! let page = Pager::<CustomerSort>::new(store, "customers")
//!     .archived_status(status::ARCHIVED)
//!     .project(Customer::LITE_FIELDS)
//!     .fetch(&query, decode::<CustomerLite>)
//!     .await?;
//! ```
//!
//! Ordered pages are fetched with `page_size + 1` rows. The extra row only
//! signals that another page exists; it is trimmed before mapping, and the
//! next cursor is encoded from the last row that is returned.

use std::marker::PhantomData;

use bizstore_query::{
    BuiltList, Cursor, ID_FIELD, ListQuery, Ordering, Page, PageInfo, Result, SortField,
    TEXT_SCORE_FIELD, build_list,
};
use serde::de::DeserializeOwned;

use crate::record::status;
use crate::store::{Document, DocumentStore, FindOptions, SortSpec};

/// Decode a stored document into `T`.
///
/// # Errors
/// `Error::Store` if the document does not have the shape of `T`.
pub fn decode<T: DeserializeOwned>(doc: Document) -> Result<T> {
    serde_json::from_value(serde_json::Value::Object(doc))
        .map_err(|e| bizstore_query::Error::Store(format!("cannot decode document: {e}")))
}

#[must_use]
pub struct Pager<'a, F: SortField> {
    store: &'a dyn DocumentStore,
    collection: &'a str,
    archived_status: i32,
    projection: Option<&'a [&'a str]>,
    _sort: PhantomData<F>,
}

impl<'a, F: SortField> Pager<'a, F> {
    pub fn new(store: &'a dyn DocumentStore, collection: &'a str) -> Self {
        Self {
            store,
            collection,
            archived_status: status::ARCHIVED,
            projection: None,
            _sort: PhantomData,
        }
    }

    /// Status code excluded by `exclude_archived`.
    pub fn archived_status(mut self, code: i32) -> Self {
        self.archived_status = code;
        self
    }

    /// Restrict fetched documents to `fields`. The primary id and the sort
    /// field are always fetched.
    pub fn project(mut self, fields: &'a [&'a str]) -> Self {
        self.projection = Some(fields);
        self
    }

    /// Fetch one page and map each row with `map`.
    ///
    /// # Errors
    /// Builder errors (`InvalidFilter`, `UnsupportedSort`, `CursorCorrupt`),
    /// `Store` for store failures, and any error returned by `map`.
    pub async fn fetch<D, M>(self, q: &ListQuery, mut map: M) -> Result<Page<D>>
    where
        M: FnMut(Document) -> Result<D>,
    {
        let BuiltList {
            predicate,
            ordering,
            page_size,
        } = build_list::<F>(q, self.archived_status)?;

        let (sort, extra) = match ordering {
            Ordering::Unordered => (SortSpec::Unordered, None),
            Ordering::TextScore => (SortSpec::TextScore, None),
            Ordering::Field { field, dir, .. } => (
                SortSpec::Keys(vec![(field.to_owned(), dir), (ID_FIELD.to_owned(), dir)]),
                Some(field),
            ),
        };

        let mut opts = FindOptions::default()
            .sorted(sort)
            .limit(page_size.saturating_add(1))
            .score_into(TEXT_SCORE_FIELD);
        if let Some(fields) = self.projection {
            opts = opts.project(fields.iter().copied().chain(extra));
        }

        let mut rows = self
            .store
            .find(self.collection, &predicate, &opts)
            .await
            .map_err(|e| {
                tracing::error!(collection = self.collection, error = %e, "page fetch failed");
                bizstore_query::Error::from(e)
            })?;

        let limit = usize::try_from(page_size).unwrap_or(usize::MAX);
        let has_next_page = rows.len() > limit;
        rows.truncate(limit);

        let next_cursor = match (has_next_page, ordering, rows.last()) {
            (true, Ordering::Field { .. }, Some(last)) => {
                Some(Cursor::for_row::<F>(last, &q.sort_field)?.encode())
            }
            _ => None,
        };

        tracing::debug!(
            collection = self.collection,
            rows = rows.len(),
            has_next_page,
            sort_field = %q.sort_field,
            "fetched page"
        );

        let items = rows.into_iter().map(&mut map).collect::<Result<Vec<_>>>()?;
        Ok(Page::new(
            items,
            PageInfo {
                next_cursor,
                has_next_page,
                limit: page_size,
            },
        ))
    }
}

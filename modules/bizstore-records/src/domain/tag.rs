use bizstore_db::{LiteView, Record, RecordMeta};
use bizstore_query::{ListFilter, ListQuery, ObjectId, Terms};
use serde::{Deserialize, Serialize};

use super::TagRef;
use super::fields::Fields;

sort_fields! {
    pub enum TagSort {
        Name => (Fields::NAME, Text),
        CreatedAt => (Fields::CREATED_AT, Timestamp),
    }
}

/// A free-form label applied to customers, associates and orders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Tag {
    #[must_use]
    pub fn new(tenant_id: ObjectId, name: &str) -> Self {
        Self {
            meta: RecordMeta::new(Some(tenant_id)),
            name: name.to_owned(),
            description: String::new(),
        }
    }

    /// The embedded form stored on tagged records.
    #[must_use]
    pub fn to_ref(&self) -> TagRef {
        TagRef {
            id: self.meta.id,
            text: self.name.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TagLite {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub name: String,
}

impl LiteView for TagLite {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

impl Record for Tag {
    type Sort = TagSort;
    type Lite = TagLite;

    const ENTITY: &'static str = "tag";
    const TEXT_FIELDS: &'static [&'static str] = &[Fields::NAME, "description"];
    const LITE_FIELDS: &'static [&'static str] = &["status", Fields::NAME];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

#[derive(Clone, Debug, Default)]
pub struct TagFilter {
    pub page: ListQuery,
    pub name: String,
    pub search_text: String,
}

impl ListFilter for TagFilter {
    fn to_query(&self) -> ListQuery {
        self.page.clone().terms(
            Terms::new()
                .substring(Fields::NAME, &self.name)
                .text(&self.search_text),
        )
    }
}

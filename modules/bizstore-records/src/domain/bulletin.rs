use bizstore_db::{LiteView, Record, RecordMeta};
use bizstore_query::{ListFilter, ListQuery, ObjectId, Terms};
use serde::{Deserialize, Serialize};

use super::fields::Fields;

sort_fields! {
    pub enum BulletinSort {
        CreatedAt => (Fields::CREATED_AT, Timestamp),
    }
}

/// A tenant-wide announcement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bulletin {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub text: String,
}

impl Bulletin {
    #[must_use]
    pub fn new(tenant_id: ObjectId, text: &str) -> Self {
        Self {
            meta: RecordMeta::new(Some(tenant_id)),
            text: text.to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BulletinLite {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub text: String,
}

impl LiteView for BulletinLite {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn label(&self) -> String {
        self.text.clone()
    }
}

impl Record for Bulletin {
    type Sort = BulletinSort;
    type Lite = BulletinLite;

    const ENTITY: &'static str = "bulletin";
    const TEXT_FIELDS: &'static [&'static str] = &["text"];
    const LITE_FIELDS: &'static [&'static str] = &["text"];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

#[derive(Clone, Debug, Default)]
pub struct BulletinFilter {
    pub page: ListQuery,
    pub search_text: String,
}

impl ListFilter for BulletinFilter {
    fn to_query(&self) -> ListQuery {
        self.page.clone().terms(Terms::new().text(&self.search_text))
    }
}

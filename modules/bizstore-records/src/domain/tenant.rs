use bizstore_db::{LiteView, Record, RecordMeta};
use bizstore_query::{ListFilter, ListQuery, ObjectId, Terms};
use serde::{Deserialize, Serialize};

use super::fields::Fields;

sort_fields! {
    pub enum TenantSort {
        Name => (Fields::NAME, Text),
        CreatedAt => (Fields::CREATED_AT, Timestamp),
    }
}

/// An organisation using the system. Tenants are not themselves
/// tenant-scoped, so their public ids come from one shared sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    #[serde(default)]
    pub timezone: String,
}

impl Tenant {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            meta: RecordMeta::new(None),
            name: name.to_owned(),
            timezone: "UTC".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TenantLite {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub public_id: u64,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub name: String,
}

impl LiteView for TenantLite {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

impl Record for Tenant {
    type Sort = TenantSort;
    type Lite = TenantLite;

    const ENTITY: &'static str = "tenant";
    const TEXT_FIELDS: &'static [&'static str] = &[Fields::NAME];
    const LITE_FIELDS: &'static [&'static str] = &["public_id", "status", Fields::NAME];
    const TENANT_SCOPED: bool = false;

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

#[derive(Clone, Debug, Default)]
pub struct TenantFilter {
    pub page: ListQuery,
    pub name: String,
    pub search_text: String,
}

impl ListFilter for TenantFilter {
    fn to_query(&self) -> ListQuery {
        self.page.clone().terms(
            Terms::new()
                .substring(Fields::NAME, &self.name)
                .text(&self.search_text),
        )
    }
}

use bizstore_db::{LiteView, Record, RecordMeta};
use bizstore_query::{ListFilter, ListQuery, ObjectId, Terms};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fields::Fields;
use super::lexical_name;

sort_fields! {
    pub enum StaffSort {
        LexicalName => (Fields::LEXICAL_NAME, Text),
        JoinDate => (Fields::JOIN_DATE, Timestamp),
        CreatedAt => (Fields::CREATED_AT, Timestamp),
    }
}

/// An in-house employee of the tenant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub first_name: String,
    pub last_name: String,
    pub lexical_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub join_date: DateTime<Utc>,
}

impl Staff {
    #[must_use]
    pub fn new(tenant_id: ObjectId, first_name: &str, last_name: &str) -> Self {
        let meta = RecordMeta::new(Some(tenant_id));
        Self {
            join_date: meta.created_at,
            meta,
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            lexical_name: lexical_name(first_name, last_name),
            email: String::new(),
            phone: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct StaffLite {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub public_id: u64,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub lexical_name: String,
}

impl LiteView for StaffLite {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn label(&self) -> String {
        self.lexical_name.clone()
    }
}

impl Record for Staff {
    type Sort = StaffSort;
    type Lite = StaffLite;

    const ENTITY: &'static str = "staff";
    const TEXT_FIELDS: &'static [&'static str] =
        &[Fields::FIRST_NAME, Fields::LAST_NAME, Fields::EMAIL, "phone"];
    const LITE_FIELDS: &'static [&'static str] = &["public_id", "status", Fields::LEXICAL_NAME];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

#[derive(Clone, Debug, Default)]
pub struct StaffFilter {
    pub page: ListQuery,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub join_date_gte: Option<DateTime<Utc>>,
    pub join_date_lte: Option<DateTime<Utc>>,
    pub search_text: String,
}

impl ListFilter for StaffFilter {
    fn to_query(&self) -> ListQuery {
        self.page.clone().terms(
            Terms::new()
                .substring(Fields::FIRST_NAME, &self.first_name)
                .substring(Fields::LAST_NAME, &self.last_name)
                .substring(Fields::EMAIL, &self.email)
                .between(Fields::JOIN_DATE, self.join_date_gte, self.join_date_lte)
                .text(&self.search_text),
        )
    }
}

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use std::sync::Arc;

use bizstore_db::{
    Collection, DocumentStore, LatestPublicId, LiteView, MemoryStore, OpCtx, Record, RecordMeta,
};
use bizstore_query::{ListFilter, ListQuery, ObjectId, SortDir, SortField, SortKind, Terms};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContactSort {
    LexicalName,
    JoinDate,
}

impl SortField for ContactSort {
    const FIELDS: &'static [Self] = &[ContactSort::LexicalName, ContactSort::JoinDate];

    fn name(&self) -> &'static str {
        match self {
            ContactSort::LexicalName => "lexical_name",
            ContactSort::JoinDate => "join_date",
        }
    }

    fn kind(&self) -> SortKind {
        match self {
            ContactSort::LexicalName => SortKind::Text,
            ContactSort::JoinDate => SortKind::Timestamp,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub lexical_name: String,
    pub email: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub join_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<ObjectId>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ContactLite {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub lexical_name: String,
}

impl LiteView for ContactLite {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn label(&self) -> String {
        self.lexical_name.clone()
    }
}

impl Record for Contact {
    type Sort = ContactSort;
    type Lite = ContactLite;

    const ENTITY: &'static str = "contact";
    const TEXT_FIELDS: &'static [&'static str] = &["lexical_name", "email"];
    const LITE_FIELDS: &'static [&'static str] = &["public_id", "status", "lexical_name"];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

#[derive(Clone, Debug, Default)]
pub struct ContactFilter {
    pub query: ListQuery,
    pub email: String,
    pub owner_id: Option<ObjectId>,
    pub join_gte: Option<DateTime<Utc>>,
    pub join_lte: Option<DateTime<Utc>>,
    pub search_text: String,
}

impl ListFilter for ContactFilter {
    fn to_query(&self) -> ListQuery {
        self.query.clone().terms(
            Terms::new()
                .eq_str("email", &self.email)
                .eq_id("owner_id", self.owner_id)
                .between("join_date", self.join_gte, self.join_lte)
                .text(&self.search_text),
        )
    }
}

pub fn day(n: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(n * 86_400_000).unwrap()
}

/// Primary id whose order follows `n`.
pub fn oid(n: u32) -> ObjectId {
    ObjectId::from_parts(0x6500_0000, [7; 5], n)
}

pub fn contact(tenant: ObjectId, name: &str, join: DateTime<Utc>) -> Contact {
    Contact {
        meta: RecordMeta::new(Some(tenant)),
        lexical_name: name.to_owned(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        join_date: join,
        owner_id: None,
    }
}

pub async fn contacts(store: Arc<dyn DocumentStore>) -> Collection<Contact> {
    Collection::open(store, "contacts", Arc::new(LatestPublicId))
        .await
        .unwrap()
}

pub async fn memory_contacts() -> Collection<Contact> {
    contacts(Arc::new(MemoryStore::new())).await
}

pub fn sorted(tenant: ObjectId, field: &str, dir: SortDir, page_size: u64) -> ContactFilter {
    ContactFilter {
        query: ListQuery::new(page_size)
            .tenant(Some(tenant))
            .sorted(field, dir),
        ..ContactFilter::default()
    }
}

/// Follow cursors until the last page, collecting every item.
pub async fn drain(coll: &Collection<Contact>, mut filter: ContactFilter) -> Vec<Contact> {
    let ctx = OpCtx::new();
    let mut out = Vec::new();
    loop {
        let page = coll.list(&ctx, &filter).await.unwrap();
        out.extend(page.items);
        if !page.page_info.has_next_page {
            return out;
        }
        filter.query.cursor = page.page_info.next_cursor;
        assert!(filter.query.cursor.is_some());
    }
}

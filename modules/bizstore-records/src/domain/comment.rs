use bizstore_db::{LiteView, Record, RecordMeta};
use bizstore_query::{ListFilter, ListQuery, ObjectId, Terms};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fields::Fields;
use super::owner::{Owned, OwnerKind};

sort_fields! {
    pub enum CommentSort {
        CreatedAt => (Fields::CREATED_AT, Timestamp),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associate_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<ObjectId>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<ObjectId>,
}

impl Comment {
    #[must_use]
    pub fn new(tenant_id: ObjectId, content: &str) -> Self {
        Self {
            meta: RecordMeta::new(Some(tenant_id)),
            customer_id: None,
            associate_id: None,
            staff_id: None,
            order_id: None,
            content: content.to_owned(),
            created_by: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CommentLite {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub public_id: u64,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub content: String,
}

impl LiteView for CommentLite {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn label(&self) -> String {
        self.content.chars().take(40).collect()
    }
}

impl Record for Comment {
    type Sort = CommentSort;
    type Lite = CommentLite;

    const ENTITY: &'static str = "comment";
    const TEXT_FIELDS: &'static [&'static str] = &["content"];
    const LITE_FIELDS: &'static [&'static str] = &["public_id", "status", "content"];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl Owned for Comment {
    const OWNERS: &'static [OwnerKind] = &[
        OwnerKind::Customer,
        OwnerKind::Associate,
        OwnerKind::Staff,
        OwnerKind::Order,
    ];
}

#[derive(Clone, Debug, Default)]
pub struct CommentFilter {
    pub page: ListQuery,
    pub customer_id: Option<ObjectId>,
    pub associate_id: Option<ObjectId>,
    pub staff_id: Option<ObjectId>,
    pub order_id: Option<ObjectId>,
    pub created_by: Option<ObjectId>,
    pub created_at_gte: Option<DateTime<Utc>>,
    pub created_at_lte: Option<DateTime<Utc>>,
    pub search_text: String,
}

impl ListFilter for CommentFilter {
    fn to_query(&self) -> ListQuery {
        self.page.clone().terms(
            Terms::new()
                .eq_id(Fields::CUSTOMER_ID, self.customer_id)
                .eq_id(Fields::ASSOCIATE_ID, self.associate_id)
                .eq_id(Fields::STAFF_ID, self.staff_id)
                .eq_id(Fields::ORDER_ID, self.order_id)
                .eq_id("created_by", self.created_by)
                .between(Fields::CREATED_AT, self.created_at_gte, self.created_at_lte)
                .text(&self.search_text),
        )
    }
}

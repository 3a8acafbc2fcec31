use bizstore_db::{LiteView, Record, RecordMeta};
use bizstore_query::{ListFilter, ListQuery, ObjectId, Terms};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fields::Fields;
use super::owner::{Owned, OwnerKind};

sort_fields! {
    pub enum AttachmentSort {
        Title => ("title", Text),
        CreatedAt => (Fields::CREATED_AT, Timestamp),
    }
}

/// Metadata of an uploaded file. The bytes live elsewhere, at `file_url`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
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
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub filename: String,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub file_url: String,
}

impl Attachment {
    #[must_use]
    pub fn new(tenant_id: ObjectId, title: &str, filename: &str) -> Self {
        Self {
            meta: RecordMeta::new(Some(tenant_id)),
            customer_id: None,
            associate_id: None,
            staff_id: None,
            order_id: None,
            title: title.to_owned(),
            description: String::new(),
            filename: filename.to_owned(),
            content_type: String::new(),
            file_url: String::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AttachmentLite {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub public_id: u64,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub filename: String,
}

impl LiteView for AttachmentLite {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn label(&self) -> String {
        self.title.clone()
    }
}

impl Record for Attachment {
    type Sort = AttachmentSort;
    type Lite = AttachmentLite;

    const ENTITY: &'static str = "attachment";
    const TEXT_FIELDS: &'static [&'static str] = &["title", "description", "filename"];
    const LITE_FIELDS: &'static [&'static str] = &["public_id", "status", "title", "filename"];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl Owned for Attachment {
    const OWNERS: &'static [OwnerKind] = &[
        OwnerKind::Customer,
        OwnerKind::Associate,
        OwnerKind::Staff,
        OwnerKind::Order,
    ];
}

#[derive(Clone, Debug, Default)]
pub struct AttachmentFilter {
    pub page: ListQuery,
    pub customer_id: Option<ObjectId>,
    pub associate_id: Option<ObjectId>,
    pub staff_id: Option<ObjectId>,
    pub order_id: Option<ObjectId>,
    pub content_type: String,
    pub created_at_gte: Option<DateTime<Utc>>,
    pub created_at_lte: Option<DateTime<Utc>>,
    pub search_text: String,
}

impl ListFilter for AttachmentFilter {
    fn to_query(&self) -> ListQuery {
        self.page.clone().terms(
            Terms::new()
                .eq_id(Fields::CUSTOMER_ID, self.customer_id)
                .eq_id(Fields::ASSOCIATE_ID, self.associate_id)
                .eq_id(Fields::STAFF_ID, self.staff_id)
                .eq_id(Fields::ORDER_ID, self.order_id)
                .eq_str("content_type", &self.content_type)
                .between(Fields::CREATED_AT, self.created_at_gte, self.created_at_lte)
                .text(&self.search_text),
        )
    }
}

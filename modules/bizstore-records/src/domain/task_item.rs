use bizstore_db::{LiteView, Record, RecordMeta};
use bizstore_query::{ListFilter, ListQuery, ObjectId, Terms, Tristate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fields::Fields;
use super::owner::{Owned, OwnerKind};

sort_fields! {
    pub enum TaskItemSort {
        DueDate => ("due_date", Timestamp),
        CreatedAt => (Fields::CREATED_AT, Timestamp),
    }
}

/// A follow-up attached to an order and the people involved in it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskItem {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associate_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<ObjectId>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub is_closed: bool,
}

impl TaskItem {
    #[must_use]
    pub fn new(tenant_id: ObjectId, title: &str, due_date: DateTime<Utc>) -> Self {
        Self {
            meta: RecordMeta::new(Some(tenant_id)),
            order_id: None,
            customer_id: None,
            associate_id: None,
            staff_id: None,
            title: title.to_owned(),
            description: String::new(),
            due_date,
            is_closed: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TaskItemLite {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub public_id: u64,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_closed: bool,
}

impl LiteView for TaskItemLite {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn label(&self) -> String {
        self.title.clone()
    }
}

impl Record for TaskItem {
    type Sort = TaskItemSort;
    type Lite = TaskItemLite;

    const ENTITY: &'static str = "task_item";
    const TEXT_FIELDS: &'static [&'static str] = &["title", "description"];
    const LITE_FIELDS: &'static [&'static str] = &["public_id", "status", "title", "is_closed"];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

impl Owned for TaskItem {
    const OWNERS: &'static [OwnerKind] = &[
        OwnerKind::Customer,
        OwnerKind::Associate,
        OwnerKind::Staff,
        OwnerKind::Order,
    ];
}

#[derive(Clone, Debug, Default)]
pub struct TaskItemFilter {
    pub page: ListQuery,
    pub order_id: Option<ObjectId>,
    pub customer_id: Option<ObjectId>,
    pub associate_id: Option<ObjectId>,
    pub staff_id: Option<ObjectId>,
    pub is_closed: Tristate,
    pub due_date_gte: Option<DateTime<Utc>>,
    pub due_date_lte: Option<DateTime<Utc>>,
    pub search_text: String,
}

impl ListFilter for TaskItemFilter {
    fn to_query(&self) -> ListQuery {
        self.page.clone().terms(
            Terms::new()
                .eq_id(Fields::ORDER_ID, self.order_id)
                .eq_id(Fields::CUSTOMER_ID, self.customer_id)
                .eq_id(Fields::ASSOCIATE_ID, self.associate_id)
                .eq_id(Fields::STAFF_ID, self.staff_id)
                .flag("is_closed", self.is_closed)
                .between("due_date", self.due_date_gte, self.due_date_lte)
                .text(&self.search_text),
        )
    }
}

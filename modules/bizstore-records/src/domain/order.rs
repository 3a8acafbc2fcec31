use bizstore_db::{IndexKey, IndexSpec, LiteView, Record, RecordMeta};
use bizstore_query::{ListFilter, ListQuery, ObjectId, Terms, Tristate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fields::Fields;
use super::owner::{Owned, OwnerKind};
use super::{SkillSetRef, TagRef};

sort_fields! {
    pub enum OrderSort {
        AssignmentDate => ("assignment_date", Timestamp),
        StartDate => ("start_date", Timestamp),
        CreatedAt => (Fields::CREATED_AT, Timestamp),
    }
}

/// A unit of work a customer asked for, optionally assigned to an associate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub customer_id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associate_id: Option<ObjectId>,
    /// Denormalized `lexical_name` of the customer.
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub associate_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub assignment_date: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_date: DateTime<Utc>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_ongoing: bool,
    #[serde(default)]
    pub tags: Vec<TagRef>,
    #[serde(default)]
    pub skill_sets: Vec<SkillSetRef>,
}

impl Order {
    #[must_use]
    pub fn new(tenant_id: ObjectId, customer_id: ObjectId, description: &str) -> Self {
        let meta = RecordMeta::new(Some(tenant_id));
        Self {
            assignment_date: meta.created_at,
            start_date: meta.created_at,
            meta,
            customer_id,
            associate_id: None,
            customer_name: String::new(),
            associate_name: String::new(),
            description: description.to_owned(),
            completion_date: None,
            is_ongoing: false,
            tags: Vec::new(),
            skill_sets: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct OrderLite {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub public_id: u64,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub description: String,
}

impl LiteView for OrderLite {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn label(&self) -> String {
        format!("#{} {}", self.public_id, self.customer_name)
    }
}

impl Record for Order {
    type Sort = OrderSort;
    type Lite = OrderLite;

    const ENTITY: &'static str = "order";
    const TEXT_FIELDS: &'static [&'static str] = &[
        "customer_name",
        "associate_name",
        "description",
        "tags.text",
        "skill_sets.sub_category",
    ];
    const LITE_FIELDS: &'static [&'static str] =
        &["public_id", "status", "customer_name", "description"];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn indexes() -> Vec<IndexSpec> {
        vec![IndexSpec::new(
            "orders_customer_id",
            vec![IndexKey::Asc(Fields::CUSTOMER_ID.to_owned())],
        )]
    }
}

impl Owned for Order {
    const OWNERS: &'static [OwnerKind] = &[OwnerKind::Customer, OwnerKind::Associate];
}

#[derive(Clone, Debug, Default)]
pub struct OrderFilter {
    pub page: ListQuery,
    pub customer_id: Option<ObjectId>,
    pub associate_id: Option<ObjectId>,
    pub is_ongoing: Tristate,
    pub assignment_date_gte: Option<DateTime<Utc>>,
    pub assignment_date_lte: Option<DateTime<Utc>>,
    pub start_date_gte: Option<DateTime<Utc>>,
    pub start_date_lte: Option<DateTime<Utc>>,
    pub in_tag_ids: Vec<ObjectId>,
    pub in_skill_set_ids: Vec<ObjectId>,
    pub all_skill_set_ids: Vec<ObjectId>,
    pub search_text: String,
}

impl ListFilter for OrderFilter {
    fn to_query(&self) -> ListQuery {
        self.page.clone().terms(
            Terms::new()
                .eq_id(Fields::CUSTOMER_ID, self.customer_id)
                .eq_id(Fields::ASSOCIATE_ID, self.associate_id)
                .flag("is_ongoing", self.is_ongoing)
                .between(
                    "assignment_date",
                    self.assignment_date_gte,
                    self.assignment_date_lte,
                )
                .between("start_date", self.start_date_gte, self.start_date_lte)
                .any_of(Fields::TAG_IDS, &self.in_tag_ids)
                .any_of(Fields::SKILL_SET_IDS, &self.in_skill_set_ids)
                .all_of(Fields::SKILL_SET_IDS, &self.all_skill_set_ids)
                .text(&self.search_text),
        )
    }
}

use bizstore_db::{LiteView, Record, RecordMeta};
use bizstore_query::{ListFilter, ListQuery, ObjectId, Terms, Tristate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fields::Fields;
use super::{SkillSetRef, TagRef, lexical_name};

sort_fields! {
    pub enum AssociateSort {
        LexicalName => (Fields::LEXICAL_NAME, Text),
        JoinDate => (Fields::JOIN_DATE, Timestamp),
        CreatedAt => (Fields::CREATED_AT, Timestamp),
    }
}

/// A contractor who fulfils orders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Associate {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub first_name: String,
    pub last_name: String,
    pub lexical_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub is_ok_to_email: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub join_date: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<TagRef>,
    #[serde(default)]
    pub skill_sets: Vec<SkillSetRef>,
}

impl Associate {
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
            is_ok_to_email: false,
            tags: Vec::new(),
            skill_sets: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AssociateLite {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub public_id: u64,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub lexical_name: String,
    #[serde(default)]
    pub email: String,
}

impl LiteView for AssociateLite {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn label(&self) -> String {
        self.lexical_name.clone()
    }
}

impl Record for Associate {
    type Sort = AssociateSort;
    type Lite = AssociateLite;

    const ENTITY: &'static str = "associate";
    const TEXT_FIELDS: &'static [&'static str] = &[
        Fields::FIRST_NAME,
        Fields::LAST_NAME,
        Fields::EMAIL,
        "phone",
        "tags.text",
        "skill_sets.sub_category",
    ];
    const LITE_FIELDS: &'static [&'static str] =
        &["public_id", "status", Fields::LEXICAL_NAME, Fields::EMAIL];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

#[derive(Clone, Debug, Default)]
pub struct AssociateFilter {
    pub page: ListQuery,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub is_ok_to_email: Tristate,
    pub join_date_gte: Option<DateTime<Utc>>,
    pub join_date_lte: Option<DateTime<Utc>>,
    pub in_tag_ids: Vec<ObjectId>,
    pub all_tag_ids: Vec<ObjectId>,
    pub in_skill_set_ids: Vec<ObjectId>,
    /// Associates must carry every one of these skill sets.
    pub all_skill_set_ids: Vec<ObjectId>,
    pub search_text: String,
}

impl ListFilter for AssociateFilter {
    fn to_query(&self) -> ListQuery {
        self.page.clone().terms(
            Terms::new()
                .substring(Fields::FIRST_NAME, &self.first_name)
                .substring(Fields::LAST_NAME, &self.last_name)
                .substring(Fields::EMAIL, &self.email)
                .eq_str("phone", &self.phone)
                .flag("is_ok_to_email", self.is_ok_to_email)
                .between(Fields::JOIN_DATE, self.join_date_gte, self.join_date_lte)
                .any_of(Fields::TAG_IDS, &self.in_tag_ids)
                .all_of(Fields::TAG_IDS, &self.all_tag_ids)
                .any_of(Fields::SKILL_SET_IDS, &self.in_skill_set_ids)
                .all_of(Fields::SKILL_SET_IDS, &self.all_skill_set_ids)
                .text(&self.search_text),
        )
    }
}

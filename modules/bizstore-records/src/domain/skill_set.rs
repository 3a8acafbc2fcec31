use bizstore_db::{LiteView, Record, RecordMeta};
use bizstore_query::{ListFilter, ListQuery, ObjectId, Terms};
use serde::{Deserialize, Serialize};

use super::SkillSetRef;
use super::fields::Fields;

sort_fields! {
    pub enum SkillSetSort {
        Category => ("category", Text),
        SubCategory => ("sub_category", Text),
        CreatedAt => (Fields::CREATED_AT, Timestamp),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillSet {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub category: String,
    pub sub_category: String,
    #[serde(default)]
    pub description: String,
}

impl SkillSet {
    #[must_use]
    pub fn new(tenant_id: ObjectId, category: &str, sub_category: &str) -> Self {
        Self {
            meta: RecordMeta::new(Some(tenant_id)),
            category: category.to_owned(),
            sub_category: sub_category.to_owned(),
            description: String::new(),
        }
    }

    #[must_use]
    pub fn to_ref(&self) -> SkillSetRef {
        SkillSetRef {
            id: self.meta.id,
            sub_category: self.sub_category.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SkillSetLite {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
}

impl LiteView for SkillSetLite {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn label(&self) -> String {
        format!("{} / {}", self.category, self.sub_category)
    }
}

impl Record for SkillSet {
    type Sort = SkillSetSort;
    type Lite = SkillSetLite;

    const ENTITY: &'static str = "skill_set";
    const TEXT_FIELDS: &'static [&'static str] = &["category", "sub_category", "description"];
    const LITE_FIELDS: &'static [&'static str] = &["status", "category", "sub_category"];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }
}

#[derive(Clone, Debug, Default)]
pub struct SkillSetFilter {
    pub page: ListQuery,
    pub category: String,
    pub sub_category: String,
    pub search_text: String,
}

impl ListFilter for SkillSetFilter {
    fn to_query(&self) -> ListQuery {
        self.page.clone().terms(
            Terms::new()
                .eq_str("category", &self.category)
                .substring("sub_category", &self.sub_category)
                .text(&self.search_text),
        )
    }
}

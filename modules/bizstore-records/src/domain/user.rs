use async_trait::async_trait;
use bizstore_db::{Collection, IndexKey, IndexSpec, LiteView, OpCtx, Record, RecordMeta};
use bizstore_query::{
    ListFilter, ListQuery, ObjectId, Predicate, Result, TENANT_FIELD, Terms,
};
use serde::{Deserialize, Serialize};

use super::fields::Fields;
use super::lexical_name;

/// Role codes.
pub mod role {
    pub const ROOT: i32 = 1;
    pub const ADMIN: i32 = 2;
    pub const STAFF: i32 = 3;
    pub const ASSOCIATE: i32 = 4;
    pub const CUSTOMER: i32 = 5;
}

sort_fields! {
    pub enum UserSort {
        LexicalName => (Fields::LEXICAL_NAME, Text),
        Email => (Fields::EMAIL, Text),
        CreatedAt => (Fields::CREATED_AT, Timestamp),
    }
}

/// A login account. Email addresses are unique within a tenant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub first_name: String,
    pub last_name: String,
    pub lexical_name: String,
    pub email: String,
    #[serde(default)]
    pub role: i32,
    #[serde(default)]
    pub was_email_verified: bool,
}

impl User {
    #[must_use]
    pub fn new(tenant_id: ObjectId, first_name: &str, last_name: &str, email: &str) -> Self {
        Self {
            meta: RecordMeta::new(Some(tenant_id)),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            lexical_name: lexical_name(first_name, last_name),
            email: email.to_lowercase(),
            role: role::CUSTOMER,
            was_email_verified: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserLite {
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
    #[serde(default)]
    pub role: i32,
}

impl LiteView for UserLite {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn label(&self) -> String {
        format!("{} <{}>", self.lexical_name, self.email)
    }
}

impl Record for User {
    type Sort = UserSort;
    type Lite = UserLite;

    const ENTITY: &'static str = "user";
    const TEXT_FIELDS: &'static [&'static str] =
        &[Fields::FIRST_NAME, Fields::LAST_NAME, Fields::EMAIL];
    const LITE_FIELDS: &'static [&'static str] =
        &["public_id", "status", Fields::LEXICAL_NAME, Fields::EMAIL, "role"];

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut RecordMeta {
        &mut self.meta
    }

    fn indexes() -> Vec<IndexSpec> {
        vec![
            IndexSpec::new(
                "users_tenant_email",
                vec![
                    IndexKey::Asc(TENANT_FIELD.to_owned()),
                    IndexKey::Asc(Fields::EMAIL.to_owned()),
                ],
            )
            .unique(),
        ]
    }
}

#[derive(Clone, Debug, Default)]
pub struct UserFilter {
    pub page: ListQuery,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Option<i32>,
    pub search_text: String,
}

impl ListFilter for UserFilter {
    fn to_query(&self) -> ListQuery {
        self.page.clone().terms(
            Terms::new()
                .substring(Fields::FIRST_NAME, &self.first_name)
                .substring(Fields::LAST_NAME, &self.last_name)
                .substring(Fields::EMAIL, &self.email)
                .eq("role", self.role)
                .text(&self.search_text),
        )
    }
}

#[async_trait]
pub trait UsersExt {
    /// Exact, case-insensitive lookup of a user by email within `tenant`.
    ///
    /// # Errors
    /// `Error::Store`, `Timeout` or `Cancelled`. No match is `Ok(None)`.
    async fn get_by_email(&self, ctx: &OpCtx, tenant: ObjectId, email: &str)
    -> Result<Option<User>>;
}

#[async_trait]
impl UsersExt for Collection<User> {
    async fn get_by_email(
        &self,
        ctx: &OpCtx,
        tenant: ObjectId,
        email: &str,
    ) -> Result<Option<User>> {
        let predicate = Predicate::eq(TENANT_FIELD, tenant)
            .and(Predicate::eq(Fields::EMAIL, email.to_lowercase()));
        ctx.run("get_by_email", self.find_one(predicate)).await
    }
}

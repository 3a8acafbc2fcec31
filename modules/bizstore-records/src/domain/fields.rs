/// Document field names shared across entities.
pub struct Fields;

impl Fields {
    pub const CREATED_AT: &'static str = "created_at";
    pub const LEXICAL_NAME: &'static str = "lexical_name";
    pub const FIRST_NAME: &'static str = "first_name";
    pub const LAST_NAME: &'static str = "last_name";
    pub const EMAIL: &'static str = "email";
    pub const NAME: &'static str = "name";
    pub const JOIN_DATE: &'static str = "join_date";

    pub const CUSTOMER_ID: &'static str = "customer_id";
    pub const ASSOCIATE_ID: &'static str = "associate_id";
    pub const STAFF_ID: &'static str = "staff_id";
    pub const ORDER_ID: &'static str = "order_id";

    pub const TAG_IDS: &'static str = "tags.id";
    pub const SKILL_SET_IDS: &'static str = "skill_sets.id";
}

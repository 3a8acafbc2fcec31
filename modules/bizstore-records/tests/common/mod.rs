#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(dead_code)]

use std::sync::Arc;

use bizstore_db::{DocumentStore, MemoryStore, OpCtx};
use bizstore_query::ObjectId;
use bizstore_records::domain::attachment::Attachment;
use bizstore_records::domain::customer::Customer;
use bizstore_records::domain::order::Order;
use bizstore_records::{Records, RecordsConfig};
use chrono::{DateTime, Utc};

pub async fn records() -> Records {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    Records::open(&store, &RecordsConfig::default())
        .await
        .unwrap()
}

pub fn day(n: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(n * 86_400_000).unwrap()
}

pub fn tenant() -> ObjectId {
    ObjectId::new()
}

pub async fn customer(r: &Records, tenant: ObjectId, first: &str, last: &str) -> Customer {
    r.customers
        .create(&OpCtx::new(), Customer::new(tenant, first, last))
        .await
        .unwrap()
}

pub async fn order(r: &Records, c: &Customer, description: &str, assigned: DateTime<Utc>) -> Order {
    let tenant = c.meta.tenant_id.unwrap();
    let mut o = Order::new(tenant, c.meta.id, description);
    o.customer_name.clone_from(&c.lexical_name);
    o.assignment_date = assigned;
    r.orders.create(&OpCtx::new(), o).await.unwrap()
}

pub async fn attachment_for_customer(r: &Records, c: &Customer, title: &str) -> Attachment {
    let mut a = Attachment::new(c.meta.tenant_id.unwrap(), title, &format!("{title}.pdf"));
    a.customer_id = Some(c.meta.id);
    r.attachments.create(&OpCtx::new(), a).await.unwrap()
}

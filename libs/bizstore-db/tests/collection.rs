#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use bizstore_db::{
    Collection, DocumentStore, IndexKey, IndexSpec, LatestPublicId, MemoryStore, OpCtx,
    PublicIdAllocator, SerialPublicIds,
};
use bizstore_query::{Error, ObjectId};
use common::{Contact, contact, contacts, day, memory_contacts};
use serde_json::json;

#[tokio::test]
async fn public_ids_count_up_per_tenant() {
    let coll = memory_contacts().await;
    let ctx = OpCtx::new();
    let (t1, t2) = (ObjectId::new(), ObjectId::new());

    let mut got = Vec::new();
    for name in ["a", "b", "c"] {
        got.push(coll.create(&ctx, contact(t1, name, day(1))).await.unwrap().meta.public_id);
    }
    assert_eq!(got, vec![1, 2, 3]);

    let other = coll.create(&ctx, contact(t2, "z", day(1))).await.unwrap();
    assert_eq!(other.meta.public_id, 1);
}

#[tokio::test]
async fn explicit_public_id_is_kept_and_collisions_fail() {
    let coll = memory_contacts().await;
    let ctx = OpCtx::new();
    let tenant = ObjectId::new();
    let mut c = contact(tenant, "kept", day(1));
    c.meta.public_id = 40;
    assert_eq!(coll.create(&ctx, c).await.unwrap().meta.public_id, 40);

    let next = coll.create(&ctx, contact(tenant, "next", day(1))).await.unwrap();
    assert_eq!(next.meta.public_id, 41);

    let mut clash = contact(tenant, "clash", day(1));
    clash.meta.public_id = 41;
    assert!(matches!(coll.create(&ctx, clash).await, Err(Error::Store(_))));
}

#[tokio::test]
async fn getters_return_none_when_missing() {
    let coll = memory_contacts().await;
    let ctx = OpCtx::new();
    let tenant = ObjectId::new();
    let created = coll.create(&ctx, contact(tenant, "Ada", day(3))).await.unwrap();

    let by_id = coll.get_by_id(&ctx, created.meta.id).await.unwrap().unwrap();
    assert_eq!(by_id.lexical_name, "Ada");
    assert_eq!(by_id.join_date, day(3));

    let by_public = coll
        .get_by_public_id(&ctx, Some(tenant), created.meta.public_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_public.meta.id, created.meta.id);

    assert!(coll.get_by_id(&ctx, ObjectId::new()).await.unwrap().is_none());
    assert!(coll
        .get_by_public_id(&ctx, Some(ObjectId::new()), created.meta.public_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn upsert_update_and_delete_by_id() {
    let coll = memory_contacts().await;
    let ctx = OpCtx::new();
    let tenant = ObjectId::new();

    let mut fresh = contact(tenant, "Up", day(1));
    fresh.meta.id = ObjectId::new();
    fresh.meta.public_id = 7;
    let id = fresh.meta.id;
    coll.upsert_by_id(&ctx, fresh).await.unwrap();
    let mut stored = coll.get_by_id(&ctx, id).await.unwrap().unwrap();
    assert_eq!(stored.meta.public_id, 7);

    stored.lexical_name = "Upserted".to_owned();
    coll.upsert_by_id(&ctx, stored).await.unwrap();
    assert_eq!(
        coll.get_by_id(&ctx, id).await.unwrap().unwrap().lexical_name,
        "Upserted"
    );

    let mut unnumbered = coll.get_by_id(&ctx, id).await.unwrap().unwrap();
    unnumbered.meta.public_id = 0;
    assert_eq!(coll.upsert_by_id(&ctx, unnumbered).await.unwrap().meta.public_id, 7);

    let fields = json!({"email": "changed@example.com"});
    let matched = coll
        .update_by_id(&ctx, id, fields.as_object().cloned().unwrap())
        .await
        .unwrap();
    assert!(matched);
    assert_eq!(
        coll.get_by_id(&ctx, id).await.unwrap().unwrap().email,
        "changed@example.com"
    );

    assert!(coll.delete_by_id(&ctx, id).await.unwrap());
    assert!(!coll.delete_by_id(&ctx, id).await.unwrap());
    assert!(coll.get_by_id(&ctx, id).await.unwrap().is_none());

    let no_id = contact(tenant, "NoId", day(1));
    assert!(matches!(
        coll.upsert_by_id(&ctx, no_id).await,
        Err(Error::InvalidFilter(_))
    ));
}

#[tokio::test]
async fn delete_by_reference_is_idempotent() {
    let coll = memory_contacts().await;
    let ctx = OpCtx::new();
    let tenant = ObjectId::new();
    let owner = ObjectId::new();
    for name in ["x", "y", "z"] {
        let mut c = contact(tenant, name, day(1));
        c.owner_id = Some(owner);
        coll.create(&ctx, c).await.unwrap();
    }
    coll.create(&ctx, contact(tenant, "unrelated", day(1)))
        .await
        .unwrap();

    let owned = coll.list_by_reference(&ctx, "owner_id", owner).await.unwrap();
    assert_eq!(owned.items.len(), 3);

    assert_eq!(coll.delete_by_reference(&ctx, "owner_id", owner).await.unwrap(), 3);
    assert!(coll
        .list_by_reference(&ctx, "owner_id", owner)
        .await
        .unwrap()
        .items
        .is_empty());
    assert_eq!(coll.delete_by_reference(&ctx, "owner_id", owner).await.unwrap(), 0);
    assert_eq!(
        coll.delete_by_reference(&ctx, "owner_id", ObjectId::new())
            .await
            .unwrap(),
        0
    );
    assert_eq!(coll.count(&ctx, &bizstore_query::ListQuery::new(1)).await.unwrap(), 1);
}

#[tokio::test]
async fn slow_store_hits_the_deadline() {
    let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(100)));
    let coll = contacts(store).await;
    let ctx = OpCtx::new().with_timeout(Duration::from_millis(10));

    let res = coll
        .create(&ctx, contact(ObjectId::new(), "late", day(1)))
        .await;
    assert_eq!(res.unwrap_err(), Error::Timeout);

    let res = coll.list(&ctx, &bizstore_query::ListQuery::new(5)).await;
    assert!(matches!(res, Err(Error::Timeout)));
}

#[tokio::test]
async fn cancelled_context_stops_the_call() {
    let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(200)));
    let coll = contacts(store).await;
    let ctx = OpCtx::new();

    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });
    let res = coll.count(&ctx, &bizstore_query::ListQuery::new(1)).await;
    assert!(matches!(res, Err(Error::Cancelled)));
}

#[tokio::test]
async fn serial_allocator_serializes_concurrent_creates() {
    let store = Arc::new(MemoryStore::new());
    let coll: Collection<Contact> =
        Collection::open(store, "contacts", Arc::new(SerialPublicIds::new()))
            .await
            .unwrap();
    let tenant = ObjectId::new();

    let mut tasks = Vec::new();
    for n in 0..10 {
        let coll = coll.clone();
        tasks.push(tokio::spawn(async move {
            coll.create(&OpCtx::new(), contact(tenant, &format!("c{n}"), day(1)))
                .await
                .unwrap()
                .meta
                .public_id
        }));
    }
    let mut ids = Vec::new();
    for t in tasks {
        ids.push(t.await.unwrap());
    }
    ids.sort_unstable();
    assert_eq!(ids, (1..=10).collect::<Vec<u64>>());
}

#[tokio::test]
async fn upsert_allocates_public_ids_for_new_records() {
    let coll = memory_contacts().await;
    let ctx = OpCtx::new();
    let tenant = ObjectId::new();

    let mut got = Vec::new();
    for name in ["first", "second"] {
        let mut c = contact(tenant, name, day(1));
        c.meta.id = ObjectId::new();
        got.push(coll.upsert_by_id(&ctx, c).await.unwrap().meta.public_id);
    }
    assert_eq!(got, vec![1, 2]);
    assert_eq!(coll.count(&ctx, &bizstore_query::ListQuery::new(1)).await.unwrap(), 2);
}

#[tokio::test]
async fn serial_allocator_steps_over_explicit_ids() {
    let store = Arc::new(MemoryStore::new());
    let coll: Collection<Contact> =
        Collection::open(store, "contacts", Arc::new(SerialPublicIds::new()))
            .await
            .unwrap();
    let ctx = OpCtx::new();
    let tenant = ObjectId::new();

    let first = coll.create(&ctx, contact(tenant, "first", day(1))).await.unwrap();
    assert_eq!(first.meta.public_id, 1);
    for public_id in 2..=5 {
        let mut c = contact(tenant, &format!("explicit{public_id}"), day(1));
        c.meta.public_id = public_id;
        coll.create(&ctx, c).await.unwrap();
    }

    let mut got = Vec::new();
    for name in ["after", "later"] {
        got.push(coll.create(&ctx, contact(tenant, name, day(1))).await.unwrap().meta.public_id);
    }
    assert_eq!(got, vec![6, 7]);
}

async fn unique_email_keeps_the_sequence(ids: Arc<dyn PublicIdAllocator>) {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    store
        .create_index(
            "contacts",
            IndexSpec::new("contacts_email", vec![IndexKey::Asc("email".to_owned())]).unique(),
        )
        .await
        .unwrap();
    let coll: Collection<Contact> = Collection::open(store, "contacts", ids).await.unwrap();
    let ctx = OpCtx::new();
    let tenant = ObjectId::new();

    let ada = coll.create(&ctx, contact(tenant, "Ada", day(1))).await.unwrap();
    assert_eq!(ada.meta.public_id, 1);

    let err = coll
        .create(&ctx, contact(tenant, "Ada", day(2)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Store(ref msg) if msg.contains("contacts_email")));

    let bo = coll.create(&ctx, contact(tenant, "Bo", day(1))).await.unwrap();
    assert_eq!(bo.meta.public_id, 2);
    assert_eq!(coll.count(&ctx, &bizstore_query::ListQuery::new(1)).await.unwrap(), 2);
}

#[tokio::test]
async fn other_unique_violations_fail_without_consuming_ids() {
    unique_email_keeps_the_sequence(Arc::new(LatestPublicId)).await;
    unique_email_keeps_the_sequence(Arc::new(SerialPublicIds::new())).await;
}

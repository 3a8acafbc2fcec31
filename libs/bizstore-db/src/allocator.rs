//! Public-id allocation.
//!
//! A public id is a per-tenant, per-entity counter starting at 1. Two
//! policies share the [`PublicIdAllocator`] interface:
//!
//! - [`LatestPublicId`] reads the current highest id and adds one. Concurrent
//!   creators for the same tenant may observe the same maximum.
//! - [`SerialPublicIds`] serializes allocation per `(collection, tenant)` and
//!   caches the last id handed out, so ids never collide within one process.
//!   The cache is dropped whenever an allocated id fails to land, which also
//!   picks up ids written explicitly or by another process.

use std::sync::Arc;

use async_trait::async_trait;
use bizstore_query::{ObjectId, PUBLIC_ID_FIELD, Predicate, SortDir, TENANT_FIELD};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::store::{DocumentStore, FindOptions, SortSpec, StoreError};

#[async_trait]
pub trait PublicIdAllocator: Send + Sync {
    /// Next public id for `tenant` in `collection`. `None` scans the whole
    /// collection.
    async fn next(
        &self,
        store: &dyn DocumentStore,
        collection: &str,
        tenant: Option<ObjectId>,
    ) -> Result<u64, StoreError>;

    /// Called when an id handed out by [`PublicIdAllocator::next`] was not
    /// stored. Allocators that cache must re-read the store afterwards.
    async fn release(&self, _collection: &str, _tenant: Option<ObjectId>) {}
}

/// Highest stored public id for `tenant`, or 0.
async fn latest(
    store: &dyn DocumentStore,
    collection: &str,
    tenant: Option<ObjectId>,
) -> Result<u64, StoreError> {
    let predicate = tenant
        .filter(|t| !t.is_nil())
        .map_or_else(Predicate::always, |t| Predicate::eq(TENANT_FIELD, t));
    let opts = FindOptions::default()
        .sorted(SortSpec::Keys(vec![(PUBLIC_ID_FIELD.to_owned(), SortDir::Desc)]))
        .limit(1)
        .project([PUBLIC_ID_FIELD]);
    let rows = store.find(collection, &predicate, &opts).await?;
    Ok(rows
        .first()
        .and_then(|doc| doc.get(PUBLIC_ID_FIELD))
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0))
}

/// Best-effort allocator: `max(public_id) + 1`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LatestPublicId;

#[async_trait]
impl PublicIdAllocator for LatestPublicId {
    async fn next(
        &self,
        store: &dyn DocumentStore,
        collection: &str,
        tenant: Option<ObjectId>,
    ) -> Result<u64, StoreError> {
        Ok(latest(store, collection, tenant).await?.saturating_add(1))
    }
}

/// Strictly serial allocator for a single process.
#[derive(Default)]
pub struct SerialPublicIds {
    slots: DashMap<(String, Option<ObjectId>), Arc<Mutex<Option<u64>>>>,
}

impl SerialPublicIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PublicIdAllocator for SerialPublicIds {
    async fn next(
        &self,
        store: &dyn DocumentStore,
        collection: &str,
        tenant: Option<ObjectId>,
    ) -> Result<u64, StoreError> {
        let tenant = tenant.filter(|t| !t.is_nil());
        let slot = self
            .slots
            .entry((collection.to_owned(), tenant))
            .or_default()
            .clone();

        let mut last = slot.lock().await;
        let current = match *last {
            Some(n) => n,
            None => latest(store, collection, tenant).await?,
        };
        let next = current.saturating_add(1);
        *last = Some(next);
        Ok(next)
    }

    async fn release(&self, collection: &str, tenant: Option<ObjectId>) {
        let tenant = tenant.filter(|t| !t.is_nil());
        let slot = self
            .slots
            .get(&(collection.to_owned(), tenant))
            .map(|slot| Arc::clone(slot.value()));
        if let Some(slot) = slot {
            *slot.lock().await = None;
        }
    }
}

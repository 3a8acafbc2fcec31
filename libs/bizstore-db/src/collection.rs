//! Generic per-entity collection with the full call surface.

use std::marker::PhantomData;
use std::sync::Arc;

use bizstore_query::{
    Error, ID_FIELD, ListFilter, ListQuery, ObjectId, PUBLIC_ID_FIELD, Page, Predicate, Result,
    SWEEP_PAGE_SIZE, STATUS_FIELD, SelectOption, TENANT_FIELD, Terms, build_count,
};
use chrono::Utc;
use tracing::instrument;

use crate::allocator::PublicIdAllocator;
use crate::ctx::OpCtx;
use crate::pager::{Pager, decode};
use crate::record::{LiteView, Record};
use crate::store::{Document, DocumentStore, FindOptions, IndexKey, IndexSpec, StoreError};

/// Attempts at inserting a record whose public id lost a race.
const PUBLIC_ID_ATTEMPTS: usize = 3;

/// Handle to the collection holding records of type `R`.
///
/// Cheap to clone; every clone shares the store and allocator.
pub struct Collection<R: Record> {
    store: Arc<dyn DocumentStore>,
    name: Arc<str>,
    ids: Arc<dyn PublicIdAllocator>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Clone for Collection<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            name: Arc::clone(&self.name),
            ids: Arc::clone(&self.ids),
            _record: PhantomData,
        }
    }
}

impl<R: Record> std::fmt::Debug for Collection<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("entity", &R::ENTITY)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn to_document<R: Record>(record: &R) -> Result<Document> {
    match serde_json::to_value(record) {
        Ok(serde_json::Value::Object(doc)) => Ok(doc),
        Ok(_) => Err(Error::Store(format!("{} is not a document", R::ENTITY))),
        Err(e) => Err(Error::Store(format!("cannot encode {}: {e}", R::ENTITY))),
    }
}

/// Name of the unique `(tenant_id, public_id)` index of collection `name`.
fn public_id_index(name: &str) -> String {
    format!("{name}_tenant_public_id")
}

impl<R: Record> Collection<R> {
    /// Open the collection and make sure its indexes exist:
    ///
    /// - `(tenant_id, public_id desc)`, unique
    /// - text index over `R::TEXT_FIELDS`, when there are any
    /// - `status`
    /// - whatever `R::indexes()` adds
    ///
    /// # Errors
    /// `Error::Store` if an index cannot be created. Callers treat this as
    /// fatal.
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        name: &str,
        ids: Arc<dyn PublicIdAllocator>,
    ) -> Result<Self> {
        let mut indexes = vec![
            IndexSpec::new(
                &public_id_index(name),
                vec![
                    IndexKey::Asc(TENANT_FIELD.to_owned()),
                    IndexKey::Desc(PUBLIC_ID_FIELD.to_owned()),
                ],
            )
            .unique(),
            IndexSpec::new(
                &format!("{name}_status"),
                vec![IndexKey::Asc(STATUS_FIELD.to_owned())],
            ),
        ];
        if !R::TEXT_FIELDS.is_empty() {
            indexes.push(IndexSpec::text(&format!("{name}_text"), R::TEXT_FIELDS));
        }
        indexes.extend(R::indexes());

        for index in indexes {
            let index_name = index.name.clone();
            store.create_index(name, index).await.map_err(|e| {
                tracing::error!(collection = name, index = %index_name, error = %e, "index creation failed");
                Error::from(e)
            })?;
        }
        tracing::info!(collection = name, entity = R::ENTITY, "collection ready");

        Ok(Self {
            store,
            name: Arc::from(name),
            ids,
            _record: PhantomData,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn failed(&self, op: &'static str) -> impl Fn(StoreError) -> Error + '_ {
        move |e| {
            tracing::error!(collection = %self.name, op, error = %e, "store operation failed");
            Error::from(e)
        }
    }

    fn public_id_scope(record: &R) -> Option<ObjectId> {
        if R::TENANT_SCOPED {
            record.meta().tenant_id
        } else {
            None
        }
    }

    async fn allocate_public_id(&self, tenant: Option<ObjectId>) -> Result<u64> {
        self.ids
            .next(self.store.as_ref(), &self.name, tenant)
            .await
            .map_err(self.failed("allocate_public_id"))
    }

    /// Insert `record`, assigning a primary id and public id when they are
    /// unset. Returns the stored record.
    ///
    /// An allocated public id that collides on the public-id index is
    /// allocated again, a bounded number of times. Any other unique index
    /// violation fails at once.
    ///
    /// # Errors
    /// `Error::Store` on a duplicate key or store failure, plus the context
    /// errors `Timeout` and `Cancelled`.
    #[instrument(skip_all, fields(collection = %self.name))]
    pub async fn create(&self, ctx: &OpCtx, mut record: R) -> Result<R> {
        ctx.run("create", async move {
            let now = Utc::now();
            let meta = record.meta_mut();
            if meta.id.is_nil() {
                meta.id = ObjectId::new();
            }
            meta.modified_at = now;
            let allocate = meta.public_id == 0;
            let tenant = Self::public_id_scope(&record);
            let race_index = public_id_index(&self.name);

            let mut attempt = 0;
            loop {
                attempt += 1;
                if allocate {
                    record.meta_mut().public_id = self.allocate_public_id(tenant).await?;
                }
                let doc = to_document(&record)?;
                let err = match self.store.insert_one(&self.name, doc).await {
                    Ok(()) => break,
                    Err(e) => e,
                };
                if !allocate {
                    return Err(self.failed("create")(err));
                }
                self.ids.release(&self.name, tenant).await;
                let lost_race =
                    matches!(&err, StoreError::DuplicateKey { key, .. } if *key == race_index);
                if !lost_race || attempt >= PUBLIC_ID_ATTEMPTS {
                    return Err(self.failed("create")(err));
                }
                tracing::warn!(
                    collection = %self.name,
                    attempt,
                    "public id taken, allocating again"
                );
            }

            tracing::debug!(
                id = %record.meta().id,
                public_id = record.meta().public_id,
                "record created"
            );
            Ok(record)
        })
        .await
    }

    /// # Errors
    /// `Error::Store`, `Timeout` or `Cancelled`. A missing record is `Ok(None)`.
    #[instrument(skip_all, fields(collection = %self.name, %id))]
    pub async fn get_by_id(&self, ctx: &OpCtx, id: ObjectId) -> Result<Option<R>> {
        ctx.run("get_by_id", self.find_one(Predicate::eq(ID_FIELD, id)))
            .await
    }

    /// Lookup by public id within `tenant` (`None` for unscoped entities).
    ///
    /// # Errors
    /// `Error::Store`, `Timeout` or `Cancelled`. A missing record is `Ok(None)`.
    #[instrument(skip_all, fields(collection = %self.name, public_id))]
    pub async fn get_by_public_id(
        &self,
        ctx: &OpCtx,
        tenant: Option<ObjectId>,
        public_id: u64,
    ) -> Result<Option<R>> {
        let mut predicate = Predicate::eq(PUBLIC_ID_FIELD, public_id);
        if let Some(t) = tenant.filter(|t| !t.is_nil()) {
            predicate = predicate.and(Predicate::eq(TENANT_FIELD, t));
        }
        ctx.run("get_by_public_id", self.find_one(predicate)).await
    }

    /// First record matching `predicate`, if any.
    ///
    /// # Errors
    /// `Error::Store` on store or decode failure.
    pub async fn find_one(&self, predicate: Predicate) -> Result<Option<R>> {
        let rows = self
            .store
            .find(&self.name, &predicate, &FindOptions::default().limit(1))
            .await
            .map_err(self.failed("find_one"))?;
        rows.into_iter().next().map(decode::<R>).transpose()
    }

    /// Replace the stored record with the same primary id, inserting it when
    /// absent.
    ///
    /// A zero public id keeps the stored one, or is allocated when there is
    /// none. Unlike [`Collection::create`] a colliding public id is not
    /// retried.
    ///
    /// # Errors
    /// `InvalidFilter` when the record has no primary id, otherwise
    /// `Error::Store`, `Timeout` or `Cancelled`.
    #[instrument(skip_all, fields(collection = %self.name))]
    pub async fn upsert_by_id(&self, ctx: &OpCtx, mut record: R) -> Result<R> {
        ctx.run("upsert_by_id", async move {
            let id = record.meta().id;
            if id.is_nil() {
                return Err(Error::InvalidFilter(
                    "upsert needs a primary id".to_owned(),
                ));
            }
            let mut allocated = None;
            if record.meta().public_id == 0 {
                let stored = self
                    .find_one(Predicate::eq(ID_FIELD, id))
                    .await?
                    .map_or(0, |r| r.meta().public_id);
                record.meta_mut().public_id = if stored == 0 {
                    let tenant = Self::public_id_scope(&record);
                    allocated = Some(tenant);
                    self.allocate_public_id(tenant).await?
                } else {
                    stored
                };
            }
            record.meta_mut().modified_at = Utc::now();
            let doc = to_document(&record)?;
            if let Err(e) = self.store.replace_one(&self.name, id, doc, true).await {
                if let Some(tenant) = allocated {
                    self.ids.release(&self.name, tenant).await;
                }
                return Err(self.failed("upsert_by_id")(e));
            }
            Ok(record)
        })
        .await
    }

    /// Set top-level `fields` on the record with primary id `id`. The
    /// modification time is refreshed. Returns whether the record existed.
    ///
    /// # Errors
    /// `Error::Store`, `Timeout` or `Cancelled`.
    #[instrument(skip_all, fields(collection = %self.name, %id))]
    pub async fn update_by_id(&self, ctx: &OpCtx, id: ObjectId, mut fields: Document) -> Result<bool> {
        ctx.run("update_by_id", async move {
            fields.insert(
                "modified_at".to_owned(),
                serde_json::Value::from(Utc::now().timestamp_millis()),
            );
            self.store
                .update_one(&self.name, id, fields)
                .await
                .map_err(self.failed("update_by_id"))
        })
        .await
    }

    /// Returns whether a record was removed.
    ///
    /// # Errors
    /// `Error::Store`, `Timeout` or `Cancelled`.
    #[instrument(skip_all, fields(collection = %self.name, %id))]
    pub async fn delete_by_id(&self, ctx: &OpCtx, id: ObjectId) -> Result<bool> {
        ctx.run("delete_by_id", async {
            self.store
                .delete_one(&self.name, id)
                .await
                .map_err(self.failed("delete_by_id"))
        })
        .await
    }

    /// Number of records matching `filter`. Cursor and ordering are ignored.
    ///
    /// # Errors
    /// `InvalidFilter`, `Error::Store`, `Timeout` or `Cancelled`.
    #[instrument(skip_all, fields(collection = %self.name))]
    pub async fn count(&self, ctx: &OpCtx, filter: &dyn ListFilter) -> Result<u64> {
        let q = filter.to_query();
        ctx.run("count", async {
            let predicate = build_count(&q, R::ARCHIVED_STATUS)?;
            self.store
                .count(&self.name, &predicate)
                .await
                .map_err(self.failed("count"))
        })
        .await
    }

    fn pager(&self) -> Pager<'_, R::Sort> {
        Pager::<R::Sort>::new(self.store.as_ref(), &self.name).archived_status(R::ARCHIVED_STATUS)
    }

    /// One page of full records.
    ///
    /// # Errors
    /// Builder errors (`InvalidFilter`, `UnsupportedSort`, `CursorCorrupt`),
    /// `Error::Store`, `Timeout` or `Cancelled`.
    #[instrument(skip_all, fields(collection = %self.name))]
    pub async fn list(&self, ctx: &OpCtx, filter: &dyn ListFilter) -> Result<Page<R>> {
        let q = filter.to_query();
        ctx.run("list", self.pager().fetch(&q, decode::<R>)).await
    }

    /// One page of lite projections.
    ///
    /// # Errors
    /// As [`Collection::list`].
    #[instrument(skip_all, fields(collection = %self.name))]
    pub async fn list_lite(&self, ctx: &OpCtx, filter: &dyn ListFilter) -> Result<Page<R::Lite>> {
        let q = filter.to_query();
        ctx.run(
            "list_lite",
            self.pager()
                .project(R::LITE_FIELDS)
                .fetch(&q, decode::<R::Lite>),
        )
        .await
    }

    /// One page of `(id, label)` pairs built from the lite projection.
    ///
    /// # Errors
    /// As [`Collection::list`].
    pub async fn list_select_options(
        &self,
        ctx: &OpCtx,
        filter: &dyn ListFilter,
    ) -> Result<Page<SelectOption>> {
        let page = self.list_lite(ctx, filter).await?;
        Ok(page.map_items(|lite| SelectOption {
            value: lite.id(),
            label: lite.label(),
        }))
    }

    /// Every record whose `field` references `owner`, unordered.
    ///
    /// # Errors
    /// As [`Collection::list`].
    pub async fn list_by_reference(
        &self,
        ctx: &OpCtx,
        field: &str,
        owner: ObjectId,
    ) -> Result<Page<R>> {
        self.list(ctx, &Self::reference_query(field, owner)).await
    }

    /// Lite projections of every record whose `field` references `owner`.
    ///
    /// # Errors
    /// As [`Collection::list`].
    pub async fn list_lite_by_reference(
        &self,
        ctx: &OpCtx,
        field: &str,
        owner: ObjectId,
    ) -> Result<Page<R::Lite>> {
        self.list_lite(ctx, &Self::reference_query(field, owner))
            .await
    }

    fn reference_query(field: &str, owner: ObjectId) -> ListQuery {
        ListQuery::sweep(SWEEP_PAGE_SIZE).terms(Terms::new().eq(field, Some(owner)))
    }

    /// Delete every record whose `field` references `owner`, one by one.
    /// Returns how many were removed. Re-running after a partial failure
    /// finishes the job; an owner with no dependents is a no-op.
    ///
    /// # Errors
    /// As [`Collection::list`]. Records deleted before the failure stay
    /// deleted.
    #[instrument(skip_all, fields(collection = %self.name, field, %owner))]
    pub async fn delete_by_reference(
        &self,
        ctx: &OpCtx,
        field: &str,
        owner: ObjectId,
    ) -> Result<u64> {
        let dependents = self.list_lite_by_reference(ctx, field, owner).await?;
        let mut removed = 0u64;
        for lite in dependents.items {
            if self.delete_by_id(ctx, lite.id()).await? {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(removed, "cascade delete finished");
        }
        Ok(removed)
    }

    /// Ids of every record whose `field` references `owner`.
    ///
    /// # Errors
    /// As [`Collection::list`].
    pub async fn ids_by_reference(
        &self,
        ctx: &OpCtx,
        field: &str,
        owner: ObjectId,
    ) -> Result<Vec<ObjectId>> {
        let page = self.list_lite_by_reference(ctx, field, owner).await?;
        Ok(page.items.iter().map(LiteView::id).collect())
    }
}

//! Every entity collection opened against one store, plus owner cascades.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bizstore_db::{
    Collection, Document, DocumentStore, LatestPublicId, OpCtx, PublicIdAllocator, Record,
    SerialPublicIds, open_store,
};
use bizstore_query::{ObjectId, Result};
use tracing::instrument;

use crate::config::RecordsConfig;
use crate::domain::associate::Associate;
use crate::domain::attachment::Attachment;
use crate::domain::bulletin::Bulletin;
use crate::domain::comment::Comment;
use crate::domain::customer::Customer;
use crate::domain::fields::Fields;
use crate::domain::order::Order;
use crate::domain::owner::{Owner, OwnedExt};
use crate::domain::skill_set::SkillSet;
use crate::domain::staff::Staff;
use crate::domain::tag::Tag;
use crate::domain::task_item::TaskItem;
use crate::domain::tenant::Tenant;
use crate::domain::user::User;

async fn open_collection<R: Record>(
    store: &Arc<dyn DocumentStore>,
    name: &str,
    ids: &Arc<dyn PublicIdAllocator>,
) -> Result<Collection<R>> {
    Collection::open(Arc::clone(store), name, Arc::clone(ids)).await
}

/// What a cascade removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Removed {
    /// Whether the owner itself was still there to delete.
    pub owner: bool,
    pub orders: u64,
    /// Orders that lost their associate rather than being deleted.
    pub orders_unassigned: u64,
    pub task_items: u64,
    pub comments: u64,
    pub attachments: u64,
}

impl Removed {
    fn absorb(&mut self, other: Removed) {
        self.orders += u64::from(other.owner) + other.orders;
        self.orders_unassigned += other.orders_unassigned;
        self.task_items += other.task_items;
        self.comments += other.comments;
        self.attachments += other.attachments;
    }
}

#[derive(Clone, Debug)]
pub struct Records {
    timeout: Duration,
    pub tenants: Collection<Tenant>,
    pub users: Collection<User>,
    pub customers: Collection<Customer>,
    pub associates: Collection<Associate>,
    pub staff: Collection<Staff>,
    pub orders: Collection<Order>,
    pub task_items: Collection<TaskItem>,
    pub tags: Collection<Tag>,
    pub skill_sets: Collection<SkillSet>,
    pub attachments: Collection<Attachment>,
    pub comments: Collection<Comment>,
    pub bulletins: Collection<Bulletin>,
}

impl Records {
    /// Open the store named by `cfg` and every collection in it.
    ///
    /// # Errors
    /// Invalid configuration, an unsupported store scheme, or an index that
    /// cannot be created.
    pub async fn connect(cfg: &RecordsConfig) -> anyhow::Result<Self> {
        cfg.validate().context("invalid records configuration")?;
        let store = open_store(&cfg.store).context("failed to open document store")?;
        Self::open(&store, cfg)
            .await
            .context("failed to prepare collections")
    }

    /// Open every collection on `store`, creating indexes as needed.
    ///
    /// # Errors
    /// `Error::Store` if an index cannot be created.
    pub async fn open(store: &Arc<dyn DocumentStore>, cfg: &RecordsConfig) -> Result<Self> {
        let ids: Arc<dyn PublicIdAllocator> = if cfg.serial_public_ids {
            Arc::new(SerialPublicIds::new())
        } else {
            Arc::new(LatestPublicId)
        };
        let names = &cfg.collections;
        Ok(Self {
            timeout: cfg.store.operation_timeout,
            tenants: open_collection(store, &names.tenants, &ids).await?,
            users: open_collection(store, &names.users, &ids).await?,
            customers: open_collection(store, &names.customers, &ids).await?,
            associates: open_collection(store, &names.associates, &ids).await?,
            staff: open_collection(store, &names.staff, &ids).await?,
            orders: open_collection(store, &names.orders, &ids).await?,
            task_items: open_collection(store, &names.task_items, &ids).await?,
            tags: open_collection(store, &names.tags, &ids).await?,
            skill_sets: open_collection(store, &names.skill_sets, &ids).await?,
            attachments: open_collection(store, &names.attachments, &ids).await?,
            comments: open_collection(store, &names.comments, &ids).await?,
            bulletins: open_collection(store, &names.bulletins, &ids).await?,
        })
    }

    /// A fresh context carrying the configured operation timeout.
    #[must_use]
    pub fn ctx(&self) -> OpCtx {
        OpCtx::new().with_timeout(self.timeout)
    }

    /// Delete an order with its task items, comments and attachments.
    ///
    /// # Errors
    /// The first failing step's error. Re-running finishes the job.
    #[instrument(skip_all, fields(%order_id))]
    pub async fn delete_order(&self, ctx: &OpCtx, order_id: ObjectId) -> Result<Removed> {
        let owner = Owner::Order(order_id);
        let mut removed = self.delete_dependents(ctx, owner).await?;
        removed.owner = self.orders.delete_by_id(ctx, order_id).await?;
        tracing::info!(?removed, "order cascade finished");
        Ok(removed)
    }

    /// Delete a customer, all of their orders (each with its own
    /// dependents) and everything else that references them.
    ///
    /// # Errors
    /// The first failing step's error. Re-running finishes the job.
    #[instrument(skip_all, fields(%customer_id))]
    pub async fn delete_customer(&self, ctx: &OpCtx, customer_id: ObjectId) -> Result<Removed> {
        let owner = Owner::Customer(customer_id);
        let mut removed = Removed::default();
        for order_id in self.orders.ids_by_owner(ctx, owner).await? {
            removed.absorb(self.delete_order(ctx, order_id).await?);
        }
        let direct = self.delete_dependents(ctx, owner).await?;
        removed.absorb(direct);
        removed.owner = self.customers.delete_by_id(ctx, customer_id).await?;
        tracing::info!(?removed, "customer cascade finished");
        Ok(removed)
    }

    /// Delete an associate and their dependents. Orders assigned to them
    /// survive, unassigned.
    ///
    /// # Errors
    /// The first failing step's error. Re-running finishes the job.
    #[instrument(skip_all, fields(%associate_id))]
    pub async fn delete_associate(&self, ctx: &OpCtx, associate_id: ObjectId) -> Result<Removed> {
        let owner = Owner::Associate(associate_id);
        let mut removed = self.delete_dependents(ctx, owner).await?;
        let mut unassign = Document::new();
        unassign.insert(Fields::ASSOCIATE_ID.to_owned(), serde_json::Value::Null);
        unassign.insert("associate_name".to_owned(), serde_json::Value::from(""));
        for order_id in self.orders.ids_by_owner(ctx, owner).await? {
            if self.orders.update_by_id(ctx, order_id, unassign.clone()).await? {
                removed.orders_unassigned += 1;
            }
        }
        removed.owner = self.associates.delete_by_id(ctx, associate_id).await?;
        tracing::info!(?removed, "associate cascade finished");
        Ok(removed)
    }

    /// Delete a staff member and their dependents.
    ///
    /// # Errors
    /// The first failing step's error. Re-running finishes the job.
    #[instrument(skip_all, fields(%staff_id))]
    pub async fn delete_staff(&self, ctx: &OpCtx, staff_id: ObjectId) -> Result<Removed> {
        let mut removed = self.delete_dependents(ctx, Owner::Staff(staff_id)).await?;
        removed.owner = self.staff.delete_by_id(ctx, staff_id).await?;
        tracing::info!(?removed, "staff cascade finished");
        Ok(removed)
    }

    async fn delete_dependents(&self, ctx: &OpCtx, owner: Owner) -> Result<Removed> {
        Ok(Removed {
            task_items: self.task_items.delete_by_owner(ctx, owner).await?,
            comments: self.comments.delete_by_owner(ctx, owner).await?,
            attachments: self.attachments.delete_by_owner(ctx, owner).await?,
            ..Removed::default()
        })
    }
}

//! Owning references and the list/delete-by-owner helpers built on them.

use async_trait::async_trait;
use bizstore_db::{Collection, OpCtx, Record};
use bizstore_query::{Error, ObjectId, Page, Result};

use super::fields::Fields;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    Customer,
    Associate,
    Staff,
    Order,
}

impl OwnerKind {
    /// Field on the dependent record holding the owner's primary id.
    #[must_use]
    pub fn field(self) -> &'static str {
        match self {
            OwnerKind::Customer => Fields::CUSTOMER_ID,
            OwnerKind::Associate => Fields::ASSOCIATE_ID,
            OwnerKind::Staff => Fields::STAFF_ID,
            OwnerKind::Order => Fields::ORDER_ID,
        }
    }
}

/// A concrete owner: its kind and primary id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Owner {
    Customer(ObjectId),
    Associate(ObjectId),
    Staff(ObjectId),
    Order(ObjectId),
}

impl Owner {
    #[must_use]
    pub fn kind(self) -> OwnerKind {
        match self {
            Owner::Customer(_) => OwnerKind::Customer,
            Owner::Associate(_) => OwnerKind::Associate,
            Owner::Staff(_) => OwnerKind::Staff,
            Owner::Order(_) => OwnerKind::Order,
        }
    }

    #[must_use]
    pub fn id(self) -> ObjectId {
        match self {
            Owner::Customer(id) | Owner::Associate(id) | Owner::Staff(id) | Owner::Order(id) => id,
        }
    }
}

/// A record that may reference owners of the listed kinds.
pub trait Owned: Record {
    const OWNERS: &'static [OwnerKind];
}

fn owner_field<R: Owned>(owner: Owner) -> Result<&'static str> {
    let kind = owner.kind();
    if R::OWNERS.contains(&kind) {
        Ok(kind.field())
    } else {
        Err(Error::InvalidFilter(format!(
            "{} records do not reference {}",
            R::ENTITY,
            kind.field()
        )))
    }
}

/// Narrow by-owner helpers. Each is an unordered sweep filtered by the
/// owner reference.
#[async_trait]
pub trait OwnedExt<R: Owned> {
    /// # Errors
    /// `InvalidFilter` if `R` cannot be owned by `owner`'s kind, otherwise
    /// the errors of `Collection::list`.
    async fn list_by_owner(&self, ctx: &OpCtx, owner: Owner) -> Result<Page<R>>;

    /// Delete every record owned by `owner`. Returns how many went away.
    ///
    /// # Errors
    /// As [`OwnedExt::list_by_owner`].
    async fn delete_by_owner(&self, ctx: &OpCtx, owner: Owner) -> Result<u64>;

    /// # Errors
    /// As [`OwnedExt::list_by_owner`].
    async fn ids_by_owner(&self, ctx: &OpCtx, owner: Owner) -> Result<Vec<ObjectId>>;
}

#[async_trait]
impl<R: Owned> OwnedExt<R> for Collection<R> {
    async fn list_by_owner(&self, ctx: &OpCtx, owner: Owner) -> Result<Page<R>> {
        let field = owner_field::<R>(owner)?;
        self.list_by_reference(ctx, field, owner.id()).await
    }

    async fn delete_by_owner(&self, ctx: &OpCtx, owner: Owner) -> Result<u64> {
        let field = owner_field::<R>(owner)?;
        self.delete_by_reference(ctx, field, owner.id()).await
    }

    async fn ids_by_owner(&self, ctx: &OpCtx, owner: Owner) -> Result<Vec<ObjectId>> {
        let field = owner_field::<R>(owner)?;
        self.ids_by_reference(ctx, field, owner.id()).await
    }
}

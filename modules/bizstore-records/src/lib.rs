#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Tenant-scoped business records.
//!
//! Entities live under [`domain`]; [`Records`] opens one collection per
//! entity on a shared document store and runs owner cascades across them.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! use bizstore_records::{Records, RecordsConfig};
//!
//! let cfg = RecordsConfig::from_figment(&RecordsConfig::figment(None))?;
//! let records = Records::connect(&cfg).await?;
//! let ctx = records.ctx();
//! let tenants = records.tenants.count(&ctx, &bizstore_query::ListQuery::default()).await?;
//! # let _ = tenants;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod registry;

pub use config::{CollectionNames, ENV_PREFIX, RecordsConfig};
pub use domain::owner::{Owned, OwnedExt, Owner, OwnerKind};
pub use domain::user::UsersExt;
pub use domain::{SkillSetRef, TagRef, lexical_name};
pub use registry::{Records, Removed};

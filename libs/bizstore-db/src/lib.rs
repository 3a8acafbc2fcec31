#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Store-facing half of the listing engine.
//!
//! - [`DocumentStore`]: the contract a backing document store fulfils
//! - [`MemoryStore`]: in-memory reference store
//! - [`OpCtx`]: per-operation deadline and cancellation
//! - [`Pager`]: executes one page of a [`bizstore_query::ListQuery`]
//! - [`PublicIdAllocator`]: per-tenant public id assignment
//! - [`Collection`]: typed per-entity call surface built on all of the above
//! - [`StoreConfig`] / [`open_store`]: configuration and bootstrap

pub mod allocator;
pub mod collection;
pub mod config;
pub mod ctx;
pub mod memory;
pub mod pager;
pub mod record;
pub mod store;

pub use allocator::{LatestPublicId, PublicIdAllocator, SerialPublicIds};
pub use collection::Collection;
pub use config::{ConfigError, StoreConfig, open_store, redact_credentials};
pub use ctx::OpCtx;
pub use memory::MemoryStore;
pub use pager::{Pager, decode};
pub use record::{LiteView, Record, RecordMeta, status};
pub use store::{
    Document, DocumentStore, FindOptions, IndexKey, IndexSpec, SortSpec, StoreError,
};

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Query primitives shared by every entity listing.
//!
//! This crate is pure and synchronous. It turns a typed list filter into a
//! store-level [`Predicate`] plus an ordering, and encodes/decodes the opaque
//! continuation tokens that resume an ordered scan. Nothing here talks to a
//! store; `bizstore-db` executes what this crate builds.
//!
//! # Pieces
//!
//! - [`ObjectId`]: the 12-byte primary identifier and pagination tiebreaker
//! - [`Cursor`]: `(sort value, last id)` continuation token codec
//! - [`Terms`] / [`Term`]: typed predicate algebra consumed by the builder
//! - [`SortField`]: per-entity closed allow-list of orderable fields
//! - [`builder::build_list`]: single-pass filter builder
//! - [`Page`] / [`PageInfo`]: one page of results plus the next cursor

pub mod builder;
pub mod cursor;
pub mod filter;
pub mod object_id;
pub mod page;
pub mod predicate;
pub mod query;
pub mod value;

pub use builder::{BuiltList, Ordering, build_count, build_list};
pub use cursor::{Cursor, SortValue};
pub use filter::{SortField, SortKind, Term, Terms, Tristate};
pub use object_id::ObjectId;
pub use page::{Page, PageInfo, SelectOption};
pub use predicate::{CompareOp, Predicate};
pub use query::{ListFilter, ListQuery};
pub use value::Value;

/// Document field holding the primary id.
pub const ID_FIELD: &str = "_id";
/// Document field holding the owning tenant.
pub const TENANT_FIELD: &str = "tenant_id";
/// Document field holding the per-tenant public id.
pub const PUBLIC_ID_FIELD: &str = "public_id";
/// Document field holding the status code.
pub const STATUS_FIELD: &str = "status";
/// Document field the text-match score is projected into.
pub const TEXT_SCORE_FIELD: &str = "_score";

/// Page-size ceiling used by internal reference sweeps (cascades, exports).
pub const SWEEP_PAGE_SIZE: u64 = 1_000_000;

// Ordering primitives
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SortDir {
    #[default]
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
}

impl SortDir {
    /// Reverse the sort direction (Asc <-> Desc)
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }

    /// Map the numeric `+1` / `-1` convention used by list filters.
    /// Any negative number is descending; everything else is ascending.
    #[must_use]
    pub fn from_sign(sign: i8) -> Self {
        if sign < 0 { SortDir::Desc } else { SortDir::Asc }
    }

    #[must_use]
    pub fn sign(self) -> i8 {
        match self {
            SortDir::Asc => 1,
            SortDir::Desc => -1,
        }
    }
}

impl std::fmt::Display for SortDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDir::Asc => write!(f, "asc"),
            SortDir::Desc => write!(f, "desc"),
        }
    }
}

/// Unified error type for listing, paging and store operations.
///
/// `NotFound` is deliberately absent: getters return `Ok(None)`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A continuation token failed base64, structural or value checks.
    #[error("invalid cursor: {0}")]
    CursorCorrupt(&'static str),

    /// Sort field outside the entity allow-list, or an unsupported combination
    /// such as text search together with a cursor.
    #[error("unsupported sort: {0}")]
    UnsupportedSort(String),

    /// A predicate or paging parameter is malformed.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// Unclassified failure from the underlying store.
    #[error("store error: {0}")]
    Store(String),

    #[error("operation timed out")]
    Timeout,

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;

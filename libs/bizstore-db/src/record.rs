//! Shape shared by every stored entity.

use bizstore_query::{ObjectId, SortField};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::store::IndexSpec;

/// Status codes shared by all entities.
pub mod status {
    pub const ACTIVE: i32 = 1;
    pub const ARCHIVED: i32 = 2;
}

/// Identity, scope and lifecycle fields carried by every record.
///
/// Entities embed it with `#[serde(flatten)]`, so these fields sit at the top
/// level of the stored document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
    /// Primary id. Nil until the record is created.
    #[serde(rename = "_id", default)]
    pub id: ObjectId,
    /// Owning tenant. `None` for unscoped records such as tenants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<ObjectId>,
    /// Per-tenant, per-entity human facing id. Zero until allocated.
    #[serde(default)]
    pub public_id: u64,
    #[serde(default)]
    pub status: i32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub modified_at: DateTime<Utc>,
    /// Text-match score, present only on text search results.
    #[serde(rename = "_score", default, skip_serializing)]
    pub score: Option<f64>,
}

impl RecordMeta {
    /// Fresh metadata for a record not yet stored: nil id, unallocated
    /// public id, active status.
    #[must_use]
    pub fn new(tenant_id: Option<ObjectId>) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::NIL,
            tenant_id,
            public_id: 0,
            status: status::ACTIVE,
            created_at: now,
            modified_at: now,
            score: None,
        }
    }

    #[must_use]
    pub fn is_archived(&self) -> bool {
        self.status == status::ARCHIVED
    }
}

/// Narrow projection of a record used by list views and pickers.
pub trait LiteView: DeserializeOwned + Send + 'static {
    fn id(&self) -> ObjectId;

    /// Human readable label for select options.
    fn label(&self) -> String;
}

/// A stored entity.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Closed allow-list of orderable fields.
    type Sort: SortField;
    type Lite: LiteView;

    /// Entity name used in logs and default collection names.
    const ENTITY: &'static str;
    /// Fields covered by the text index. Empty means no text search.
    const TEXT_FIELDS: &'static [&'static str];
    /// Top-level fields fetched for the lite projection.
    const LITE_FIELDS: &'static [&'static str];
    /// Whether public ids are allocated per tenant. Unscoped entities share
    /// one sequence.
    const TENANT_SCOPED: bool = true;
    const ARCHIVED_STATUS: i32 = status::ARCHIVED;

    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// Entity specific indexes created alongside the standard ones.
    fn indexes() -> Vec<IndexSpec> {
        Vec::new()
    }
}

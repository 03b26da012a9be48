//! Response bodies of the uniform per-entity HTTP surface.
//!
//! Shared so the client decodes exactly what the controller encodes.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Body of `PATCH /{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResponse<T> {
    pub updated: bool,
    pub rows: usize,
    pub data: Vec<T>,
}

impl<T> UpdateResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            updated: !data.is_empty(),
            rows: data.len(),
            data,
        }
    }
}

/// Body of `DELETE /{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: DbId,
}

/// Body of the bulk `DELETE /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    pub deleted: bool,
    pub deleted_count: u64,
    pub requested_count: u64,
    pub message: String,
}

/// Row counts by creation date, as served by `GET /stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStatistics {
    /// Rows created since the start of the current week.
    pub weekly: i64,
    /// Rows created since the start of the current month.
    pub monthly: i64,
    /// Rows created since the start of the current year.
    pub yearly: i64,
    pub total: i64,
}

//! The generic repository contract and its PostgreSQL implementation.

mod pg_repo;
mod sql;

use academy_core::pagination::{PaginatedResponse, PaginationQuery};
use academy_core::response::EntityStatistics;
use academy_core::types::DbId;
use async_trait::async_trait;

use crate::entity::{Column, ColumnValue, EntityConfig};
use crate::error::RepoResult;

pub use pg_repo::PgRepository;

/// CRUD, listing, and statistics for one entity type.
///
/// Services depend on this trait rather than on a concrete store, so an
/// in-memory implementation can stand in for PostgreSQL in tests.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    type Entity: Send + Sync + 'static;
    type Create: Send + Sync + 'static;
    type Update: Send + Sync + 'static;

    fn config(&self) -> &EntityConfig;

    /// Insert a row and return it as stored.
    async fn create(&self, input: &Self::Create) -> RepoResult<Self::Entity>;

    async fn find_by_id(&self, id: DbId) -> RepoResult<Option<Self::Entity>>;

    /// Every row matching all of the equality filters.
    async fn find_all(&self, filters: &[Column]) -> RepoResult<Vec<Self::Entity>>;

    /// Rows whose `field` equals `value`. `field` is resolved through the entity config.
    async fn find_by(&self, field: &str, value: ColumnValue) -> RepoResult<Vec<Self::Entity>>;

    async fn find_one_by(&self, field: &str, value: ColumnValue)
        -> RepoResult<Option<Self::Entity>>;

    /// Apply a partial update. `None` when no row has that id; otherwise the updated rows.
    async fn update(&self, id: DbId, input: &Self::Update) -> RepoResult<Option<Vec<Self::Entity>>>;

    /// Returns whether a row was removed (or marked deleted).
    async fn delete(&self, id: DbId) -> RepoResult<bool>;

    async fn count(&self, filters: &[Column]) -> RepoResult<i64>;

    async fn exists(&self, id: DbId) -> RepoResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    /// One page of rows plus totals. A negative page size returns every row.
    async fn find_paginated(
        &self,
        query: &PaginationQuery,
    ) -> RepoResult<PaginatedResponse<Self::Entity>>;

    /// Delete every listed id that exists; returns the number affected.
    async fn delete_multiple(&self, ids: &[DbId]) -> RepoResult<u64>;

    /// Rows created this week, month, and year, plus the overall total.
    async fn statistics(&self) -> RepoResult<EntityStatistics>;
}

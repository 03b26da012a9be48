//! Business layer over a [`Repository`].
//!
//! Reads and creates pass through. Updates and deletes check that the target
//! exists before any hook or write runs, and bulk deletes report partial
//! success instead of failing.

use std::sync::Arc;

use academy_core::error::CoreError;
use academy_core::pagination::{PaginatedResponse, PaginationQuery};
use academy_core::response::{BulkDeleteResponse, EntityStatistics};
use academy_core::types::DbId;
use academy_db::entity::{Column, ColumnValue};
use academy_db::repositories::Repository;

use crate::error::AppResult;
use crate::hooks::{EntityHooks, NoHooks};

/// Result of a bulk delete. `success` holds only when every requested id was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkDeleteOutcome {
    pub deleted_count: u64,
    pub requested_count: u64,
    pub success: bool,
}

impl BulkDeleteOutcome {
    pub fn new(deleted_count: u64, requested_count: u64) -> Self {
        Self {
            deleted_count,
            requested_count,
            success: deleted_count == requested_count,
        }
    }

    pub fn to_body(self, entity: &str) -> BulkDeleteResponse {
        let message = if self.success {
            format!("Deleted {} {entity} record(s)", self.deleted_count)
        } else {
            format!(
                "Deleted {} of {} {entity} record(s); {} not found",
                self.deleted_count,
                self.requested_count,
                self.requested_count.saturating_sub(self.deleted_count)
            )
        };

        BulkDeleteResponse {
            deleted: self.success,
            deleted_count: self.deleted_count,
            requested_count: self.requested_count,
            message,
        }
    }
}

pub struct EntityService<R: Repository> {
    repo: R,
    hooks: Arc<dyn EntityHooks<R::Create, R::Update>>,
}

impl<R: Repository> EntityService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            hooks: Arc::new(NoHooks),
        }
    }

    pub fn with_hooks(mut self, hooks: impl EntityHooks<R::Create, R::Update>) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn entity(&self) -> &'static str {
        self.repo.config().entity
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub async fn create(&self, input: R::Create) -> AppResult<R::Entity> {
        let input = self.hooks.before_create(input).await?;
        Ok(self.repo.create(&input).await?)
    }

    pub async fn find_all(&self, filters: &[Column]) -> AppResult<Vec<R::Entity>> {
        Ok(self.repo.find_all(filters).await?)
    }

    pub async fn find_by_id(&self, id: DbId) -> AppResult<Option<R::Entity>> {
        Ok(self.repo.find_by_id(id).await?)
    }

    pub async fn find_by(&self, field: &str, value: ColumnValue) -> AppResult<Vec<R::Entity>> {
        Ok(self.repo.find_by(field, value).await?)
    }

    pub async fn find_one_by(
        &self,
        field: &str,
        value: ColumnValue,
    ) -> AppResult<Option<R::Entity>> {
        Ok(self.repo.find_one_by(field, value).await?)
    }

    pub async fn count(&self, filters: &[Column]) -> AppResult<i64> {
        Ok(self.repo.count(filters).await?)
    }

    pub async fn exists(&self, id: DbId) -> AppResult<bool> {
        Ok(self.repo.exists(id).await?)
    }

    pub async fn find_paginated(
        &self,
        query: &PaginationQuery,
    ) -> AppResult<PaginatedResponse<R::Entity>> {
        Ok(self.repo.find_paginated(query).await?)
    }

    /// Apply a partial update, returning the updated rows.
    pub async fn update(&self, id: DbId, input: R::Update) -> AppResult<Vec<R::Entity>> {
        self.ensure_exists(id).await?;
        let input = self.hooks.before_update(id, input).await?;
        self.repo
            .update(id, &input)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    pub async fn delete(&self, id: DbId) -> AppResult<()> {
        self.ensure_exists(id).await?;
        if !self.repo.delete(id).await? {
            return Err(self.not_found(id));
        }
        Ok(())
    }

    pub async fn delete_multiple(&self, ids: &[DbId]) -> AppResult<BulkDeleteOutcome> {
        if ids.is_empty() {
            return Ok(BulkDeleteOutcome::new(0, 0));
        }
        let deleted = self.repo.delete_multiple(ids).await?;
        Ok(BulkDeleteOutcome::new(deleted, ids.len() as u64))
    }

    pub async fn get_statistics(&self) -> AppResult<EntityStatistics> {
        Ok(self.repo.statistics().await?)
    }

    async fn ensure_exists(&self, id: DbId) -> AppResult<()> {
        if self.repo.exists(id).await? {
            Ok(())
        } else {
            Err(self.not_found(id))
        }
    }

    fn not_found(&self, id: DbId) -> crate::error::AppError {
        CoreError::NotFound {
            entity: self.entity(),
            id,
        }
        .into()
    }
}

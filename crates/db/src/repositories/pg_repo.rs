use std::marker::PhantomData;

use academy_core::pagination::{PaginatedResponse, PaginationQuery};
use academy_core::response::EntityStatistics;
use academy_core::types::DbId;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::FromRow;

use super::{sql, Repository};
use crate::entity::{Column, ColumnValue, EntityConfig, IntoColumns};
use crate::error::RepoResult;
use crate::DbPool;

/// [`Repository`] over a PostgreSQL table described by an [`EntityConfig`].
pub struct PgRepository<E, C, U> {
    pool: DbPool,
    config: &'static EntityConfig,
    _types: PhantomData<fn() -> (E, C, U)>,
}

impl<E, C, U> PgRepository<E, C, U> {
    pub fn new(pool: DbPool, config: &'static EntityConfig) -> Self {
        Self {
            pool,
            config,
            _types: PhantomData,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn filter_columns(&self, field: &str, value: ColumnValue) -> RepoResult<Vec<Column>> {
        let name = self.config.lookup_column(field)?;
        Ok(vec![Column { name, value }])
    }
}

impl<E, C, U> Clone for PgRepository<E, C, U> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone(), self.config)
    }
}

#[async_trait]
impl<E, C, U> Repository for PgRepository<E, C, U>
where
    E: for<'r> FromRow<'r, PgRow> + Send + Sync + Unpin + 'static,
    C: IntoColumns + Send + Sync + 'static,
    U: IntoColumns + Send + Sync + 'static,
{
    type Entity = E;
    type Create = C;
    type Update = U;

    fn config(&self) -> &EntityConfig {
        self.config
    }

    async fn create(&self, input: &C) -> RepoResult<E> {
        let mut qb = sql::insert(self.config, input.into_columns());
        let row = qb.build_query_as::<E>().fetch_one(&self.pool).await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: DbId) -> RepoResult<Option<E>> {
        let mut qb = sql::select_by_id(self.config, id);
        let row = qb.build_query_as::<E>().fetch_optional(&self.pool).await?;
        Ok(row)
    }

    async fn find_all(&self, filters: &[Column]) -> RepoResult<Vec<E>> {
        let mut qb = sql::select_where(self.config, filters.to_vec(), false);
        let rows = qb.build_query_as::<E>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn find_by(&self, field: &str, value: ColumnValue) -> RepoResult<Vec<E>> {
        let filters = self.filter_columns(field, value)?;
        let mut qb = sql::select_where(self.config, filters, false);
        let rows = qb.build_query_as::<E>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn find_one_by(&self, field: &str, value: ColumnValue) -> RepoResult<Option<E>> {
        let filters = self.filter_columns(field, value)?;
        let mut qb = sql::select_where(self.config, filters, true);
        let row = qb.build_query_as::<E>().fetch_optional(&self.pool).await?;
        Ok(row)
    }

    async fn update(&self, id: DbId, input: &U) -> RepoResult<Option<Vec<E>>> {
        let mut qb = sql::update(self.config, id, input.into_columns());
        let rows = qb.build_query_as::<E>().fetch_all(&self.pool).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows))
    }

    async fn delete(&self, id: DbId) -> RepoResult<bool> {
        let mut qb = sql::delete(self.config, id);
        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, filters: &[Column]) -> RepoResult<i64> {
        let mut qb = sql::count_where(self.config, filters.to_vec());
        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn find_paginated(&self, query: &PaginationQuery) -> RepoResult<PaginatedResponse<E>> {
        let query = query.clone().normalized();

        let mut select = sql::select_page(self.config, &query)?;
        let items = select.build_query_as::<E>().fetch_all(&self.pool).await?;

        if query.is_unpaginated() {
            return Ok(PaginatedResponse::unpaginated(items));
        }

        let mut count = sql::count_page(self.config, &query)?;
        let item_count = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        Ok(PaginatedResponse::new(items, item_count, query.page, query.page_size))
    }

    async fn delete_multiple(&self, ids: &[DbId]) -> RepoResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut qb = sql::delete_many(self.config, ids.to_vec());
        let result = qb.build().execute(&self.pool).await?;
        tracing::debug!(
            entity = self.config.entity,
            requested = ids.len(),
            deleted = result.rows_affected(),
            "Bulk delete executed"
        );
        Ok(result.rows_affected())
    }

    async fn statistics(&self) -> RepoResult<EntityStatistics> {
        let mut qb = sql::statistics(self.config);
        let (weekly, monthly, yearly, total) = qb
            .build_query_as::<(i64, i64, i64, i64)>()
            .fetch_one(&self.pool)
            .await?;
        Ok(EntityStatistics {
            weekly,
            monthly,
            yearly,
            total,
        })
    }
}

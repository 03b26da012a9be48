//! Paginated list controller.
//!
//! [`PaginatedList`] owns the client-side view of one entity: the current
//! page window (`items`), an accumulating unpaginated cache (`all_items`),
//! pagination totals, and the last query. After a create, update, or delete
//! it patches that state in place instead of refetching, and it refetches
//! only when a delete empties the window.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use academy_core::pagination::{
    page_count, FilterValue, PaginatedResponse, PaginationQuery, SortOrder, ALL_ROWS,
};
use academy_core::response::BulkDeleteResponse;
use academy_core::types::{DbId, Identifiable};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::api::EntityApi;
use crate::error::TransportError;

/// Which entry survives when a fetched row collides with a cached one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Insert-if-absent: the cached entry wins.
    #[default]
    KeepExisting,
    /// The freshly fetched entry replaces the cached one.
    PreferFetched,
}

/// Totals needed to render pagination controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub page_size: i64,
    pub item_count: i64,
    pub page_count: i64,
}

impl Pagination {
    pub fn empty(page_size: i64) -> Self {
        Self {
            page: 1,
            page_size,
            item_count: 0,
            page_count: 0,
        }
    }

    fn recompute(&mut self) {
        self.page_count = page_count(self.item_count, self.page_size);
    }
}

impl<T> From<&PaginatedResponse<T>> for Pagination {
    fn from(page: &PaginatedResponse<T>) -> Self {
        Self {
            page: page.page,
            page_size: page.page_size,
            item_count: page.item_count,
            page_count: page.page_count,
        }
    }
}

/// Changes to merge into the persisted query before a fetch.
///
/// Unset fields keep their current value. An empty `search` or `sort_by`
/// clears it; a cleared filter value (`"all"` or `[]`) removes that filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPatch {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub filters: Option<BTreeMap<String, FilterValue>>,
}

impl QueryPatch {
    pub fn page(page: i64) -> Self {
        Self {
            page: Some(page),
            ..Self::default()
        }
    }

    pub fn apply(self, query: &mut PaginationQuery) {
        if let Some(page) = self.page {
            query.page = page;
        }
        if let Some(page_size) = self.page_size {
            query.page_size = page_size;
        }
        if let Some(search) = self.search {
            query.search = Some(search).filter(|s| !s.is_empty());
        }
        if let Some(sort_by) = self.sort_by {
            query.sort_by = Some(sort_by).filter(|s| !s.is_empty());
        }
        if let Some(order) = self.sort_order {
            query.sort_order = Some(order);
        }
        for (field, value) in self.filters.unwrap_or_default() {
            if value.is_cleared() {
                query.filters.remove(&field);
            } else {
                query.filters.insert(field, value);
            }
        }
    }
}

/// Everything the list controller owns. Mutations go through the `apply_*`
/// methods, which never touch the network.
#[derive(Debug, Clone)]
pub struct ListState<E> {
    pub items: Vec<E>,
    pub all_items: Vec<E>,
    pub pagination: Pagination,
    pub query: PaginationQuery,
    pub error: Option<TransportError>,
}

impl<E: Identifiable> ListState<E> {
    pub fn new(query: PaginationQuery) -> Self {
        Self {
            items: Vec::new(),
            all_items: Vec::new(),
            pagination: Pagination::empty(query.page_size),
            query,
            error: None,
        }
    }

    pub fn apply_page(&mut self, page: PaginatedResponse<E>) {
        self.pagination = Pagination::from(&page);
        self.items = page.items;
    }

    /// Union fetched rows into `all_items` by id.
    pub fn merge_all(&mut self, fetched: Vec<E>, policy: MergePolicy) {
        for item in fetched {
            match self.all_items.iter().position(|cached| cached.id() == item.id()) {
                Some(index) if policy == MergePolicy::PreferFetched => self.all_items[index] = item,
                Some(_) => {}
                None => self.all_items.push(item),
            }
        }
    }

    /// Prepend a newly created row, keeping the window at `page_size`.
    pub fn apply_created(&mut self, item: E) {
        self.items.insert(0, item);
        if self.pagination.page_size > 0 {
            self.items.truncate(self.pagination.page_size as usize);
        }
        self.pagination.item_count += 1;
        self.pagination.recompute();
    }

    /// Replace the row with the same id. Returns whether the window held it.
    pub fn apply_updated(&mut self, item: &E) -> bool
    where
        E: Clone,
    {
        if let Some(cached) = self.all_items.iter_mut().find(|c| c.id() == item.id()) {
            *cached = item.clone();
        }
        match self.items.iter_mut().find(|c| c.id() == item.id()) {
            Some(current) => {
                *current = item.clone();
                true
            }
            None => false,
        }
    }

    /// Remove `ids` and take `removed` off the total.
    ///
    /// Returns the page to refetch when this removal empties the window.
    pub fn apply_removed(&mut self, ids: &[DbId], removed: u64) -> Option<i64> {
        let window_len = self.items.len();
        self.items.retain(|item| !ids.contains(&item.id()));
        self.all_items.retain(|item| !ids.contains(&item.id()));
        self.pagination.item_count = self
            .pagination
            .item_count
            .saturating_sub(i64::try_from(removed).unwrap_or(i64::MAX))
            .max(0);
        self.pagination.recompute();

        if !self.items.is_empty() || self.items.len() == window_len {
            return None;
        }
        Some(if self.pagination.page > 1 {
            self.pagination.page - 1
        } else {
            1
        })
    }
}

/// Lowers the loading count when the operation finishes, however it finishes.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn raise(in_flight: &'a AtomicUsize) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        Self(in_flight)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct PaginatedList<E> {
    api: Arc<dyn EntityApi<E>>,
    state: RwLock<ListState<E>>,
    initial_query: PaginationQuery,
    merge_policy: MergePolicy,
    in_flight: AtomicUsize,
}

impl<E> PaginatedList<E>
where
    E: Identifiable + Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(api: Arc<dyn EntityApi<E>>, page_size: i64) -> Self {
        Self::with_query(
            api,
            PaginationQuery {
                page_size,
                ..PaginationQuery::default()
            },
        )
    }

    /// Start from `query`; [`Self::reset_filters`] returns to it.
    pub fn with_query(api: Arc<dyn EntityApi<E>>, query: PaginationQuery) -> Self {
        Self {
            api,
            state: RwLock::new(ListState::new(query.clone())),
            initial_query: query,
            merge_policy: MergePolicy::default(),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    // ---- state accessors ----

    pub async fn snapshot(&self) -> ListState<E> {
        self.state.read().await.clone()
    }

    pub async fn items(&self) -> Vec<E> {
        self.state.read().await.items.clone()
    }

    pub async fn all_items(&self) -> Vec<E> {
        self.state.read().await.all_items.clone()
    }

    pub async fn pagination(&self) -> Pagination {
        self.state.read().await.pagination
    }

    pub async fn query(&self) -> PaginationQuery {
        self.state.read().await.query.clone()
    }

    pub async fn last_error(&self) -> Option<TransportError> {
        self.state.read().await.error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    // ---- fetching ----

    /// Merge `patch` into the query and replace the window with the server's page.
    pub async fn fetch_data(&self, patch: QueryPatch) -> Result<(), TransportError> {
        let query = {
            let mut state = self.state.write().await;
            patch.apply(&mut state.query);
            state.query.clone()
        };

        let page = self.run(self.api.fetch_page(&query)).await?;
        tracing::debug!(page = page.page, items = page.items.len(), "Fetched page");
        self.state.write().await.apply_page(page);
        Ok(())
    }

    /// Every row matching the query, served from the cache unless it is empty or `force` is set.
    pub async fn fetch_all_data(
        &self,
        patch: QueryPatch,
        force: bool,
    ) -> Result<Vec<E>, TransportError> {
        let query = {
            let state = self.state.read().await;
            if !force && !state.all_items.is_empty() {
                return Ok(state.all_items.clone());
            }
            let mut query = state.query.clone();
            patch.apply(&mut query);
            query.page = 1;
            query.page_size = ALL_ROWS;
            query
        };

        let page = self.run(self.api.fetch_page(&query)).await?;
        let mut state = self.state.write().await;
        state.merge_all(page.items, self.merge_policy);
        Ok(state.all_items.clone())
    }

    pub async fn go_to_page(&self, page: i64) -> Result<(), TransportError> {
        self.fetch_data(QueryPatch::page(page)).await
    }

    pub async fn update_page_size(&self, page_size: i64) -> Result<(), TransportError> {
        self.fetch_data(QueryPatch {
            page: Some(1),
            page_size: Some(page_size),
            ..QueryPatch::default()
        })
        .await
    }

    pub async fn update_filters(
        &self,
        filters: BTreeMap<String, FilterValue>,
    ) -> Result<(), TransportError> {
        self.fetch_data(QueryPatch {
            page: Some(1),
            filters: Some(filters),
            ..QueryPatch::default()
        })
        .await
    }

    pub async fn update_search(&self, search: impl Into<String>) -> Result<(), TransportError> {
        self.fetch_data(QueryPatch {
            page: Some(1),
            search: Some(search.into()),
            ..QueryPatch::default()
        })
        .await
    }

    /// Back to the initial items, pagination, and query. The unpaginated cache is kept.
    pub async fn reset_filters(&self) {
        let mut state = self.state.write().await;
        let all_items = std::mem::take(&mut state.all_items);
        *state = ListState::new(self.initial_query.clone());
        state.all_items = all_items;
    }

    // ---- optimistic patches ----

    pub async fn handle_post_create(&self, item: E) {
        self.state.write().await.apply_created(item);
    }

    pub async fn handle_post_update(&self, item: &E) {
        self.state.write().await.apply_updated(item);
    }

    /// Merge `partial`'s fields into the row with `id`, if the window holds it.
    pub async fn handle_post_update_partial(&self, id: DbId, partial: &Value) {
        let mut state = self.state.write().await;
        let Some(current) = state.items.iter().find(|item| item.id() == id) else {
            return;
        };

        match merge_fields(current, partial) {
            Ok(merged) => {
                state.apply_updated(&merged);
            }
            Err(e) => tracing::warn!(id, error = %e, "Partial update did not fit the entity"),
        }
    }

    pub async fn handle_post_delete(&self, id: DbId) -> Result<(), TransportError> {
        self.handle_bulk_delete(&[id], 1).await
    }

    /// Drop `ids` from the window and cache; refetch when the window empties.
    pub async fn handle_bulk_delete(
        &self,
        ids: &[DbId],
        deleted_count: u64,
    ) -> Result<(), TransportError> {
        let refetch = self.state.write().await.apply_removed(ids, deleted_count);
        match refetch {
            Some(page) => {
                tracing::debug!(page, "Window emptied by delete, refetching");
                self.go_to_page(page).await
            }
            None => Ok(()),
        }
    }

    // ---- mutations ----

    pub async fn create(&self, input: &Value) -> Result<E, TransportError> {
        let created = self.run(self.api.create(input)).await?;
        self.handle_post_create(created.clone()).await;
        Ok(created)
    }

    pub async fn update(&self, id: DbId, input: &Value) -> Result<Vec<E>, TransportError> {
        let rows = self.run(self.api.update(id, input)).await?;
        for row in &rows {
            self.handle_post_update(row).await;
        }
        Ok(rows)
    }

    /// Delete one row. Succeeds once the server applied the delete; a failed
    /// refetch afterwards is left in [`Self::last_error`].
    pub async fn delete(&self, id: DbId) -> Result<(), TransportError> {
        self.run(self.api.delete(id)).await?;
        if let Err(e) = self.handle_post_delete(id).await {
            tracing::debug!(id, error = %e, "Refetch after delete failed");
        }
        Ok(())
    }

    /// Bulk counterpart of [`Self::delete`], with the same refetch handling.
    pub async fn bulk_delete(&self, ids: &[DbId]) -> Result<BulkDeleteResponse, TransportError> {
        let outcome = self.run(self.api.delete_many(ids)).await?;
        if let Err(e) = self.handle_bulk_delete(ids, outcome.deleted_count).await {
            tracing::debug!(requested = ids.len(), error = %e, "Refetch after bulk delete failed");
        }
        Ok(outcome)
    }

    /// Run one network operation: raise the loading flag, record the outcome.
    async fn run<T, F>(&self, operation: F) -> Result<T, TransportError>
    where
        F: std::future::Future<Output = Result<T, TransportError>>,
    {
        let _loading = LoadingGuard::raise(&self.in_flight);
        let result = operation.await;
        let mut state = self.state.write().await;
        match &result {
            Ok(_) => state.error = None,
            Err(e) => {
                tracing::warn!(error = %e, "List operation failed");
                state.error = Some(e.clone());
            }
        }
        result
    }
}

/// Shallow JSON merge of `partial` over `current`.
fn merge_fields<E: Serialize + DeserializeOwned>(
    current: &E,
    partial: &Value,
) -> Result<E, serde_json::Error> {
    let mut merged = serde_json::to_value(current)?;
    if let (Value::Object(target), Value::Object(fields)) = (&mut merged, partial) {
        for (key, value) in fields {
            target.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(merged)
}

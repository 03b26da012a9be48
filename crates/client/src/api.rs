//! HTTP collaborator for one entity resource.
//!
//! [`EntityApi`] is the seam the list controller talks through;
//! [`HttpEntityApi`] implements it with [`reqwest`] against the uniform
//! `/api/v1/{resource}` surface.

use std::marker::PhantomData;

use academy_core::pagination::{PaginatedResponse, PaginationQuery};
use academy_core::response::{BulkDeleteResponse, UpdateResponse};
use academy_core::types::DbId;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::TransportError;

/// Remote operations on one entity type.
#[async_trait]
pub trait EntityApi<E>: Send + Sync {
    /// One page (or, with a negative page size, every row) of the entity.
    async fn fetch_page(&self, query: &PaginationQuery)
        -> Result<PaginatedResponse<E>, TransportError>;

    async fn create(&self, input: &Value) -> Result<E, TransportError>;

    /// Apply a partial update; returns the updated rows.
    async fn update(&self, id: DbId, input: &Value) -> Result<Vec<E>, TransportError>;

    async fn delete(&self, id: DbId) -> Result<(), TransportError>;

    async fn delete_many(&self, ids: &[DbId]) -> Result<BulkDeleteResponse, TransportError>;
}

/// HTTP client for a single entity resource, e.g. `http://host/api/v1/trainings`.
pub struct HttpEntityApi<E> {
    client: reqwest::Client,
    resource_url: String,
    token: Option<String>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> HttpEntityApi<E> {
    pub fn new(resource_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), resource_url)
    }

    /// Reuse an existing [`reqwest::Client`] so resources share one connection pool.
    pub fn with_client(client: reqwest::Client, resource_url: impl Into<String>) -> Self {
        Self {
            client,
            resource_url: resource_url.into().trim_end_matches('/').to_string(),
            token: None,
            _entity: PhantomData,
        }
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn resource_url(&self) -> &str {
        &self.resource_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{path}", self.resource_url));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // ---- private helpers ----

    /// Return the response unchanged on success, or the classified error.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::debug!(status = status.as_u16(), %body, "API request failed");
            return Err(TransportError::from_response(status.as_u16(), &body));
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TransportError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Query-string pairs for a page request. Filters travel as one JSON-encoded value.
pub fn query_pairs(query: &PaginationQuery) -> Result<Vec<(&'static str, String)>, TransportError> {
    let mut pairs = vec![
        ("page", query.page.to_string()),
        ("pageSize", query.page_size.to_string()),
    ];
    if let Some(search) = &query.search {
        pairs.push(("search", search.clone()));
    }
    if let Some(sort_by) = &query.sort_by {
        pairs.push(("sortBy", sort_by.clone()));
    }
    if let Some(order) = query.sort_order {
        pairs.push(("sortOrder", order.as_sql().to_ascii_lowercase()));
    }
    if !query.filters.is_empty() {
        let encoded = serde_json::to_string(&query.filters)
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        pairs.push(("filters", encoded));
    }
    Ok(pairs)
}

#[async_trait]
impl<E> EntityApi<E> for HttpEntityApi<E>
where
    E: DeserializeOwned + Send + 'static,
{
    async fn fetch_page(
        &self,
        query: &PaginationQuery,
    ) -> Result<PaginatedResponse<E>, TransportError> {
        let response = self
            .request(reqwest::Method::GET, "")
            .query(&query_pairs(query)?)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn create(&self, input: &Value) -> Result<E, TransportError> {
        let response = self
            .request(reqwest::Method::POST, "")
            .json(input)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn update(&self, id: DbId, input: &Value) -> Result<Vec<E>, TransportError> {
        let response = self
            .request(reqwest::Method::PATCH, &format!("/{id}"))
            .json(input)
            .send()
            .await?;
        let body: UpdateResponse<E> = Self::parse_response(response).await?;
        Ok(body.data)
    }

    async fn delete(&self, id: DbId) -> Result<(), TransportError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/{id}"))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn delete_many(&self, ids: &[DbId]) -> Result<BulkDeleteResponse, TransportError> {
        let response = self
            .request(reqwest::Method::DELETE, "")
            .json(&json!({ "ids": ids }))
            .send()
            .await?;
        Self::parse_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use academy_core::pagination::{FilterValue, SortOrder};

    use super::*;

    #[test]
    fn query_pairs_encode_filters_as_json() {
        let query = PaginationQuery {
            page: 3,
            page_size: 20,
            search: Some("rust".into()),
            sort_by: Some("title".into()),
            sort_order: Some(SortOrder::Desc),
            filters: BTreeMap::from([("level".to_string(), FilterValue::from("advanced"))]),
        };

        let pairs = query_pairs(&query).unwrap();

        assert_eq!(
            pairs,
            vec![
                ("page", "3".to_string()),
                ("pageSize", "20".to_string()),
                ("search", "rust".to_string()),
                ("sortBy", "title".to_string()),
                ("sortOrder", "desc".to_string()),
                ("filters", r#"{"level":"advanced"}"#.to_string()),
            ]
        );
    }

    #[test]
    fn unpaginated_query_sends_the_sentinel_size() {
        let pairs = query_pairs(&PaginationQuery::all()).unwrap();
        assert_eq!(pairs[1], ("pageSize", "-1".to_string()));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn resource_url_drops_trailing_slash() {
        let api: HttpEntityApi<Value> = HttpEntityApi::new("http://localhost:3000/api/v1/trainings/");
        assert_eq!(api.resource_url(), "http://localhost:3000/api/v1/trainings");
    }
}

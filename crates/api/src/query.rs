//! Query and body shapes shared by every entity router.

use std::collections::BTreeMap;

use academy_core::pagination::{FilterValue, PaginationQuery, SortOrder};
use academy_core::types::DbId;
use academy_core::validation::{
    validate_payload, Dto, DtoError, FieldKind, FieldRule, PayloadSource, ValidationError,
};
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::error::AppError;
use crate::extract::DtoRejection;

const SORT_ORDERS: &[&str] = &["asc", "desc", "ASC", "DESC"];

/// `GET /` query string: `page`, `pageSize`, `search`, `sortBy`, `sortOrder`,
/// and `filters` as a JSON-encoded object.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    #[validate(length(max = 200))]
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    #[validate(custom(function = "filters_object"))]
    pub filters: Option<String>,
}

impl Dto for ListParams {
    const FIELDS: &'static [FieldRule] = &[
        FieldRule::optional("page", FieldKind::Integer),
        FieldRule::optional("pageSize", FieldKind::Integer),
        FieldRule::optional("search", FieldKind::String),
        FieldRule::optional("sortBy", FieldKind::String),
        FieldRule::optional("sortOrder", FieldKind::Enum(SORT_ORDERS)),
        FieldRule::optional("filters", FieldKind::String),
    ];
}

fn parse_filters(raw: &str) -> Result<BTreeMap<String, FilterValue>, serde_json::Error> {
    serde_json::from_str(raw)
}

fn filters_object(raw: &str) -> Result<(), validator::ValidationError> {
    parse_filters(raw).map(|_| ()).map_err(|_| {
        validator::ValidationError::new("isJson")
            .with_message("filters must be a JSON object of field values".into())
    })
}

impl ListParams {
    /// The repository query these parameters describe. Normalization of
    /// out-of-range values happens in the repository.
    pub fn into_query(self) -> Result<PaginationQuery, AppError> {
        let defaults = PaginationQuery::default();
        let filters = match self.filters.as_deref() {
            Some(raw) => parse_filters(raw).map_err(|e| AppError::BadRequest(e.to_string()))?,
            None => BTreeMap::new(),
        };
        let sort_order = self
            .sort_order
            .as_deref()
            .map(str::parse::<SortOrder>)
            .transpose()
            .map_err(AppError::BadRequest)?;

        Ok(PaginationQuery {
            page: self.page.unwrap_or(defaults.page),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            search: self.search,
            sort_by: self.sort_by,
            sort_order,
            filters,
        })
    }
}

/// JSON body form of a bulk delete: `{"ids": [1, 2, 3]}`.
#[derive(Debug, Deserialize, Validate)]
pub struct BulkDeleteBody {
    #[validate(custom(function = "integer_ids"))]
    pub ids: Vec<Value>,
}

fn integer_ids(ids: &[Value]) -> Result<(), validator::ValidationError> {
    if ids.iter().all(Value::is_i64) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("isInt")
            .with_message("each value in ids must be an integer number".into()))
    }
}

impl Dto for BulkDeleteBody {
    const FIELDS: &'static [FieldRule] = &[FieldRule::required("ids", FieldKind::Array)];
}

#[derive(Debug, Default, Deserialize)]
struct IdsQuery {
    ids: Option<String>,
}

/// Target ids of `DELETE /`, from `?ids=1,2,3` or a `{"ids": [...]}` body.
/// The query string wins when both are present.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteTargets(pub Vec<DbId>);

impl<S> FromRequest<S> for DeleteTargets
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let Query(query) = Query::<IdsQuery>::from_request_parts(&mut parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        if let Some(csv) = query.ids {
            return parse_id_list(&csv)
                .map(DeleteTargets)
                .map_err(IntoResponse::into_response);
        }

        let body = Bytes::from_request(Request::from_parts(parts, body), state)
            .await
            .map_err(IntoResponse::into_response)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::Validation(ValidationError::single(
                "ids",
                "isDefined",
                "ids should not be null or undefined".to_string(),
                Value::Null,
            ))
            .into_response());
        }

        let raw: Value = serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(e.to_string()).into_response())?;
        validate_payload::<BulkDeleteBody>(raw, PayloadSource::Json)
            .map(|b| DeleteTargets(b.ids.iter().filter_map(Value::as_i64).collect()))
            .map_err(|e: DtoError| DtoRejection::Dto(e).into_response())
    }
}

/// Parse a comma-separated id list. Blank entries are skipped.
pub fn parse_id_list(csv: &str) -> Result<Vec<DbId>, AppError> {
    csv.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<DbId>()
                .map_err(|_| AppError::BadRequest(format!("Invalid id '{part}' in ids")))
        })
        .collect()
}

/// Parse a path id, answering 400 rather than axum's plain-text rejection.
pub fn parse_id(raw: &str) -> Result<DbId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid id '{raw}'")))
}

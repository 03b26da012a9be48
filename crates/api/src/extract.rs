//! Validated DTO extractor.
//!
//! [`Valid`], [`ValidForm`] and [`ValidQuery`] read the raw payload from the
//! JSON body, the form body, or the query string, run [`validate_payload`]
//! for `D`, and hand the handler the typed DTO.
//!
//! ```ignore
//! async fn create(Valid(input): Valid<CreateTraining>) -> AppResult<Json<Training>> { .. }
//! async fn list(ValidQuery(params): ValidQuery<ListParams>) -> AppResult<..> { .. }
//! ```

use std::collections::BTreeMap;

use academy_core::validation::{
    validate_payload, ConfigurationError, Dto, DtoError, PayloadSource,
};
use axum::extract::{Form, FromRequest, FromRequestParts, Query, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{Map, Value};

use crate::error::{error_response, AppError};

/// Request context installed by the entity router.
///
/// Its absence means the extractor runs outside any entity router, which is
/// a wiring mistake rather than bad input.
#[derive(Debug, Clone, Copy)]
pub struct EntityScope {
    pub entity: &'static str,
}

/// A JSON body DTO that passed every field rule and value constraint.
pub struct Valid<D>(pub D);

/// Like [`Valid`], read from an `application/x-www-form-urlencoded` body.
pub struct ValidForm<D>(pub D);

/// Like [`Valid`], read from the URL query string.
pub struct ValidQuery<D>(pub D);

#[derive(Debug)]
pub enum DtoRejection {
    /// The payload could not be read at all (wrong content type, broken JSON).
    Malformed(String),
    Dto(DtoError),
}

impl From<DtoError> for DtoRejection {
    fn from(err: DtoError) -> Self {
        DtoRejection::Dto(err)
    }
}

impl From<ConfigurationError> for DtoRejection {
    fn from(err: ConfigurationError) -> Self {
        DtoRejection::Dto(DtoError::Misconfigured(err))
    }
}

impl IntoResponse for DtoRejection {
    fn into_response(self) -> Response {
        match self {
            DtoRejection::Malformed(msg) => AppError::BadRequest(msg).into_response(),
            DtoRejection::Dto(DtoError::Invalid(err)) => AppError::Validation(err).into_response(),
            DtoRejection::Dto(DtoError::Misconfigured(err)) => {
                tracing::error!(error = %err, "DTO configuration error");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIGURATION_ERROR",
                    "The server is misconfigured".to_string(),
                )
            }
        }
    }
}

impl<S, D> FromRequest<S> for Valid<D>
where
    S: Send + Sync,
    D: Dto,
{
    type Rejection = DtoRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        extract::<S, D>(req, state, PayloadSource::Json).await.map(Valid)
    }
}

impl<S, D> FromRequest<S> for ValidForm<D>
where
    S: Send + Sync,
    D: Dto,
{
    type Rejection = DtoRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        extract::<S, D>(req, state, PayloadSource::FormData)
            .await
            .map(ValidForm)
    }
}

impl<S, D> FromRequest<S> for ValidQuery<D>
where
    S: Send + Sync,
    D: Dto,
{
    type Rejection = DtoRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        extract::<S, D>(req, state, PayloadSource::Query)
            .await
            .map(ValidQuery)
    }
}

async fn extract<S, D>(req: Request, state: &S, source: PayloadSource) -> Result<D, DtoRejection>
where
    S: Send + Sync,
    D: Dto,
{
    if req.extensions().get::<EntityScope>().is_none() {
        return Err(ConfigurationError::MissingContext {
            dto: std::any::type_name::<D>(),
        }
        .into());
    }

    let raw = match source {
        PayloadSource::Json => {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| DtoRejection::Malformed(e.body_text()))?;
            value
        }
        PayloadSource::FormData => {
            let Form(fields) = Form::<BTreeMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| DtoRejection::Malformed(e.body_text()))?;
            strings_to_object(fields)
        }
        PayloadSource::Query => {
            let (mut parts, _body) = req.into_parts();
            let Query(fields) =
                Query::<BTreeMap<String, String>>::from_request_parts(&mut parts, state)
                    .await
                    .map_err(|e| DtoRejection::Malformed(e.body_text()))?;
            strings_to_object(fields)
        }
    };

    Ok(validate_payload::<D>(raw, source)?)
}

fn strings_to_object(fields: BTreeMap<String, String>) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<Map<String, Value>>(),
    )
}

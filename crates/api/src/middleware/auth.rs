//! Bearer-token gate for mutating routes.
//!
//! The gate is only a hook point: with no `ADMIN_TOKEN` configured every
//! request passes.

use academy_core::error::CoreError;
use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;
use crate::state::AppState;

/// Proof that the request carried the configured admin token (or that none is configured).
#[derive(Debug, Clone, Copy)]
pub struct AdminToken;

impl FromRequestParts<AppState> for AdminToken {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.admin_token.as_deref() else {
            return Ok(AdminToken);
        };

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        if token != expected {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin token rejected".into(),
            )));
        }

        Ok(AdminToken)
    }
}

/// Route layer form of [`AdminToken`], for use with `from_fn_with_state`.
pub async fn require_admin_token(_token: AdminToken, req: Request, next: Next) -> Response {
    next.run(req).await
}

//! Route middleware.
//!
//! - [`auth::AdminToken`] -- Extracts and checks the `ADMIN_TOKEN` bearer token.
//! - [`auth::require_admin_token`] -- The same check as an attachable route layer.

pub mod auth;

use std::sync::Arc;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is reference-counted and the config is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, created once in `main`.
    pub pool: academy_db::DbPool,
    pub config: Arc<ServerConfig>,
}

pub mod health;
pub mod training;
pub mod user;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /trainings                 list, create, bulk delete
/// /trainings/stats           creation statistics
/// /trainings/{id}            get, update, delete
///
/// /users                     list, create, bulk delete (admin token)
/// /users/{id}                get, update, delete (admin token)
/// ```
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/trainings", training::router(state))
        .nest("/users", user::router(state))
}

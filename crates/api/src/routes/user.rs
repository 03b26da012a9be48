//! User routes mounted at `/users`.
//!
//! Every route requires the admin token, passwords are hashed before they
//! are stored, and the statistics route is not exposed.

use academy_db::models::user::{CreateUser, UpdateUser, User, USER_CONFIG};
use academy_db::repositories::PgRepository;
use axum::middleware::from_fn_with_state;
use axum::Router;

use crate::controller::{EntityRouter, Route};
use crate::hooks::SecretHashing;
use crate::middleware::auth::require_admin_token;
use crate::service::EntityService;
use crate::state::AppState;

pub type UserRepo = PgRepository<User, CreateUser, UpdateUser>;

pub fn router(state: &AppState) -> Router<AppState> {
    let repo = UserRepo::new(state.pool.clone(), &USER_CONFIG);

    EntityRouter::new(EntityService::new(repo).with_hooks(SecretHashing))
        .exclude(Route::Stats)
        .layer_all(from_fn_with_state(state.clone(), require_admin_token))
        .into_router()
}

//! Training catalog routes mounted at `/trainings`.
//!
//! Reads are public; every mutating route requires the admin token.

use academy_db::models::training::{CreateTraining, Training, UpdateTraining, TRAINING_CONFIG};
use academy_db::repositories::PgRepository;
use axum::middleware::from_fn_with_state;
use axum::Router;

use crate::controller::{EntityRouter, Route};
use crate::middleware::auth::require_admin_token;
use crate::service::EntityService;
use crate::state::AppState;

pub type TrainingRepo = PgRepository<Training, CreateTraining, UpdateTraining>;

pub fn router(state: &AppState) -> Router<AppState> {
    let repo = TrainingRepo::new(state.pool.clone(), &TRAINING_CONFIG);

    EntityRouter::new(EntityService::new(repo))
        .layer_on(
            &Route::MUTATING,
            from_fn_with_state(state.clone(), require_admin_token),
        )
        .into_router()
}

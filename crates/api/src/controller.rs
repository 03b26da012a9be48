//! Declarative per-entity route table.
//!
//! [`EntityRouter`] mounts the uniform CRUD surface for one entity:
//!
//! ```text
//! GET    /        list            PaginatedResponse
//! GET    /stats   stats           EntityStatistics
//! GET    /{id}    get_by_id       entity
//! POST   /        create          201 + entity
//! PATCH  /{id}    update          {updated, rows, data}
//! DELETE /{id}    delete_single   {deleted, id}
//! DELETE /        delete_multiple {deleted, deletedCount, requestedCount, message}
//! ```
//!
//! Any route can be excluded, and middleware can be attached to every route
//! or to chosen routes. Middleware attached to every route runs first; within
//! a list, middleware runs in registration order.

use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::Arc;

use academy_core::error::CoreError;
use academy_core::pagination::PaginatedResponse;
use academy_core::response::{
    BulkDeleteResponse, DeleteResponse, EntityStatistics, UpdateResponse,
};
use academy_core::validation::Dto;
use academy_db::repositories::Repository;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{self, MethodRouter};
use axum::{Extension, Json, Router};
use serde::Serialize;
use tower::{Layer, Service};

use crate::error::{AppError, AppResult};
use crate::extract::{EntityScope, Valid, ValidQuery};
use crate::query::{parse_id, DeleteTargets, ListParams};
use crate::service::EntityService;

/// One endpoint of the entity surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    List,
    Stats,
    GetById,
    Create,
    Update,
    DeleteSingle,
    DeleteMultiple,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::List,
        Route::Stats,
        Route::GetById,
        Route::Create,
        Route::Update,
        Route::DeleteSingle,
        Route::DeleteMultiple,
    ];

    /// Routes that change stored data.
    pub const MUTATING: [Route; 4] = [
        Route::Create,
        Route::Update,
        Route::DeleteSingle,
        Route::DeleteMultiple,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::List | Route::Create | Route::DeleteMultiple => "/",
            Route::Stats => "/stats",
            Route::GetById | Route::Update | Route::DeleteSingle => "/{id}",
        }
    }
}

type ServiceState<R> = Arc<EntityService<R>>;
type Middleware<R> =
    Box<dyn Fn(MethodRouter<ServiceState<R>>) -> MethodRouter<ServiceState<R>> + Send + Sync>;

pub struct EntityRouter<R: Repository> {
    service: ServiceState<R>,
    excluded: HashSet<Route>,
    global: Vec<Middleware<R>>,
    per_route: HashMap<Route, Vec<Middleware<R>>>,
}

impl<R> EntityRouter<R>
where
    R: Repository,
    R::Entity: Serialize,
    R::Create: Dto,
    R::Update: Dto,
{
    pub fn new(service: EntityService<R>) -> Self {
        Self {
            service: Arc::new(service),
            excluded: HashSet::new(),
            global: Vec::new(),
            per_route: HashMap::new(),
        }
    }

    /// Do not mount `route`.
    pub fn exclude(mut self, route: Route) -> Self {
        self.excluded.insert(route);
        self
    }

    /// Attach middleware to every mounted route.
    pub fn layer_all<L>(mut self, layer: L) -> Self
    where
        L: Layer<routing::Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.global.push(middleware(layer));
        self
    }

    /// Attach middleware to each of `routes`.
    pub fn layer_on<L>(mut self, routes: &[Route], layer: L) -> Self
    where
        L: Layer<routing::Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        for route in routes {
            self.per_route
                .entry(*route)
                .or_default()
                .push(middleware(layer.clone()));
        }
        self
    }

    /// Build the router, ready to be nested under the entity's resource path.
    pub fn into_router<S>(self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let mut paths: Vec<(&'static str, MethodRouter<ServiceState<R>>)> = Vec::new();

        for route in Route::ALL {
            if self.excluded.contains(&route) {
                continue;
            }
            let mut endpoint = handler_for::<R>(route);
            // The last layer applied is the outermost, so apply in reverse.
            if let Some(layers) = self.per_route.get(&route) {
                for layer in layers.iter().rev() {
                    endpoint = layer(endpoint);
                }
            }
            for layer in self.global.iter().rev() {
                endpoint = layer(endpoint);
            }

            let endpoint = match paths.iter().position(|(path, _)| *path == route.path()) {
                Some(index) => paths.remove(index).1.merge(endpoint),
                None => endpoint,
            };
            paths.push((route.path(), endpoint));
        }

        let scope = EntityScope {
            entity: self.service.entity(),
        };
        let mut router = Router::new();
        for (path, endpoint) in paths {
            router = router.route(path, endpoint);
        }
        router.layer(Extension(scope)).with_state(self.service)
    }
}

fn middleware<R, L>(layer: L) -> Middleware<R>
where
    R: Repository,
    L: Layer<routing::Route> + Clone + Send + Sync + 'static,
    L::Service: Service<Request, Error = Infallible> + Clone + Send + Sync + 'static,
    <L::Service as Service<Request>>::Response: IntoResponse + 'static,
    <L::Service as Service<Request>>::Future: Send + 'static,
{
    Box::new(move |endpoint: MethodRouter<ServiceState<R>>| {
        endpoint.route_layer(layer.clone())
    })
}

fn handler_for<R>(route: Route) -> MethodRouter<ServiceState<R>>
where
    R: Repository,
    R::Entity: Serialize,
    R::Create: Dto,
    R::Update: Dto,
{
    match route {
        Route::List => routing::get(list::<R>),
        Route::Stats => routing::get(stats::<R>),
        Route::GetById => routing::get(get_by_id::<R>),
        Route::Create => routing::post(create::<R>),
        Route::Update => routing::patch(update::<R>),
        Route::DeleteSingle => routing::delete(delete_single::<R>),
        Route::DeleteMultiple => routing::delete(delete_multiple::<R>),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list<R>(
    State(service): State<ServiceState<R>>,
    ValidQuery(params): ValidQuery<ListParams>,
) -> AppResult<Json<PaginatedResponse<R::Entity>>>
where
    R: Repository,
    R::Entity: Serialize,
{
    let query = params.into_query()?;
    let page = service.find_paginated(&query).await?;
    Ok(Json(page))
}

async fn stats<R: Repository>(
    State(service): State<ServiceState<R>>,
) -> AppResult<Json<EntityStatistics>> {
    Ok(Json(service.get_statistics().await?))
}

async fn get_by_id<R>(
    State(service): State<ServiceState<R>>,
    Path(id): Path<String>,
) -> AppResult<Json<R::Entity>>
where
    R: Repository,
    R::Entity: Serialize,
{
    let id = parse_id(&id)?;
    let entity = service
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::from(CoreError::NotFound {
            entity: service.entity(),
            id,
        }))?;
    Ok(Json(entity))
}

async fn create<R>(
    State(service): State<ServiceState<R>>,
    Valid(input): Valid<R::Create>,
) -> AppResult<(StatusCode, Json<R::Entity>)>
where
    R: Repository,
    R::Entity: Serialize,
    R::Create: Dto,
{
    let entity = service.create(input).await?;
    tracing::info!(entity = service.entity(), "Entity created");
    Ok((StatusCode::CREATED, Json(entity)))
}

async fn update<R>(
    State(service): State<ServiceState<R>>,
    Path(id): Path<String>,
    Valid(input): Valid<R::Update>,
) -> AppResult<Json<UpdateResponse<R::Entity>>>
where
    R: Repository,
    R::Entity: Serialize,
    R::Update: Dto,
{
    let id = parse_id(&id)?;
    let rows = service.update(id, input).await?;
    tracing::info!(entity = service.entity(), id, rows = rows.len(), "Entity updated");
    Ok(Json(UpdateResponse::new(rows)))
}

async fn delete_single<R: Repository>(
    State(service): State<ServiceState<R>>,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    let id = parse_id(&id)?;
    service.delete(id).await?;
    tracing::info!(entity = service.entity(), id, "Entity deleted");
    Ok(Json(DeleteResponse { deleted: true, id }))
}

async fn delete_multiple<R: Repository>(
    State(service): State<ServiceState<R>>,
    DeleteTargets(ids): DeleteTargets,
) -> AppResult<Json<BulkDeleteResponse>> {
    let outcome = service.delete_multiple(&ids).await?;
    if outcome.success {
        tracing::info!(
            entity = service.entity(),
            deleted = outcome.deleted_count,
            "Entities bulk deleted"
        );
    } else {
        tracing::warn!(
            entity = service.entity(),
            deleted = outcome.deleted_count,
            requested = outcome.requested_count,
            "Bulk delete partially applied"
        );
    }
    Ok(Json(outcome.to_body(service.entity())))
}

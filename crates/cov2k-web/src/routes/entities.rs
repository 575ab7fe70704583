//! Per-entity endpoints: `GET /{entity}` and `GET /{entity}/{id}`.

use axum::extract::{Path, Query, State};
use axum::{routing::get, Json, Router};
use cov2k_core::{EntityName, Record};
use tracing::debug;

use crate::params::RequestParams;
use crate::state::AppState;
use crate::{Result, WebError};

pub fn entity_routes() -> Router<AppState> {
    Router::new()
        .route("/{entity}", get(list_entity))
        .route("/{entity}/{id}", get(get_entity))
}

fn entity_of(name: &str) -> Result<EntityName> {
    name.parse().map_err(|_| WebError::NotFound)
}

async fn list_entity(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Record>>> {
    let entity = entity_of(&entity)?;
    let params = RequestParams::split(query)?;
    let resolver = state.catalog().resolver_of(entity);
    let window = params.window_for(resolver.pagination_policy(), state.config.chain.default_limit)?;
    let filter = params.filter();

    debug!(%entity, ?filter, ?window, "Listing entity");
    let records = resolver.list(&filter, window).await?;
    Ok(Json(records))
}

async fn get_entity(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
) -> Result<Json<Vec<Record>>> {
    let entity = entity_of(&entity)?;
    debug!(%entity, id = %id, "Fetching entity by id");
    let records = state.catalog().resolver_of(entity).get(&id).await?;
    Ok(Json(records))
}

//! `GET /combine/{*path}`: relationship chains.

use axum::extract::{Path, Query, State};
use axum::{routing::get, Json, Router};
use cov2k_core::Record;
use tracing::debug;

use crate::params::RequestParams;
use crate::state::AppState;
use crate::Result;

pub fn combine_routes() -> Router<AppState> {
    Router::new().route("/combine/{*path}", get(combine))
}

async fn combine(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Record>>> {
    let params = RequestParams::split(query)?;
    let window = params.mandatory_window(state.config.chain.default_limit)?;

    debug!(path = %path, filters = ?params.filters, ?window, "Combining");
    let records = state
        .driver
        .combine(&path, &params.filters, Some(window))
        .await?;
    Ok(Json(records))
}

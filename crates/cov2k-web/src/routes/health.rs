//! Health check endpoints

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;
use crate::Result;

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "cov2k-api"
    }))
}

async fn ready_check(State(state): State<AppState>) -> Result<Json<Value>> {
    let database = state.pool.stats().await?;

    Ok(Json(json!({
        "status": "ready",
        "knowledge_base": state.kb.stats(),
        "sequences": database,
    })))
}

use crate::middleware::limit_filter_params;
use crate::routes::{combine_routes, entity_routes, health_routes};
use crate::state::AppState;
use crate::{Result, WebError};
use axum::http::{header, HeaderValue, Method};
use axum::{middleware, Router};
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Assemble the full API router over `state`.
pub fn build_router(state: AppState) -> Result<Router> {
    let cors = cors_layer(&state.config.server.cors_origins)?;

    let app = Router::new()
        .merge(health_routes())
        .merge(combine_routes())
        .merge(entity_routes())
        .layer(middleware::from_fn_with_state(state.clone(), limit_filter_params))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    Ok(app)
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|e| WebError::Config(format!("Invalid CORS origin {origin:?}: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

pub async fn start_server(state: AppState) -> Result<()> {
    let addr: SocketAddr = state
        .config
        .server
        .bind_address()
        .parse()
        .map_err(|e| WebError::Config(format!("Invalid address: {e}")))?;

    let app = build_router(state)?;

    tracing::info!("Starting API server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(WebError::Io)?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(WebError::Io)?;

    tracing::info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

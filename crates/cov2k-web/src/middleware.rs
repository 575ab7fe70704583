//! Request guards applied in front of every route.

use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::params::distinct_filter_keys;
use crate::state::AppState;
use crate::WebError;

/// Reject requests carrying more distinct filter keys than the server allows.
///
/// `limit` and `page` are not counted. A query string that does not parse is
/// passed through so the handler's extractor reports it.
pub async fn limit_filter_params(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let max = state.config.server.max_filter_params;
    if let Ok(Query(pairs)) = Query::<Vec<(String, String)>>::try_from_uri(request.uri()) {
        let count = distinct_filter_keys(pairs.iter().map(|(key, _)| key.as_str()));
        if count > max {
            debug!(count, max, uri = %request.uri(), "Too many query parameters");
            return WebError::TooManyParameters.into_response();
        }
    }
    next.run(request).await
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cov2k_core::{CoreError, ResolveError};
use cov2k_store::StoreError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WebError>;

pub const TOO_MANY_PARAMETERS: &str = "The API accepts only one query parameter at a time";

#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Not Found")]
    NotFound,

    #[error("The API accepts only one query parameter at a time")]
    TooManyParameters,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ResolveError> for WebError {
    fn from(err: ResolveError) -> Self {
        if let ResolveError::Backend(message) = &err {
            tracing::error!(error = %message, "Resolver failed");
        }
        WebError::Core(CoreError::from(err))
    }
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::Core(err) => {
                StatusCode::from_u16(err.status()).unwrap_or(StatusCode::BAD_REQUEST)
            }
            WebError::NotFound => StatusCode::NOT_FOUND,
            WebError::TooManyParameters => StatusCode::BAD_REQUEST,
            WebError::Config(_) | WebError::Store(_) | WebError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            WebError::Core(err) => err.reason(),
            WebError::NotFound => "not_found",
            WebError::TooManyParameters => "too_many_query_parameters",
            WebError::Config(_) | WebError::Store(_) | WebError::Io(_) => "internal_error",
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = Json(json!({
            "detail": self.to_string(),
            "reason": self.reason(),
        }));
        (status, body).into_response()
    }
}

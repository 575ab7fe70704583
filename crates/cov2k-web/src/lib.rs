//! HTTP surface of the CoV2K API.
//!
//! One `GET` endpoint pair per entity (`/{entity}` and `/{entity}/{id}`),
//! relationship chains under `/combine/{*path}`, and `/health` + `/ready`.
//! Errors are rendered as `{"detail": ..., "reason": ...}` JSON bodies.

pub mod middleware;
pub mod params;
pub mod routes;
pub mod server;
pub mod state;

mod error;

pub use error::{Result, WebError, TOO_MANY_PARAMETERS};
pub use server::{build_router, start_server};
pub use state::AppState;

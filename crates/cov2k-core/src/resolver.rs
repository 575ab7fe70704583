//! Resolver contract implemented by every entity backend.

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::EntityName;
use crate::pagination::PageWindow;
use crate::record::{Filter, Record};

/// Errors raised by an entity resolver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    #[error("unsupported filter key: {0}")]
    UnsupportedFilter(String),

    #[error("{message}")]
    InvalidIdentifier {
        kind: &'static str,
        value: String,
        message: String,
    },

    #[error("record of {entity} is missing its identifier field {field}")]
    MissingIdentifier {
        entity: EntityName,
        field: &'static str,
    },

    #[error("backend error: {0}")]
    Backend(String),
}

impl ResolveError {
    pub fn invalid_identifier(kind: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            kind,
            value: value.into(),
            message: message.into(),
        }
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;

/// How an entity's list endpoint treats missing pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationPolicy {
    /// Both-or-neither; absent means the full result.
    Optional,
    /// Always windowed; absent values fall back to defaults.
    Mandatory,
}

/// A read-only source of records for one entity.
///
/// Implementations must include the entity's identifier field in every
/// record and must report unknown filter keys as
/// [`ResolveError::UnsupportedFilter`].
#[async_trait]
pub trait EntityResolver: Send + Sync {
    /// Records matching every condition of `filter`, optionally windowed.
    async fn list(&self, filter: &Filter, window: Option<PageWindow>) -> ResolveResult<Vec<Record>>;

    /// Records whose identifier equals `id`.
    async fn get(&self, id: &str) -> ResolveResult<Vec<Record>>;

    fn pagination_policy(&self) -> PaginationPolicy;

    /// Filter keys accepted by [`EntityResolver::list`], in evaluation order.
    fn supported_filters(&self) -> Vec<&'static str>;
}

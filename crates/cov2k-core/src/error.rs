//! Errors surfaced to API callers.
//!
//! Each kind renders the fixed human-readable message returned in the
//! response body and exposes a machine-readable reason plus HTTP status.

use thiserror::Error;

use crate::catalog::EntityName;
use crate::resolver::ResolveError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("The request does not point to any entity")]
    NoEntitySpecified,

    #[error("The request contains unrecognised entities.")]
    UnrecognisedCommand,

    #[error("A path cycle was detected in the request. Path cycles are forbidden.")]
    PathCycleDetected,

    #[error("The request express an illegal conjunction of parameters and cannot be interpreted")]
    IllegalParameterCombination,

    #[error("The request contains a unrecognised query parameter.")]
    UnrecognisedQueryParameter,

    #[error(
        "The intermediate entity {entity} produces an exceptional high number of results (> {limit}) \
         and cannot be handled. It is suggested to retry with different parameters in order to \
         reduce computational cost."
    )]
    IntermediateResultTooLarge { entity: EntityName, limit: usize },

    #[error("The request specifies only one between page and limit. You should define either both or none.")]
    IncompletePaginationParams,

    #[error("Parameters limit and page must be positive integers.")]
    InvalidPaginationValue,

    #[error("{0}")]
    InvalidIdentifier(String),

    #[error("A record of {entity} lacks its identifier field {field}.")]
    MissingIdentifier {
        entity: EntityName,
        field: &'static str,
    },

    #[error("Something went wrong")]
    BadRequest,
}

impl CoreError {
    pub fn status(&self) -> u16 {
        match self {
            CoreError::InvalidPaginationValue | CoreError::InvalidIdentifier(_) => 422,
            CoreError::MissingIdentifier { .. } => 500,
            _ => 400,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            CoreError::NoEntitySpecified => "no_entity_specified",
            CoreError::UnrecognisedCommand => "unrecognised_command",
            CoreError::PathCycleDetected => "path_cycle_detected",
            CoreError::IllegalParameterCombination => "illegal_parameter_combination",
            CoreError::UnrecognisedQueryParameter => "unrecognised_query_parameter",
            CoreError::IntermediateResultTooLarge { .. } => "intermediate_result_too_large",
            CoreError::IncompletePaginationParams => "incomplete_pagination_params",
            CoreError::InvalidPaginationValue => "invalid_pagination_value",
            CoreError::InvalidIdentifier(_) => "invalid_identifier",
            CoreError::MissingIdentifier { .. } => "missing_identifier",
            CoreError::BadRequest => "bad_request",
        }
    }
}

/// Translation used by the per-entity endpoints, which call a single
/// resolver directly.
impl From<ResolveError> for CoreError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::UnsupportedFilter(_) => CoreError::UnrecognisedQueryParameter,
            ResolveError::InvalidIdentifier { message, .. } => CoreError::InvalidIdentifier(message),
            ResolveError::MissingIdentifier { entity, field } => {
                CoreError::MissingIdentifier { entity, field }
            }
            ResolveError::Backend(_) => CoreError::BadRequest,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intermediate_message_names_entity() {
        let err = CoreError::IntermediateResultTooLarge {
            entity: EntityName::Sequences,
            limit: 10_000,
        };
        let message = err.to_string();
        assert!(message.starts_with("The intermediate entity sequences produces"));
        assert!(message.contains("(> 10000)"));
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_statuses() {
        assert_eq!(CoreError::PathCycleDetected.status(), 400);
        assert_eq!(CoreError::InvalidIdentifier("x".into()).status(), 422);
        assert_eq!(CoreError::InvalidPaginationValue.status(), 422);
    }

    #[test]
    fn test_resolver_errors_translate() {
        assert_eq!(
            CoreError::from(ResolveError::UnsupportedFilter("foo".into())),
            CoreError::UnrecognisedQueryParameter
        );
        assert_eq!(
            CoreError::from(ResolveError::Backend("disk".into())),
            CoreError::BadRequest
        );
        let invalid = ResolveError::invalid_identifier(
            "aa_change_id",
            "S614",
            "The given aa_change_id is not syntactically valid.",
        );
        assert_eq!(
            CoreError::from(invalid).to_string(),
            "The given aa_change_id is not syntactically valid."
        );
    }
}

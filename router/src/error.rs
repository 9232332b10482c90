//! Error handling for registration, generation and snapshot persistence
//!
//! Match-time misses are not errors: "no such path" and "wrong method" are
//! ordinary [`MatchResult`](crate::MatchResult) values.

use std::io;
use thiserror::Error;

/// Router error type covering every failure surfaced to callers
#[derive(Debug, Error)]
pub enum RouteError {
    /// Malformed pattern or impossible host setup; aborts registration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Named route is absent from the registry
    #[error("Cannot generate URI for route \"{0}\"; route not found")]
    RouteNotFound(String),

    /// No pattern variant can be satisfied by the supplied arguments
    #[error(
        "Route `{route}` expects at least argument values for [{}], but received [{}]",
        .missing.join(","),
        .received.join(",")
    )]
    MissingArguments {
        route: String,
        missing: Vec<String>,
        received: Vec<String>,
    },

    /// Argument value rejected by its variable regex
    #[error("Argument value for [{name}] did not match the regex `{regex}` (pattern `{pattern}`)")]
    InvalidArgument {
        name: String,
        regex: String,
        pattern: String,
    },

    /// URL generation relative to the current request without one
    #[error("Current route is not detected")]
    NoCurrentRoute,

    /// Snapshot store failures
    #[error("Cache error: {0}")]
    Cache(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Radix tree rejected a template
    #[error(transparent)]
    Tree(#[from] radix_core::RouterError),
}

impl From<rmp_serde::encode::Error> for RouteError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::Cache(format!("failed to encode dispatch snapshot: {}", err))
    }
}

impl From<rmp_serde::decode::Error> for RouteError {
    fn from(err: rmp_serde::decode::Error) -> Self {
        Self::Cache(format!("failed to decode dispatch snapshot: {}", err))
    }
}

/// Convenient Result type for router operations
pub type RouteResult<T> = Result<T, RouteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_arguments_message() {
        let err = RouteError::MissingArguments {
            route: "post/view".to_string(),
            missing: vec!["id".to_string(), "slug".to_string()],
            received: vec!["id".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Route `post/view` expects at least argument values for [id,slug], but received [id]"
        );
    }

    #[test]
    fn test_tree_errors_are_transparent() {
        let err: RouteError = radix_core::RouterError::InvalidPath("/a/:".to_string()).into();
        assert_eq!(err.to_string(), "Invalid path: /a/:");
    }
}

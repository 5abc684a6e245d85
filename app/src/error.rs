//! Error types for the todo view and its collaborators.

use thiserror::Error;

/// Result type alias for remote service calls.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Failures reported by the remote data or auth service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The service could not be reached.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The caller is not allowed to perform the operation.
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    /// The referenced record does not exist.
    #[error("Todo not found: {0}")]
    NotFound(String),

    /// The service refused the request.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// Failures surfaced by the todo view.
///
/// Each variant names the operation that failed. The reducer stores the
/// `Display` form in `TodoState::error`, replacing any earlier message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// The live query failed to deliver a snapshot.
    #[error("Could not load todos: {0}")]
    SubscriptionDelivery(#[source] ServiceError),

    /// A create request failed.
    #[error("Could not create todo: {0}")]
    CreateRequest(#[source] ServiceError),

    /// A delete request failed.
    #[error("Could not delete todo: {0}")]
    DeleteRequest(#[source] ServiceError),

    /// Sign-out failed.
    #[error("Could not sign out: {0}")]
    SignOut(#[source] ServiceError),
}

/// Invalid configuration values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable holds a value that cannot be parsed.
    #[error("Invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        /// Environment variable name
        var: &'static str,
        /// Raw value found
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

//! Domain error types.

use thiserror::Error;

/// Errors raised when constructing value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("user id must be positive, got {0}")]
    InvalidUserId(i64),
}

/// Errors returned by the persistence gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("message store capacity of {0} exceeded")]
    CapacityExceeded(usize),

    #[error("message store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised when writing to one connection's outbound queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("outbound queue is full")]
    QueueFull,

    #[error("connection is closed")]
    Closed,
}

/// Errors raised while authenticating a connection.
///
/// Every variant is treated uniformly as "unauthorized".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthenticationError {
    #[error("missing credential")]
    MissingCredential,

    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    #[error("credential expired")]
    Expired,
}

//! UseCase layer error types.

use thiserror::Error;

use crate::domain::RepositoryError;

/// Errors that abort a single dispatch turn.
///
/// Delivery failures are not errors of the turn; they are reported in
/// [`SendOutcome`](super::SendOutcome).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("failed to persist message: {0}")]
    Persistence(#[from] RepositoryError),
}

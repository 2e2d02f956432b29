//! Token verification interface.

use super::{AuthenticationError, UserId};

/// Turns a bearer credential into the user it was issued for.
///
/// Constructed explicitly and injected into the use cases; there is no
/// process-wide verifier.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<UserId, AuthenticationError>;
}

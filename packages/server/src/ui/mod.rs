//! WebSocket chat server implementation.

mod handler;
mod server;
pub mod session;
mod signal;
pub mod state;

pub use handler::credential::{AuthenticatedUser, extract_credential};
pub use server::Server;

//! Two-party WebSocket chat server.
//!
//! Keeps a registry of connected users and dispatches each message through
//! "persist, then deliver to the live connections of both parties".

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;

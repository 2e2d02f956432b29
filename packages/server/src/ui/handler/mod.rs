//! HTTP and WebSocket handlers.

pub mod credential;
pub mod http;
pub mod websocket;

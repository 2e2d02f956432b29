//! Domain layer for the chat server.
//!
//! This module contains the entities, value objects and the interfaces
//! (registry, persistence gateway, token verifier) that the use cases depend on.
//! Concrete implementations live in the infrastructure layer.

pub mod auth;
pub mod entity;
pub mod error;
pub mod registry;
pub mod repository;
pub mod value_object;

pub use auth::TokenVerifier;
pub use entity::{Message, NewMessage, OutboundEvent};
pub use error::{AuthenticationError, DeliveryError, RepositoryError, ValueObjectError};
pub use registry::{ConnectionHandle, ConnectionRegistry, OutboundReceiver};
pub use repository::MessageRepository;
pub use value_object::{ConnectionId, MessageId, MessageText, Timestamp, UserId};

#[cfg(test)]
pub use repository::MockMessageRepository;

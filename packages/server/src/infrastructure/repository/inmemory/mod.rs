//! In-memory persistence gateway.

mod message;

pub use message::InMemoryMessageRepository;

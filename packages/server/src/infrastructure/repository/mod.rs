//! Persistence gateway implementations.

pub mod inmemory;

pub use inmemory::InMemoryMessageRepository;

//! Connection registry implementations.
//!
//! - `inmemory`: single process map guarded by a read-write lock

pub mod inmemory;

pub use inmemory::InMemoryConnectionRegistry;

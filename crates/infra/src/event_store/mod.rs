//! Append-only event store boundary.
//!
//! Streams are serialized into the injected key/value store; nothing here
//! assumes a particular backend.

pub mod kv;
pub mod r#trait;

pub use kv::KeyValueEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

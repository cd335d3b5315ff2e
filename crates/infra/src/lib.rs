//! Infrastructure layer: storage, event store, command dispatch, services
//! and configuration.

pub mod app;
pub mod command_dispatcher;
pub mod config;
pub mod event_store;
pub mod services;
pub mod store;


pub use app::MoneyDesk;
pub use command_dispatcher::{CommandDispatcher, DispatchError};
pub use config::AppConfig;
pub use store::{InMemoryKeyValueStore, KeyValueStore, StoreError};

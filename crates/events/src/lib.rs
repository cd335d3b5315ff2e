//! Domain events emitted by the invoice, check and loan aggregates.

pub mod event;

pub use event::Event;

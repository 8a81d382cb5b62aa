//! Ledger events.
//!
//! Facts emitted by stateful stock aggregates (receipt ledgers).

pub mod event;

pub use event::Event;

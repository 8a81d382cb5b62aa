//! `stockledger-core`: shared building blocks for the stock valuation crates.
//!
//! Pure domain primitives only (identifiers, errors, aggregate traits).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{LocationId, MoveId, MoveLineId, PartyId, ProductId, QuantId, ReceiptId, UomId};

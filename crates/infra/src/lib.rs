//! Infrastructure layer: record stores, ledger registry, valuation service,
//! stock projections, queries, config and JSON fixtures.

pub mod config;
pub mod fixtures;
pub mod ledger_registry;
pub mod projections;
pub mod queries;
pub mod store;
pub mod valuation;


pub use config::StockConfig;
pub use ledger_registry::{LedgerRegistry, SharedLedger};
pub use valuation::{ValuationError, ValuationService};

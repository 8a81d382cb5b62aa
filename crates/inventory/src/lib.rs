//! Inventory records: products, locations, moves, quants and the
//! per-location stock summary row.
//!
//! Pure domain logic (no IO, no storage). Quantities are `rust_decimal`
//! values in the unit named on each record.

pub mod error;
pub mod location;
pub mod product;
pub mod quant;
pub mod stock_by_location;
pub mod stock_move;

pub use error::InventoryError;
pub use location::{Location, LocationUsage};
pub use product::{CostMethod, Product};
pub use quant::Quant;
pub use stock_by_location::{QuantityUpdate, StockByLocationRow, UpdateMode};
pub use stock_move::{MoveLine, MoveLineVals, MoveState, PickingCode, StockMove, ValuationFlow};

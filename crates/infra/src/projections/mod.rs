//! Read-side tables rebuilt from the inventory stores.

pub mod stock_by_location;

pub use stock_by_location::{StockByLocationProjection, StockByLocationTable, StockProjectionError};

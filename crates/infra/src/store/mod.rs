//! Record storage abstractions.

pub mod inventory_store;
pub mod record_store;

pub use inventory_store::{InventoryStore, LocationStore, MoveStore, ProductStore, QuantStore};
pub use record_store::{InMemoryRecordStore, RecordStore, StoreError};

use std::collections::HashSet;
use std::sync::Arc;

use stockledger_core::{LocationId, MoveId, ProductId, QuantId};
use stockledger_inventory::{Location, Product, Quant, StockMove};
use stockledger_uom::{StandardConverter, UnitContext, UnitConverter, UomCatalog};

use super::{InMemoryRecordStore, RecordStore, StoreError};

pub type ProductStore = Arc<dyn RecordStore<ProductId, Product>>;
pub type LocationStore = Arc<dyn RecordStore<LocationId, Location>>;
pub type MoveStore = Arc<dyn RecordStore<MoveId, StockMove>>;
pub type QuantStore = Arc<dyn RecordStore<QuantId, Quant>>;

/// The typed stores and unit catalog the stock services read and write.
pub struct InventoryStore {
    pub products: ProductStore,
    pub locations: LocationStore,
    pub moves: MoveStore,
    pub quants: QuantStore,
    units: UomCatalog,
    converter: Arc<dyn UnitConverter>,
}

impl InventoryStore {
    pub fn new(
        products: ProductStore,
        locations: LocationStore,
        moves: MoveStore,
        quants: QuantStore,
        units: UomCatalog,
    ) -> Self {
        Self {
            products,
            locations,
            moves,
            quants,
            units,
            converter: Arc::new(StandardConverter),
        }
    }

    /// Empty in-memory stores over `units`.
    pub fn in_memory(units: UomCatalog) -> Self {
        Self::new(
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryRecordStore::new()),
            units,
        )
    }

    pub fn with_converter(mut self, converter: Arc<dyn UnitConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn catalog(&self) -> &UomCatalog {
        &self.units
    }

    /// Conversion context over the catalog.
    pub fn units(&self) -> UnitContext<'_> {
        UnitContext::new(&self.units, self.converter.as_ref())
    }

    /// Locations whose stock is part of the company valuation.
    pub fn valued_locations(&self) -> Result<HashSet<LocationId>, StoreError> {
        Ok(self
            .locations
            .list()?
            .into_iter()
            .filter(Location::should_be_valued)
            .map(|l| l.id)
            .collect())
    }

    pub fn internal_locations(&self) -> Result<Vec<Location>, StoreError> {
        let mut internal: Vec<Location> = self.locations.list()?.into_iter().filter(Location::is_internal).collect();
        internal.sort_by_key(|l| l.id);
        Ok(internal)
    }
}

impl std::fmt::Debug for InventoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryStore")
            .field("units", &self.units.len())
            .finish_non_exhaustive()
    }
}

//! JSON inventory snapshots: records to seed the stores with, plus the
//! valuations to run against them in order.

use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::MoveId;
use stockledger_inventory::{Location, Product, Quant, StockMove};
use stockledger_uom::{UnitOfMeasure, UomCatalog};

use crate::store::{InventoryStore, StoreError};

/// A valuation to run against a seeded store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValuationStep {
    /// Record an incoming move at `price_unit` per stock unit.
    Receipt { move_id: MoveId, price_unit: Decimal },
    /// Value an outgoing move, optionally for an explicit quantity.
    Delivery {
        move_id: MoveId,
        #[serde(default)]
        quantity: Option<Decimal>,
    },
}

impl ValuationStep {
    pub fn move_id(&self) -> MoveId {
        match self {
            ValuationStep::Receipt { move_id, .. } | ValuationStep::Delivery { move_id, .. } => *move_id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub units: Vec<UnitOfMeasure>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub moves: Vec<StockMove>,
    #[serde(default)]
    pub quants: Vec<Quant>,
    #[serde(default)]
    pub valuations: Vec<ValuationStep>,
}

impl Snapshot {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid inventory snapshot")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading snapshot {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing snapshot {}", path.display()))
    }

    /// In-memory stores holding the snapshot records.
    pub fn to_store(&self) -> Result<InventoryStore, StoreError> {
        let catalog: UomCatalog = self.units.iter().cloned().collect();
        let store = InventoryStore::in_memory(catalog);
        for product in &self.products {
            store.products.upsert(product.id, product.clone())?;
        }
        for location in &self.locations {
            store.locations.upsert(location.id, location.clone())?;
        }
        for mv in &self.moves {
            store.moves.upsert(mv.id, mv.clone())?;
        }
        for quant in &self.quants {
            store.quants.upsert(quant.id, quant.clone())?;
        }
        Ok(store)
    }
}

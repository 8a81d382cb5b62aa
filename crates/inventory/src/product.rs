use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{Entity, ProductId, UomId};

/// Costing method of a product.
///
/// Only `Fifo` has behaviour here: FIFO valuation overwrites the reference
/// cost of FIFO-costed products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostMethod {
    Standard,
    Average,
    Fifo,
}

/// A stockable product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Stock (base) unit.
    pub uom_id: UomId,
    /// Purchase unit, used on incoming moves.
    pub uom_po_id: UomId,
    pub cost_method: CostMethod,
    /// Reference cost per stock unit.
    pub standard_price: Decimal,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, uom_id: UomId, cost_method: CostMethod) -> Self {
        Self {
            id,
            name: name.into(),
            uom_id,
            uom_po_id: uom_id,
            cost_method,
            standard_price: Decimal::ZERO,
        }
    }

    pub fn with_purchase_uom(mut self, uom_po_id: UomId) -> Self {
        self.uom_po_id = uom_po_id;
        self
    }

    pub fn with_standard_price(mut self, price: Decimal) -> Self {
        self.standard_price = price;
        self
    }

    pub fn is_fifo(&self) -> bool {
        self.cost_method == CostMethod::Fifo
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

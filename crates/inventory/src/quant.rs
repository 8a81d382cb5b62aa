//! On-hand lots and their derived quantities.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{Entity, LocationId, ProductId, QuantId};

use crate::stock_move::StockMove;

/// Quantity of a product on hand at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quant {
    pub id: QuantId,
    pub product_id: ProductId,
    pub location_id: LocationId,
    /// On-hand quantity in the product stock unit.
    pub quantity: Decimal,
    /// Part of `quantity` reserved by moves.
    #[serde(default)]
    pub reserved_quantity: Decimal,
}

impl Quant {
    pub fn new(id: QuantId, product_id: ProductId, location_id: LocationId, quantity: Decimal) -> Self {
        Self {
            id,
            product_id,
            location_id,
            quantity,
            reserved_quantity: Decimal::ZERO,
        }
    }

    pub fn with_reserved(mut self, reserved: Decimal) -> Self {
        self.reserved_quantity = reserved;
        self
    }

    pub fn unreserved_on_hand(&self) -> Decimal {
        self.quantity - self.reserved_quantity
    }

    /// Quantity still expected at this quant's location from lines of moves
    /// that are not done yet, in the product stock unit.
    pub fn incoming_from<'a, I>(&self, moves: I) -> Decimal
    where
        I: IntoIterator<Item = &'a StockMove>,
    {
        moves
            .into_iter()
            .filter(|mv| !mv.is_done())
            .flat_map(|mv| mv.lines.iter())
            .filter(|line| line.product_id == self.product_id && line.location_dest_id == self.location_id)
            .map(|line| line.product_qty)
            .sum()
    }

    /// Unreserved on-hand plus what pending move lines bring to this location.
    pub fn forecasted_qty<'a, I>(&self, moves: I) -> Decimal
    where
        I: IntoIterator<Item = &'a StockMove>,
    {
        self.unreserved_on_hand() + self.incoming_from(moves)
    }
}

impl Entity for Quant {
    type Id = QuantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

//! Per (product, location) stock summary row.

use rust_decimal::Decimal;
use serde::Serialize;

use stockledger_core::{LocationId, ProductId};

/// How `update_quantities` treats the given amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Add to the current base quantities.
    Accumulate,
    /// Overwrite the base quantities.
    Reset,
}

/// Amounts passed to [`StockByLocationRow::update_quantities`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuantityUpdate {
    pub incoming: Decimal,
    pub reserved: Decimal,
    pub on_hand: Decimal,
}

impl QuantityUpdate {
    pub fn incoming(qty: Decimal) -> Self {
        Self {
            incoming: qty,
            ..Self::default()
        }
    }

    pub fn on_hand(on_hand: Decimal, reserved: Decimal) -> Self {
        Self {
            on_hand,
            reserved,
            ..Self::default()
        }
    }
}

/// Summary of one product at one location.
///
/// Base quantities only change through `update_quantities`, which recomputes
/// the cached forecast and unreserved figures before returning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockByLocationRow {
    product_id: ProductId,
    location_id: LocationId,
    incoming_qty: Decimal,
    on_hand_qty: Decimal,
    reserved_qty: Decimal,
    forecasted_qty: Decimal,
    unreserved_qty_on_hand: Decimal,
    /// Number of updates applied since the row was created.
    revision: u64,
}

impl StockByLocationRow {
    pub fn new(product_id: ProductId, location_id: LocationId) -> Self {
        Self {
            product_id,
            location_id,
            incoming_qty: Decimal::ZERO,
            on_hand_qty: Decimal::ZERO,
            reserved_qty: Decimal::ZERO,
            forecasted_qty: Decimal::ZERO,
            unreserved_qty_on_hand: Decimal::ZERO,
            revision: 0,
        }
    }

    pub fn update_quantities(&mut self, update: QuantityUpdate, mode: UpdateMode) {
        match mode {
            UpdateMode::Accumulate => {
                self.incoming_qty += update.incoming;
                self.reserved_qty += update.reserved;
                self.on_hand_qty += update.on_hand;
            }
            UpdateMode::Reset => {
                self.incoming_qty = update.incoming;
                self.reserved_qty = update.reserved;
                self.on_hand_qty = update.on_hand;
            }
        }
        self.forecasted_qty = self.on_hand_qty + self.incoming_qty - self.reserved_qty;
        self.unreserved_qty_on_hand = self.on_hand_qty - self.reserved_qty;
        self.revision += 1;
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn location_id(&self) -> LocationId {
        self.location_id
    }

    pub fn incoming_qty(&self) -> Decimal {
        self.incoming_qty
    }

    pub fn on_hand_qty(&self) -> Decimal {
        self.on_hand_qty
    }

    pub fn reserved_qty(&self) -> Decimal {
        self.reserved_qty
    }

    pub fn forecasted_qty(&self) -> Decimal {
        self.forecasted_qty
    }

    pub fn unreserved_qty_on_hand(&self) -> Decimal {
        self.unreserved_qty_on_hand
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

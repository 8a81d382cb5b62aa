use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{Entity, MoveId, ProductId, ReceiptId};

/// A valued incoming quantity that later deliveries consume.
///
/// `remaining_value` is tracked separately from `price_unit * remaining_qty`
/// since cost adjustments (landed costs) change the value without touching
/// the unit price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: ReceiptId,
    pub product_id: ProductId,
    pub move_id: MoveId,
    pub price_unit: Decimal,
    /// Quantity received, in the product stock unit.
    pub quantity: Decimal,
    pub remaining_qty: Decimal,
    pub remaining_value: Decimal,
    pub received_at: DateTime<Utc>,
    /// Recording order within the ledger; breaks ties on `received_at`.
    pub sequence: u64,
}

impl Receipt {
    pub fn is_exhausted(&self) -> bool {
        self.remaining_qty <= Decimal::ZERO
    }

    /// Value per unit of what is left on the receipt.
    ///
    /// `None` once the receipt is exhausted.
    pub fn remaining_unit_value(&self) -> Option<Decimal> {
        if self.is_exhausted() {
            None
        } else {
            Some(self.remaining_value / self.remaining_qty)
        }
    }

    pub(crate) fn fifo_key(&self) -> (DateTime<Utc>, u64) {
        (self.received_at, self.sequence)
    }
}

impl Entity for Receipt {
    type Id = ReceiptId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

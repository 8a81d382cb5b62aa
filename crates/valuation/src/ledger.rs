//! Receipt ledger aggregate: the FIFO queue of one product.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{Aggregate, AggregateRoot, DomainError, MoveId, ProductId, ReceiptId};
use stockledger_events::Event;

use crate::receipt::Receipt;

/// Aggregate root: ReceiptLedger.
///
/// Receipts are kept sorted oldest-first by `(received_at, sequence)`, so
/// iteration order is consumption order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLedger {
    product_id: ProductId,
    receipts: Vec<Receipt>,
    /// Quantity each delivery has taken from the ledger so far.
    consumed_by_move: HashMap<MoveId, Decimal>,
    next_sequence: u64,
    version: u64,
}

impl ReceiptLedger {
    pub fn new(product_id: ProductId) -> Self {
        Self {
            product_id,
            receipts: Vec::new(),
            consumed_by_move: HashMap::new(),
            next_sequence: 1,
            version: 0,
        }
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// All receipts, exhausted ones included, oldest first.
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn receipt(&self, id: ReceiptId) -> Option<&Receipt> {
        self.receipts.iter().find(|r| r.id == id)
    }

    pub fn receipt_for_move(&self, move_id: MoveId) -> Option<&Receipt> {
        self.receipts.iter().find(|r| r.move_id == move_id)
    }

    /// Receipts that can still supply quantity, in consumption order.
    pub fn candidates(&self) -> impl Iterator<Item = &Receipt> + '_ {
        self.receipts.iter().filter(|r| !r.is_exhausted())
    }

    /// Quantity already taken from the ledger by `move_id`.
    pub fn consumed_by(&self, move_id: MoveId) -> Decimal {
        self.consumed_by_move.get(&move_id).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn on_hand_quantity(&self) -> Decimal {
        self.receipts.iter().map(|r| r.remaining_qty).sum()
    }

    pub fn on_hand_value(&self) -> Decimal {
        self.receipts.iter().map(|r| r.remaining_value).sum()
    }
}

impl AggregateRoot for ReceiptLedger {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.product_id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RecordReceipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordReceipt {
    pub receipt_id: ReceiptId,
    pub move_id: MoveId,
    /// Quantity in the product stock unit.
    pub quantity: Decimal,
    pub price_unit: Decimal,
    pub received_at: DateTime<Utc>,
}

/// Command: ConsumeFifo.
///
/// Take up to `quantity` from the oldest receipts for delivery `move_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeFifo {
    pub move_id: MoveId,
    pub quantity: Decimal,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    RecordReceipt(RecordReceipt),
    ConsumeFifo(ConsumeFifo),
}

/// Event: ReceiptRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptRecorded {
    pub product_id: ProductId,
    pub receipt_id: ReceiptId,
    pub move_id: MoveId,
    pub quantity: Decimal,
    pub price_unit: Decimal,
    pub value: Decimal,
    pub received_at: DateTime<Utc>,
    pub sequence: u64,
}

/// Event: ReceiptConsumed.
///
/// `price_unit` is the receipt's unit price (not the value per unit taken).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptConsumed {
    pub product_id: ProductId,
    pub receipt_id: ReceiptId,
    pub move_id: MoveId,
    pub quantity: Decimal,
    pub value: Decimal,
    pub price_unit: Decimal,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    ReceiptRecorded(ReceiptRecorded),
    ReceiptConsumed(ReceiptConsumed),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::ReceiptRecorded(_) => "valuation.receipt.recorded",
            LedgerEvent::ReceiptConsumed(_) => "valuation.receipt.consumed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::ReceiptRecorded(e) => e.received_at,
            LedgerEvent::ReceiptConsumed(e) => e.occurred_at,
        }
    }
}

impl Aggregate for ReceiptLedger {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LedgerEvent::ReceiptRecorded(e) => {
                let receipt = Receipt {
                    id: e.receipt_id,
                    product_id: e.product_id,
                    move_id: e.move_id,
                    price_unit: e.price_unit,
                    quantity: e.quantity,
                    remaining_qty: e.quantity,
                    remaining_value: e.value,
                    received_at: e.received_at,
                    sequence: e.sequence,
                };
                let key = receipt.fifo_key();
                let at = self.receipts.partition_point(|r| r.fifo_key() <= key);
                self.receipts.insert(at, receipt);
                self.next_sequence = self.next_sequence.max(e.sequence + 1);
            }
            LedgerEvent::ReceiptConsumed(e) => {
                if let Some(receipt) = self.receipts.iter_mut().find(|r| r.id == e.receipt_id) {
                    receipt.remaining_qty -= e.quantity;
                    receipt.remaining_value -= e.value;
                }
                *self.consumed_by_move.entry(e.move_id).or_insert(Decimal::ZERO) += e.quantity;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LedgerCommand::RecordReceipt(cmd) => self.handle_record(cmd),
            LedgerCommand::ConsumeFifo(cmd) => self.handle_consume(cmd),
        }
    }
}

impl ReceiptLedger {
    fn handle_record(&self, cmd: &RecordReceipt) -> Result<Vec<LedgerEvent>, DomainError> {
        if cmd.quantity <= Decimal::ZERO {
            return Err(DomainError::validation("received quantity must be positive"));
        }
        if cmd.price_unit < Decimal::ZERO {
            return Err(DomainError::validation("receipt unit price cannot be negative"));
        }
        if self.receipt_for_move(cmd.move_id).is_some() {
            return Err(DomainError::conflict(format!(
                "move {} already has a receipt",
                cmd.move_id
            )));
        }
        if self.receipt(cmd.receipt_id).is_some() {
            return Err(DomainError::conflict(format!(
                "receipt {} already exists",
                cmd.receipt_id
            )));
        }

        Ok(vec![LedgerEvent::ReceiptRecorded(ReceiptRecorded {
            product_id: self.product_id,
            receipt_id: cmd.receipt_id,
            move_id: cmd.move_id,
            quantity: cmd.quantity,
            price_unit: cmd.price_unit,
            value: cmd.quantity * cmd.price_unit,
            received_at: cmd.received_at,
            sequence: self.next_sequence,
        })])
    }

    /// Plan consumption oldest-first. Exhausted receipts yield nothing and are
    /// skipped; a receipt taken whole gives up its exact remaining value.
    fn handle_consume(&self, cmd: &ConsumeFifo) -> Result<Vec<LedgerEvent>, DomainError> {
        if cmd.quantity < Decimal::ZERO {
            return Err(DomainError::validation("quantity to value cannot be negative"));
        }

        let mut events = Vec::new();
        let mut qty_to_take = cmd.quantity;

        for candidate in self.candidates() {
            if qty_to_take <= Decimal::ZERO {
                break;
            }
            let Some(unit_value) = candidate.remaining_unit_value() else {
                continue;
            };

            let (taken, value) = if candidate.remaining_qty <= qty_to_take {
                (candidate.remaining_qty, candidate.remaining_value)
            } else {
                (qty_to_take, qty_to_take * unit_value)
            };

            events.push(LedgerEvent::ReceiptConsumed(ReceiptConsumed {
                product_id: self.product_id,
                receipt_id: candidate.id,
                move_id: cmd.move_id,
                quantity: taken,
                value,
                price_unit: candidate.price_unit,
                occurred_at: cmd.occurred_at,
            }));
            qty_to_take -= taken;
        }

        Ok(events)
    }
}

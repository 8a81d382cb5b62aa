//! FIFO valuation of stock moves against a receipt ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use stockledger_core::{Aggregate, DomainError, ReceiptId};
use stockledger_inventory::{Product, StockMove};

use crate::ledger::{ConsumeFifo, LedgerCommand, LedgerEvent, ReceiptConsumed, ReceiptLedger, RecordReceipt};
use crate::receipt::Receipt;

/// Inputs of one outgoing valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FifoRequest {
    /// Processed quantity leaving the valued locations, in the stock unit.
    pub valued_quantity: Decimal,
    /// Explicit quantity to value instead of `valued_quantity`.
    pub quantity: Option<Decimal>,
    /// Demand of the move in the stock unit, used to derive its unit price.
    pub move_quantity: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Outcome of an outgoing valuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FifoValuation {
    /// Magnitude of the value taken out of stock (never negative).
    pub value: Decimal,
    /// Receipt consumption, oldest first.
    pub consumed: Vec<ReceiptConsumed>,
    /// Quantity that no receipt could cover.
    pub shortfall: Decimal,
    /// Value assigned to the shortfall (zero or negative).
    pub negative_stock_value: Decimal,
    /// Unit price of the last receipt consumed.
    pub new_standard_price: Option<Decimal>,
}

impl FifoValuation {
    pub fn is_negative_stock(&self) -> bool {
        self.shortfall > Decimal::ZERO
    }

    pub fn consumed_value(&self) -> Decimal {
        self.consumed.iter().map(|c| c.value).sum()
    }
}

/// Values moves with the FIFO method.
#[derive(Debug, Default, Clone, Copy)]
pub struct FifoValuator;

impl FifoValuator {
    /// Value an incoming move: append a receipt of `quantity` at `price_unit`
    /// to the ledger and record the value on the move.
    pub fn value_incoming(
        &self,
        ledger: &mut ReceiptLedger,
        mv: &mut StockMove,
        quantity: Decimal,
        price_unit: Decimal,
        received_at: DateTime<Utc>,
    ) -> Result<Receipt, DomainError> {
        ensure_same_product(ledger, mv)?;

        let receipt_id = ReceiptId::new();
        let events = ledger.handle(&LedgerCommand::RecordReceipt(RecordReceipt {
            receipt_id,
            move_id: mv.id,
            quantity,
            price_unit,
            received_at,
        }))?;
        for event in &events {
            ledger.apply(event);
        }

        let receipt = ledger
            .receipt(receipt_id)
            .cloned()
            .ok_or_else(|| DomainError::invariant("recorded receipt missing from ledger"))?;

        mv.value = receipt.quantity * receipt.price_unit;
        mv.price_unit = receipt.price_unit;

        tracing::debug!(
            product_id = %ledger.product_id(),
            move_id = %mv.id,
            quantity = %receipt.quantity,
            price_unit = %receipt.price_unit,
            "receipt recorded"
        );
        Ok(receipt)
    }

    /// Value an outgoing move by consuming receipts oldest-first.
    ///
    /// Updates the receipts, the move's `value`/`price_unit` (negative for
    /// deliveries) and, for FIFO-costed products, the product reference cost.
    /// When receipts run out the remainder is valued at the last consumed
    /// receipt price (or the product's reference cost) and booked on the
    /// move's `remaining_qty`/`remaining_value` as negative stock.
    ///
    /// A move already valued can only be valued again for an explicit
    /// quantity.
    pub fn value_outgoing(
        &self,
        ledger: &mut ReceiptLedger,
        mv: &mut StockMove,
        product: &mut Product,
        request: FifoRequest,
    ) -> Result<FifoValuation, DomainError> {
        ensure_same_product(ledger, mv)?;
        if product.id != mv.product_id {
            return Err(DomainError::invariant("move and product disagree"));
        }
        if request.quantity.is_none() && (!mv.value.is_zero() || !ledger.consumed_by(mv.id).is_zero()) {
            return Err(DomainError::conflict(format!("move {} is already valued", mv.id)));
        }

        let qty_to_take = request.quantity.unwrap_or(request.valued_quantity);
        let events = ledger.handle(&LedgerCommand::ConsumeFifo(ConsumeFifo {
            move_id: mv.id,
            quantity: qty_to_take,
            occurred_at: request.occurred_at,
        }))?;
        for event in &events {
            ledger.apply(event);
        }

        let consumed: Vec<ReceiptConsumed> = events
            .into_iter()
            .filter_map(|e| match e {
                LedgerEvent::ReceiptConsumed(c) => Some(c),
                LedgerEvent::ReceiptRecorded(_) => None,
            })
            .collect();

        let mut tmp_value: Decimal = consumed.iter().map(|c| c.value).sum();
        let taken: Decimal = consumed.iter().map(|c| c.quantity).sum();
        let shortfall = qty_to_take - taken;
        let new_standard_price = consumed.last().map(|c| c.price_unit);

        if let Some(price) = new_standard_price {
            if product.is_fifo() {
                product.standard_price = price;
            }
        }

        let mut negative_stock_value = Decimal::ZERO;
        if shortfall.is_zero() {
            mv.value = match request.quantity {
                Some(_) if !mv.value.is_zero() => mv.value,
                _ => -tmp_value,
            };
            mv.price_unit = -tmp_value / price_divisor(request);
        } else {
            let last_fifo_price = new_standard_price.unwrap_or(product.standard_price);
            negative_stock_value = last_fifo_price * -shortfall;
            tmp_value += negative_stock_value.abs();

            mv.remaining_qty += -shortfall;
            mv.remaining_value += negative_stock_value;
            mv.value = -tmp_value;
            mv.price_unit = -last_fifo_price;

            tracing::warn!(
                product_id = %product.id,
                move_id = %mv.id,
                shortfall = %shortfall,
                price = %last_fifo_price,
                "receipts exhausted; move valued into negative stock"
            );
        }

        tracing::debug!(
            product_id = %product.id,
            move_id = %mv.id,
            quantity = %qty_to_take,
            value = %tmp_value,
            receipts = consumed.len(),
            "outgoing move valued"
        );

        Ok(FifoValuation {
            value: tmp_value,
            consumed,
            shortfall,
            negative_stock_value,
            new_standard_price,
        })
    }
}

fn ensure_same_product(ledger: &ReceiptLedger, mv: &StockMove) -> Result<(), DomainError> {
    if ledger.product_id() != mv.product_id {
        return Err(DomainError::invariant(format!(
            "move {} does not belong to ledger of product {}",
            mv.id,
            ledger.product_id()
        )));
    }
    Ok(())
}

/// Move demand, or one when the move asks for nothing.
fn price_divisor(request: FifoRequest) -> Decimal {
    if request.move_quantity.is_zero() {
        Decimal::ONE
    } else {
        request.move_quantity
    }
}

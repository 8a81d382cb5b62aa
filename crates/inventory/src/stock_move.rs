//! Stock moves, their lines, and purchase-unit handling on receptions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, Entity, LocationId, MoveId, MoveLineId, PartyId, ProductId, UomId};
use stockledger_uom::{RoundingMethod, UnitContext, compare};

use crate::error::InventoryError;
use crate::product::Product;

/// Move lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveState {
    Draft,
    Waiting,
    Confirmed,
    PartiallyAvailable,
    Assigned,
    Done,
    Cancel,
}

/// Operation type of the picking a move belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickingCode {
    Incoming,
    Outgoing,
    Internal,
}

/// Direction of a valued flow across the company's valuation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuationFlow {
    /// From a non-valued location into a valued one (receipts).
    In,
    /// From a valued location out to a non-valued one (deliveries).
    Out,
}

/// Detailed operation of a move (what was reserved and what was done).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLine {
    pub id: MoveLineId,
    pub product_id: ProductId,
    pub product_uom_id: UomId,
    /// Reserved quantity in `product_uom_id`.
    #[serde(default)]
    pub product_uom_qty: Decimal,
    /// Reserved quantity in the product stock unit.
    #[serde(default)]
    pub product_qty: Decimal,
    /// Processed quantity in `product_uom_id`.
    #[serde(default)]
    pub qty_done: Decimal,
    pub location_id: LocationId,
    pub location_dest_id: LocationId,
    #[serde(default)]
    pub owner_id: Option<PartyId>,
}

/// Values for creating a move line from a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveLineVals {
    pub move_id: MoveId,
    pub product_id: ProductId,
    pub product_uom_id: UomId,
    pub product_uom_qty: Decimal,
    pub location_id: LocationId,
    pub location_dest_id: LocationId,
}

/// A stock move of one product between two locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMove {
    pub id: MoveId,
    pub product_id: ProductId,
    /// Unit the demand is expressed in.
    pub product_uom: UomId,
    /// Initial demand in `product_uom`.
    pub product_uom_qty: Decimal,
    pub location_id: LocationId,
    pub location_dest_id: LocationId,
    #[serde(default)]
    pub picking_code: Option<PickingCode>,
    pub state: MoveState,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub lines: Vec<MoveLine>,
    /// Valuation of the move (negative for outgoing moves).
    #[serde(default)]
    pub value: Decimal,
    #[serde(default)]
    pub price_unit: Decimal,
    /// Negative-stock position of a delivery valued past the available
    /// receipts (zero otherwise).
    #[serde(default)]
    pub remaining_qty: Decimal,
    #[serde(default)]
    pub remaining_value: Decimal,
}

impl StockMove {
    /// Draft move of `quantity` stock units of `product`.
    pub fn new(
        id: MoveId,
        product: &Product,
        quantity: Decimal,
        location_id: LocationId,
        location_dest_id: LocationId,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            product_id: product.id,
            product_uom: product.uom_id,
            product_uom_qty: quantity,
            location_id,
            location_dest_id,
            picking_code: None,
            state: MoveState::Draft,
            date,
            lines: Vec::new(),
            value: Decimal::ZERO,
            price_unit: Decimal::ZERO,
            remaining_qty: Decimal::ZERO,
            remaining_value: Decimal::ZERO,
        }
    }

    pub fn with_picking_code(mut self, code: PickingCode) -> Self {
        self.picking_code = Some(code);
        self
    }

    pub fn with_uom(mut self, uom: UomId) -> Self {
        self.product_uom = uom;
        self
    }

    pub fn with_state(mut self, state: MoveState) -> Self {
        self.state = state;
        self
    }

    /// Attach a line that processed `qty_done` (in `uom`) between the move's locations.
    pub fn with_done_line(mut self, uom: UomId, qty_done: Decimal) -> Self {
        let line = self.done_line(uom, qty_done);
        self.lines.push(line);
        self
    }

    fn done_line(&self, uom: UomId, qty_done: Decimal) -> MoveLine {
        MoveLine {
            id: MoveLineId::new(),
            product_id: self.product_id,
            product_uom_id: uom,
            product_uom_qty: Decimal::ZERO,
            product_qty: Decimal::ZERO,
            qty_done,
            location_id: self.location_id,
            location_dest_id: self.location_dest_id,
            owner_id: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == MoveState::Done
    }

    pub fn is_incoming(&self) -> bool {
        self.picking_code == Some(PickingCode::Incoming)
    }

    /// Demand expressed in the product stock unit.
    pub fn product_qty(&self, product: &Product, units: &UnitContext<'_>) -> Result<Decimal, InventoryError> {
        Ok(units.convert(
            self.product_uom_qty,
            self.product_uom,
            product.uom_id,
            Some(RoundingMethod::HalfUp),
        )?)
    }

    /// Unit shown to the user: the purchase unit on receptions, the stock unit otherwise.
    pub fn purchase_uom(&self, product: &Product) -> UomId {
        if self.is_incoming() {
            product.uom_po_id
        } else {
            product.uom_id
        }
    }

    /// Demand expressed in the purchase unit (receptions only).
    pub fn product_uom_po_qty(&self, product: &Product, units: &UnitContext<'_>) -> Result<Decimal, InventoryError> {
        if !self.is_incoming() {
            return Ok(self.product_uom_qty);
        }
        Ok(units.convert(
            self.product_uom_qty,
            self.product_uom,
            product.uom_po_id,
            Some(RoundingMethod::HalfUp),
        )?)
    }

    /// Set the demand from a quantity in the purchase unit. Zero is ignored.
    pub fn set_product_uom_po_qty(
        &mut self,
        po_qty: Decimal,
        product: &Product,
        units: &UnitContext<'_>,
    ) -> Result<(), InventoryError> {
        if po_qty.is_zero() {
            return Ok(());
        }
        self.product_uom_qty = units.convert(
            po_qty,
            self.purchase_uom(product),
            self.product_uom,
            Some(RoundingMethod::HalfUp),
        )?;
        Ok(())
    }

    /// Build the values of a new line for `quantity` stock units.
    ///
    /// The line is expressed in the purchase unit on receptions and in the
    /// move unit otherwise, provided the converted quantity maps back to the
    /// same stock quantity at `precision_digits`. When it does not, the line
    /// keeps `quantity` in the stock unit.
    pub fn prepare_move_line_vals(
        &self,
        product: &Product,
        units: &UnitContext<'_>,
        quantity: Option<Decimal>,
        precision_digits: u32,
    ) -> Result<MoveLineVals, InventoryError> {
        let target = if self.is_incoming() {
            self.purchase_uom(product)
        } else {
            self.product_uom
        };
        let mut vals = MoveLineVals {
            move_id: self.id,
            product_id: self.product_id,
            product_uom_id: target,
            product_uom_qty: Decimal::ZERO,
            location_id: self.location_id,
            location_dest_id: self.location_dest_id,
        };

        let Some(quantity) = quantity.filter(|q| !q.is_zero()) else {
            return Ok(vals);
        };

        let converted = units.convert(quantity, product.uom_id, target, Some(RoundingMethod::HalfUp))?;
        let back = units.convert(converted, target, product.uom_id, Some(RoundingMethod::HalfUp))?;
        if compare(quantity, back, precision_digits).is_eq() {
            vals.product_uom_qty = converted;
        } else {
            vals.product_uom_id = product.uom_id;
            vals.product_uom_qty = quantity;
        }
        Ok(vals)
    }

    /// Sum of the lines' done quantities in the move unit (unrounded).
    pub fn quantity_done(&self, units: &UnitContext<'_>) -> Result<Decimal, InventoryError> {
        self.sum_done_in(self.product_uom, units)
    }

    /// Sum of the lines' done quantities in the purchase unit (unrounded).
    pub fn po_qty_done(&self, product: &Product, units: &UnitContext<'_>) -> Result<Decimal, InventoryError> {
        self.sum_done_in(self.purchase_uom(product), units)
    }

    fn sum_done_in(&self, target: UomId, units: &UnitContext<'_>) -> Result<Decimal, InventoryError> {
        let mut total = Decimal::ZERO;
        for line in &self.lines {
            total += units.convert(line.qty_done, line.product_uom_id, target, None)?;
        }
        Ok(total)
    }

    /// Record `po_qty` (purchase unit) as the processed quantity of the move.
    ///
    /// Creates a line when there is none; fails when the move has several
    /// lines, which must then be edited individually.
    pub fn set_po_qty_done(
        &mut self,
        po_qty: Decimal,
        product: &Product,
        units: &UnitContext<'_>,
    ) -> Result<(), InventoryError> {
        let quantity_done = units.convert(po_qty, self.purchase_uom(product), self.product_uom, None)?;
        match self.lines.len() {
            0 => {
                if !quantity_done.is_zero() {
                    let line = self.done_line(self.product_uom, quantity_done);
                    self.lines.push(line);
                }
                Ok(())
            }
            1 => {
                let line = &mut self.lines[0];
                line.qty_done = units.convert(quantity_done, self.product_uom, line.product_uom_id, None)?;
                Ok(())
            }
            _ => Err(DomainError::validation(
                "cannot set the done quantity of a move with several lines; edit the lines instead",
            )
            .into()),
        }
    }

    /// Processed quantity crossing the valuation boundary in `flow`, in the
    /// product stock unit. Lines carrying an owner are consigned stock and are
    /// never valued.
    pub fn valued_quantity<F>(
        &self,
        product: &Product,
        units: &UnitContext<'_>,
        flow: ValuationFlow,
        should_be_valued: F,
    ) -> Result<Decimal, InventoryError>
    where
        F: Fn(LocationId) -> bool,
    {
        let mut total = Decimal::ZERO;
        for line in &self.lines {
            if line.owner_id.is_some() {
                continue;
            }
            let src = should_be_valued(line.location_id);
            let dest = should_be_valued(line.location_dest_id);
            let crosses = match flow {
                ValuationFlow::Out => src && !dest,
                ValuationFlow::In => !src && dest,
            };
            if crosses {
                total += units.convert(line.qty_done, line.product_uom_id, product.uom_id, None)?;
            }
        }
        Ok(total)
    }
}

impl Entity for StockMove {
    type Id = MoveId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

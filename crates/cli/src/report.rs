//! Run a snapshot's valuations and summarize the resulting stock.

use std::sync::Arc;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Serialize;

use stockledger_core::{MoveId, ProductId};
use stockledger_infra::fixtures::{Snapshot, ValuationStep};
use stockledger_infra::projections::{StockByLocationProjection, StockByLocationTable};
use stockledger_infra::queries::{ProductView, product_view};
use stockledger_infra::{LedgerRegistry, StockConfig, ValuationService};
use stockledger_inventory::MoveLineVals;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Receipt,
    Delivery,
}

/// Value booked by one valuation step (positive in both directions).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub move_id: MoveId,
    pub kind: StepKind,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub product_id: ProductId,
    pub receipts: usize,
    pub on_hand_quantity: Decimal,
    pub on_hand_value: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub valuations: Vec<StepOutcome>,
    pub ledgers: Vec<LedgerSummary>,
    pub stock: StockByLocationTable,
    pub products: Vec<ProductView>,
    /// Line values proposed for receptions that are not done yet.
    pub line_proposals: Vec<MoveLineVals>,
}

pub fn run(snapshot: &Snapshot, config: &StockConfig) -> Result<Report> {
    let store = Arc::new(snapshot.to_store().context("seeding stores")?);
    let service = ValuationService::new(store.clone(), Arc::new(LedgerRegistry::new()));

    let mut valuations = Vec::with_capacity(snapshot.valuations.len());
    for step in &snapshot.valuations {
        let outcome = match step {
            ValuationStep::Receipt { move_id, price_unit } => {
                let receipt = service.record_incoming_move(&[*move_id], *price_unit)?;
                StepOutcome {
                    move_id: *move_id,
                    kind: StepKind::Receipt,
                    value: receipt.quantity * receipt.price_unit,
                }
            }
            ValuationStep::Delivery { move_id, quantity } => StepOutcome {
                move_id: *move_id,
                kind: StepKind::Delivery,
                value: service.value_outgoing_move(&[*move_id], *quantity)?,
            },
        };
        valuations.push(outcome);
    }

    let mut product_ids: Vec<ProductId> = snapshot.products.iter().map(|p| p.id).collect();
    product_ids.sort();

    let mut ledgers = Vec::new();
    let mut products = Vec::with_capacity(product_ids.len());
    for product_id in &product_ids {
        if let Some(ledger) = service.ledgers().snapshot(*product_id)? {
            ledgers.push(LedgerSummary {
                product_id: *product_id,
                receipts: ledger.receipts().len(),
                on_hand_quantity: ledger.on_hand_quantity(),
                on_hand_value: ledger.on_hand_value(),
            });
        }
        products.push(product_view(&store, *product_id)?);
    }

    let table = StockByLocationProjection::new(store.clone()).recalculate()?;
    let line_proposals = line_proposals(snapshot, &store, config.uom_precision_digits)?;

    tracing::info!(
        steps = valuations.len(),
        rows = table.len(),
        "snapshot processed"
    );

    Ok(Report {
        valuations,
        ledgers,
        stock: (*table).clone(),
        products,
        line_proposals,
    })
}

fn line_proposals(
    snapshot: &Snapshot,
    store: &stockledger_infra::store::InventoryStore,
    precision_digits: u32,
) -> Result<Vec<MoveLineVals>> {
    let units = store.units();
    let mut proposals = Vec::new();
    for mv in snapshot.moves.iter().filter(|m| m.is_incoming() && !m.is_done()) {
        let product = snapshot
            .products
            .iter()
            .find(|p| p.id == mv.product_id)
            .with_context(|| format!("move {} references an unknown product", mv.id))?;
        let quantity = mv.product_qty(product, &units)?;
        proposals.push(mv.prepare_move_line_vals(product, &units, Some(quantity), precision_digits)?);
    }
    Ok(proposals)
}

//! Product and quant read queries.

use rust_decimal::Decimal;
use serde::Serialize;

use stockledger_core::{LocationId, ProductId, QuantId};
use stockledger_inventory::Quant;

use crate::store::{InventoryStore, StoreError};

/// One quant with its derived quantities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuantView {
    pub quant_id: QuantId,
    pub location_id: LocationId,
    pub quantity: Decimal,
    pub reserved_quantity: Decimal,
    pub unreserved_on_hand: Decimal,
    pub forecasted_qty: Decimal,
}

/// A product's internal quants and their totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductView {
    pub product_id: ProductId,
    pub quants: Vec<QuantView>,
    pub on_hand: Decimal,
    pub unreserved_on_hand: Decimal,
    pub forecasted: Decimal,
}

/// Stock of `product_id` held in internal locations.
pub fn product_view(store: &InventoryStore, product_id: ProductId) -> Result<ProductView, StoreError> {
    let internal: Vec<LocationId> = store.internal_locations()?.into_iter().map(|l| l.id).collect();
    let moves = store.moves.list()?;

    let mut quants: Vec<Quant> = store
        .quants
        .list()?
        .into_iter()
        .filter(|q| q.product_id == product_id && internal.contains(&q.location_id))
        .collect();
    quants.sort_by_key(|q| (q.location_id, q.id));

    let quants: Vec<QuantView> = quants
        .iter()
        .map(|q| QuantView {
            quant_id: q.id,
            location_id: q.location_id,
            quantity: q.quantity,
            reserved_quantity: q.reserved_quantity,
            unreserved_on_hand: q.unreserved_on_hand(),
            forecasted_qty: q.forecasted_qty(&moves),
        })
        .collect();

    Ok(ProductView {
        product_id,
        on_hand: quants.iter().map(|q| q.quantity).sum(),
        unreserved_on_hand: quants.iter().map(|q| q.unreserved_on_hand).sum(),
        forecasted: quants.iter().map(|q| q.forecasted_qty).sum(),
        quants,
    })
}

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use serde::Serialize;
use thiserror::Error;

use stockledger_core::{LocationId, ProductId};
use stockledger_inventory::{InventoryError, Product, QuantityUpdate, StockByLocationRow, UpdateMode};

use crate::store::{InventoryStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockProjectionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Inventory(#[from] InventoryError),

    #[error("move references unknown product {0}")]
    UnknownProduct(ProductId),
}

/// Published stock-by-location table. Immutable once published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockByLocationTable {
    version: u64,
    #[serde(serialize_with = "serialize_rows")]
    rows: BTreeMap<(ProductId, LocationId), StockByLocationRow>,
}

impl StockByLocationTable {
    /// Incremented on every publish; the empty initial table is version 0.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, product_id: ProductId, location_id: LocationId) -> Option<&StockByLocationRow> {
        self.rows.get(&(product_id, location_id))
    }

    /// Rows ordered by product then location.
    pub fn rows(&self) -> impl Iterator<Item = &StockByLocationRow> {
        self.rows.values()
    }

    pub fn for_product(&self, product_id: ProductId) -> impl Iterator<Item = &StockByLocationRow> {
        self.rows
            .iter()
            .filter(move |((p, _), _)| *p == product_id)
            .map(|(_, row)| row)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Same rows, ignoring the publish version.
    pub fn same_rows(&self, other: &StockByLocationTable) -> bool {
        self.rows == other.rows
    }
}

fn serialize_rows<S>(rows: &BTreeMap<(ProductId, LocationId), StockByLocationRow>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(rows.values())
}

/// Stock per (product, internal location), rebuilt from moves and quants.
///
/// Rebuilds run into a fresh table that replaces the published one in a
/// single swap; readers keep whichever table they already hold.
pub struct StockByLocationProjection {
    store: Arc<InventoryStore>,
    current: RwLock<Arc<StockByLocationTable>>,
    rebuild_guard: Mutex<()>,
}

impl StockByLocationProjection {
    pub fn new(store: Arc<InventoryStore>) -> Self {
        Self {
            store,
            current: RwLock::new(Arc::new(StockByLocationTable::default())),
            rebuild_guard: Mutex::new(()),
        }
    }

    /// The currently published table.
    pub fn snapshot(&self) -> Result<Arc<StockByLocationTable>, StockProjectionError> {
        let current = self
            .current
            .read()
            .map_err(|_| StoreError::Poisoned("stock by location table"))?;
        Ok(current.clone())
    }

    /// Rebuild the table from scratch and publish it.
    ///
    /// For each internal location: pending moves arriving there add their
    /// demand (in the product stock unit) to `incoming_qty`; quants there add
    /// to `on_hand_qty` and `reserved_qty`.
    pub fn recalculate(&self) -> Result<Arc<StockByLocationTable>, StockProjectionError> {
        let _rebuild = self
            .rebuild_guard
            .lock()
            .map_err(|_| StoreError::Poisoned("stock by location rebuild"))?;

        let units = self.store.units();
        let products: HashMap<ProductId, Product> = self
            .store
            .products
            .list()?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
        let moves = self.store.moves.list()?;
        let quants = self.store.quants.list()?;
        let locations = self.store.internal_locations()?;

        let mut rows: BTreeMap<(ProductId, LocationId), StockByLocationRow> = BTreeMap::new();
        for location in &locations {
            for mv in moves.iter().filter(|m| !m.is_done() && m.location_dest_id == location.id) {
                let product = products
                    .get(&mv.product_id)
                    .ok_or(StockProjectionError::UnknownProduct(mv.product_id))?;
                let incoming = mv.product_qty(product, &units)?;
                rows.entry((mv.product_id, location.id))
                    .or_insert_with(|| StockByLocationRow::new(mv.product_id, location.id))
                    .update_quantities(QuantityUpdate::incoming(incoming), UpdateMode::Accumulate);
            }

            for quant in quants.iter().filter(|q| q.location_id == location.id) {
                rows.entry((quant.product_id, location.id))
                    .or_insert_with(|| StockByLocationRow::new(quant.product_id, location.id))
                    .update_quantities(
                        QuantityUpdate::on_hand(quant.quantity, quant.reserved_quantity),
                        UpdateMode::Accumulate,
                    );
            }
        }

        let mut current = self
            .current
            .write()
            .map_err(|_| StoreError::Poisoned("stock by location table"))?;
        let table = Arc::new(StockByLocationTable {
            version: current.version + 1,
            rows,
        });
        *current = table.clone();

        tracing::info!(
            version = table.version,
            rows = table.len(),
            locations = locations.len(),
            "stock by location table rebuilt"
        );
        Ok(table)
    }
}

impl std::fmt::Debug for StockByLocationProjection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockByLocationProjection").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use stockledger_core::{MoveId, QuantId, UomId};
    use stockledger_inventory::{CostMethod, Location, LocationUsage, MoveState, Quant, StockMove};
    use stockledger_uom::{UnitOfMeasure, UomCatalog};

    struct Setup {
        store: Arc<InventoryStore>,
        product: Product,
        dozen: UomId,
        stock: LocationId,
        vendor: LocationId,
    }

    fn setup() -> Setup {
        let unit = UnitOfMeasure::reference(UomId::new(), "Unit", "Unit", dec!(1));
        let dozen = UnitOfMeasure::bigger(UomId::new(), "Dozen", "Unit", dec!(12), dec!(1)).unwrap();
        let (unit_id, dozen_id) = (unit.id, dozen.id);
        let store = Arc::new(InventoryStore::in_memory(UomCatalog::new().with(unit).with(dozen)));

        let stock = Location::new(LocationId::new(), "WH/Stock", LocationUsage::Internal);
        let vendor = Location::new(LocationId::new(), "Vendors", LocationUsage::Supplier);
        store.locations.upsert(stock.id, stock.clone()).unwrap();
        store.locations.upsert(vendor.id, vendor.clone()).unwrap();

        let product = Product::new(ProductId::new(), "Eggs", unit_id, CostMethod::Fifo);
        store.products.upsert(product.id, product.clone()).unwrap();

        Setup {
            store,
            product,
            dozen: dozen_id,
            stock: stock.id,
            vendor: vendor.id,
        }
    }

    fn add_move(s: &Setup, to: LocationId, qty: rust_decimal::Decimal, state: MoveState) {
        let mv = StockMove::new(MoveId::new(), &s.product, qty, s.vendor, to, Utc::now())
            .with_uom(s.dozen)
            .with_state(state);
        s.store.moves.upsert(mv.id, mv).unwrap();
    }

    fn add_quant(s: &Setup, qty: rust_decimal::Decimal, reserved: rust_decimal::Decimal) {
        let quant = Quant::new(QuantId::new(), s.product.id, s.stock, qty).with_reserved(reserved);
        s.store.quants.upsert(quant.id, quant).unwrap();
    }

    #[test]
    fn rebuild_sums_pending_moves_and_quants() {
        let s = setup();
        add_move(&s, s.stock, dec!(2), MoveState::Assigned);
        add_move(&s, s.stock, dec!(1), MoveState::Cancel);
        add_move(&s, s.stock, dec!(5), MoveState::Done);
        add_move(&s, s.vendor, dec!(9), MoveState::Draft);
        add_quant(&s, dec!(10), dec!(4));
        add_quant(&s, dec!(6), dec!(0));

        let projection = StockByLocationProjection::new(s.store.clone());
        let table = projection.recalculate().unwrap();

        assert_eq!(table.len(), 1);
        let row = table.get(s.product.id, s.stock).unwrap();
        // Two pending dozen-moves: (2 + 1) * 12 units.
        assert_eq!(row.incoming_qty(), dec!(36));
        assert_eq!(row.on_hand_qty(), dec!(16));
        assert_eq!(row.reserved_qty(), dec!(4));
        assert_eq!(row.forecasted_qty(), dec!(48));
        assert_eq!(row.unreserved_qty_on_hand(), dec!(12));
    }

    #[test]
    fn rebuild_is_idempotent_and_bumps_version() {
        let s = setup();
        add_move(&s, s.stock, dec!(1), MoveState::Confirmed);
        add_quant(&s, dec!(3), dec!(1));

        let projection = StockByLocationProjection::new(s.store.clone());
        assert_eq!(projection.snapshot().unwrap().version(), 0);

        let first = projection.recalculate().unwrap();
        let second = projection.recalculate().unwrap();
        assert!(first.same_rows(&second));
        assert_eq!(first.version(), 1);
        assert_eq!(second.version(), 2);
        assert_eq!(projection.snapshot().unwrap().version(), 2);
    }

    #[test]
    fn readers_keep_their_table_across_rebuilds() {
        let s = setup();
        add_quant(&s, dec!(3), dec!(0));
        let projection = StockByLocationProjection::new(s.store.clone());
        let held = projection.recalculate().unwrap();

        s.store.quants.clear().unwrap();
        let rebuilt = projection.recalculate().unwrap();

        assert_eq!(held.len(), 1);
        assert!(rebuilt.is_empty());
    }

    #[test]
    fn move_of_unknown_product_fails_the_rebuild() {
        let s = setup();
        let ghost = Product::new(ProductId::new(), "Ghost", s.product.uom_id, CostMethod::Fifo);
        let mv = StockMove::new(MoveId::new(), &ghost, dec!(1), s.vendor, s.stock, Utc::now());
        s.store.moves.upsert(mv.id, mv).unwrap();

        let projection = StockByLocationProjection::new(s.store.clone());
        let err = projection.recalculate().unwrap_err();
        assert_eq!(err, StockProjectionError::UnknownProduct(ghost.id));
        assert_eq!(projection.snapshot().unwrap().version(), 0);
    }

    #[test]
    fn rows_serialize_as_a_list() {
        let s = setup();
        add_quant(&s, dec!(2), dec!(0));
        let projection = StockByLocationProjection::new(s.store.clone());
        let table = projection.recalculate().unwrap();

        let json = serde_json::to_value(&*table).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["rows"].as_array().unwrap().len(), 1);
        assert_eq!(table.for_product(s.product.id).count(), 1);
    }
}

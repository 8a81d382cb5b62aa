//! Stock valuation service: resolves moves and products from the stores and
//! runs FIFO valuation under the product's ledger lock.

use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use stockledger_core::{DomainError, MoveId, ProductId};
use stockledger_inventory::{InventoryError, Product, StockMove, ValuationFlow};
use stockledger_uom::UomError;
use stockledger_valuation::{FifoRequest, FifoValuator, Receipt};

use crate::ledger_registry::LedgerRegistry;
use crate::store::{InventoryStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValuationError {
    /// Valuation runs on exactly one move at a time.
    #[error("expected exactly one move, got {count}")]
    MultipleMoves { count: usize },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Uom(#[from] UomError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{0} not found")]
    NotFound(String),
}

impl From<InventoryError> for ValuationError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::Uom(e) => ValuationError::Uom(e),
            InventoryError::Domain(e) => ValuationError::Domain(e),
        }
    }
}

pub struct ValuationService {
    store: Arc<InventoryStore>,
    ledgers: Arc<LedgerRegistry>,
    valuator: FifoValuator,
}

impl ValuationService {
    pub fn new(store: Arc<InventoryStore>, ledgers: Arc<LedgerRegistry>) -> Self {
        Self {
            store,
            ledgers,
            valuator: FifoValuator,
        }
    }

    pub fn store(&self) -> &InventoryStore {
        &self.store
    }

    pub fn ledgers(&self) -> &LedgerRegistry {
        &self.ledgers
    }

    /// Value the receipt `moves` (exactly one) at `price_unit` per stock unit
    /// and append it to the product's receipt ledger.
    pub fn record_incoming_move(&self, moves: &[MoveId], price_unit: Decimal) -> Result<Receipt, ValuationError> {
        let product_id = self.single_move(moves)?.product_id;
        let shared = self.ledgers.ledger(product_id)?;
        let mut ledger = shared.lock().map_err(|_| StoreError::Poisoned("receipt ledger"))?;

        let mut mv = self.single_move(moves)?;
        let product = self.product(product_id)?;
        let quantity = self.valued_quantity(&mv, &product, ValuationFlow::In)?;
        let received_at = mv.date;
        // Work on a copy; the shared ledger only changes once the move is stored.
        let mut working = ledger.clone();
        let receipt = self
            .valuator
            .value_incoming(&mut working, &mut mv, quantity, price_unit, received_at)?;
        self.store.moves.upsert(mv.id, mv)?;
        *ledger = working;

        tracing::info!(
            product_id = %product.id,
            receipt_id = %receipt.id,
            quantity = %receipt.quantity,
            "incoming move valued"
        );
        Ok(receipt)
    }

    /// Value the outgoing `moves` (exactly one) with FIFO and return the
    /// magnitude of the value taken out of stock.
    ///
    /// `quantity` overrides the processed quantity of the move.
    pub fn value_outgoing_move(&self, moves: &[MoveId], quantity: Option<Decimal>) -> Result<Decimal, ValuationError> {
        let product_id = self.single_move(moves)?.product_id;
        let shared = self.ledgers.ledger(product_id)?;
        let mut ledger = shared.lock().map_err(|_| StoreError::Poisoned("receipt ledger"))?;

        // Re-read under the lock so concurrent valuations see each other's writes.
        let mut mv = self.single_move(moves)?;
        let mut product = self.product(product_id)?;
        let valued_quantity = self.valued_quantity(&mv, &product, ValuationFlow::Out)?;
        let move_quantity = mv.product_qty(&product, &self.store.units())?;

        let request = FifoRequest {
            valued_quantity,
            quantity,
            move_quantity,
            occurred_at: mv.date,
        };
        // Work on copies; the shared ledger only changes once both writes land.
        let mut working = ledger.clone();
        let unvalued = mv.clone();
        let valuation = self.valuator.value_outgoing(&mut working, &mut mv, &mut product, request)?;

        self.store.moves.upsert(mv.id, mv)?;
        if let Err(err) = self.store.products.upsert(product.id, product) {
            if let Err(restore) = self.store.moves.upsert(unvalued.id, unvalued) {
                tracing::error!(move_id = %moves[0], error = %restore, "failed to restore unvalued move");
            }
            return Err(err.into());
        }
        *ledger = working;

        tracing::info!(
            move_id = %moves[0],
            value = %valuation.value,
            negative_stock = valuation.is_negative_stock(),
            "outgoing move valued"
        );
        Ok(valuation.value)
    }

    fn single_move(&self, moves: &[MoveId]) -> Result<StockMove, ValuationError> {
        let [move_id] = moves else {
            return Err(ValuationError::MultipleMoves { count: moves.len() });
        };
        self.store
            .moves
            .get(move_id)?
            .ok_or_else(|| ValuationError::NotFound(format!("move {move_id}")))
    }

    fn product(&self, product_id: ProductId) -> Result<Product, ValuationError> {
        self.store
            .products
            .get(&product_id)?
            .ok_or_else(|| ValuationError::NotFound(format!("product {product_id}")))
    }

    fn valued_quantity(&self, mv: &StockMove, product: &Product, flow: ValuationFlow) -> Result<Decimal, ValuationError> {
        let valued = self.store.valued_locations()?;
        Ok(mv.valued_quantity(product, &self.store.units(), flow, |l| valued.contains(&l))?)
    }
}

impl std::fmt::Debug for ValuationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValuationService")
            .field("ledgers", &self.ledgers.len().ok())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::Hash;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    use stockledger_core::{LocationId, UomId};
    use stockledger_inventory::{CostMethod, Location, LocationUsage, MoveState, PickingCode};
    use stockledger_uom::{UnitOfMeasure, UomCatalog};

    use crate::store::{InMemoryRecordStore, RecordStore};

    /// In-memory store whose writes fail while `fail_writes` is set.
    struct FlakyStore<K, V> {
        inner: InMemoryRecordStore<K, V>,
        fail_writes: AtomicBool,
    }

    impl<K, V> FlakyStore<K, V> {
        fn new() -> Self {
            Self {
                inner: InMemoryRecordStore::new(),
                fail_writes: AtomicBool::new(false),
            }
        }

        fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), StoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Poisoned("flaky"));
            }
            Ok(())
        }
    }

    impl<K, V> RecordStore<K, V> for FlakyStore<K, V>
    where
        K: Clone + Eq + Hash + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        fn get(&self, key: &K) -> Result<Option<V>, StoreError> {
            self.inner.get(key)
        }

        fn upsert(&self, key: K, value: V) -> Result<(), StoreError> {
            self.check()?;
            self.inner.upsert(key, value)
        }

        fn list(&self) -> Result<Vec<V>, StoreError> {
            self.inner.list()
        }

        fn remove(&self, key: &K) -> Result<Option<V>, StoreError> {
            self.check()?;
            self.inner.remove(key)
        }

        fn clear(&self) -> Result<(), StoreError> {
            self.check()?;
            self.inner.clear()
        }
    }

    struct Fixture {
        service: ValuationService,
        product: Product,
        unit: UomId,
        stock: LocationId,
        supplier: LocationId,
        customer: LocationId,
    }

    fn fixture(method: CostMethod) -> Fixture {
        fixture_on(method, InventoryStore::in_memory)
    }

    fn fixture_on(method: CostMethod, build: impl FnOnce(UomCatalog) -> InventoryStore) -> Fixture {
        let unit = UnitOfMeasure::reference(UomId::new(), "Unit", "Unit", dec!(0.01));
        let unit_id = unit.id;
        let store = build(UomCatalog::new().with(unit));

        let stock = Location::new(LocationId::new(), "WH/Stock", LocationUsage::Internal);
        let supplier = Location::new(LocationId::new(), "Vendors", LocationUsage::Supplier);
        let customer = Location::new(LocationId::new(), "Customers", LocationUsage::Customer);
        for l in [&stock, &supplier, &customer] {
            store.locations.upsert(l.id, l.clone()).unwrap();
        }

        let product = Product::new(ProductId::new(), "Widget", unit_id, method).with_standard_price(dec!(20));
        store.products.upsert(product.id, product.clone()).unwrap();

        Fixture {
            service: ValuationService::new(Arc::new(store), Arc::new(LedgerRegistry::new())),
            product,
            unit: unit_id,
            stock: stock.id,
            supplier: supplier.id,
            customer: customer.id,
        }
    }

    fn done_move(f: &Fixture, from: LocationId, to: LocationId, qty: Decimal, day: i64) -> MoveId {
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::days(day);
        let mv = StockMove::new(MoveId::new(), &f.product, qty, from, to, date)
            .with_state(MoveState::Done)
            .with_done_line(f.unit, qty);
        let id = mv.id;
        f.service.store().moves.upsert(id, mv).unwrap();
        id
    }

    #[test]
    fn receipts_then_delivery_are_valued_fifo() {
        let f = fixture(CostMethod::Fifo);
        let r1 = done_move(&f, f.supplier, f.stock, dec!(10), 0);
        let r2 = done_move(&f, f.supplier, f.stock, dec!(5), 1);
        f.service.record_incoming_move(&[r1], dec!(10)).unwrap();
        f.service.record_incoming_move(&[r2], dec!(12)).unwrap();

        let out = done_move(&f, f.stock, f.customer, dec!(12), 2);
        let value = f.service.value_outgoing_move(&[out], None).unwrap();
        assert_eq!(value, dec!(124));

        let stored = f.service.store().moves.get(&out).unwrap().unwrap();
        assert_eq!(stored.value, dec!(-124));
        let product = f.service.store().products.get(&f.product.id).unwrap().unwrap();
        assert_eq!(product.standard_price, dec!(12));

        let ledger = f.service.ledgers().snapshot(f.product.id).unwrap().unwrap();
        assert_eq!(ledger.on_hand_quantity(), dec!(3));
        assert_eq!(ledger.on_hand_value(), dec!(36));
    }

    #[test]
    fn delivery_without_receipts_goes_negative_at_reference_cost() {
        let f = fixture(CostMethod::Fifo);
        let out = done_move(&f, f.stock, f.customer, dec!(5), 0);
        let value = f.service.value_outgoing_move(&[out], None).unwrap();
        assert_eq!(value, dec!(100));

        let stored = f.service.store().moves.get(&out).unwrap().unwrap();
        assert_eq!(stored.remaining_qty, dec!(-5));
        assert_eq!(stored.remaining_value, dec!(-100));
        assert_eq!(stored.price_unit, dec!(-20));
    }

    #[test]
    fn selection_must_be_a_single_move() {
        let f = fixture(CostMethod::Fifo);
        let a = done_move(&f, f.stock, f.customer, dec!(1), 0);
        let b = done_move(&f, f.stock, f.customer, dec!(1), 0);

        assert_eq!(
            f.service.value_outgoing_move(&[a, b], None).unwrap_err(),
            ValuationError::MultipleMoves { count: 2 }
        );
        assert_eq!(
            f.service.value_outgoing_move(&[], None).unwrap_err(),
            ValuationError::MultipleMoves { count: 0 }
        );
    }

    #[test]
    fn internal_transfer_values_nothing() {
        let f = fixture(CostMethod::Fifo);
        let shelf = Location::new(LocationId::new(), "WH/Shelf", LocationUsage::Internal);
        f.service.store().locations.upsert(shelf.id, shelf.clone()).unwrap();

        let r = done_move(&f, f.supplier, f.stock, dec!(4), 0);
        f.service.record_incoming_move(&[r], dec!(5)).unwrap();

        let transfer = done_move(&f, f.stock, shelf.id, dec!(4), 1);
        let value = f.service.value_outgoing_move(&[transfer], None).unwrap();
        assert_eq!(value, Decimal::ZERO);
        let ledger = f.service.ledgers().snapshot(f.product.id).unwrap().unwrap();
        assert_eq!(ledger.on_hand_quantity(), dec!(4));
    }

    #[test]
    fn consigned_lines_are_not_valued() {
        let f = fixture(CostMethod::Fifo);
        let r = done_move(&f, f.supplier, f.stock, dec!(4), 0);
        f.service.record_incoming_move(&[r], dec!(5)).unwrap();

        let out = done_move(&f, f.stock, f.customer, dec!(2), 1);
        let mut mv = f.service.store().moves.get(&out).unwrap().unwrap();
        mv.lines[0].owner_id = Some(stockledger_core::PartyId::new());
        f.service.store().moves.upsert(out, mv).unwrap();

        assert_eq!(f.service.value_outgoing_move(&[out], None).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn recording_the_same_receipt_twice_conflicts() {
        let f = fixture(CostMethod::Fifo);
        let r = done_move(&f, f.supplier, f.stock, dec!(2), 0);
        f.service.record_incoming_move(&[r], dec!(3)).unwrap();
        let err = f.service.record_incoming_move(&[r], dec!(3)).unwrap_err();
        assert!(matches!(err, ValuationError::Domain(DomainError::Conflict(_))));
    }

    #[test]
    fn unknown_move_is_reported() {
        let f = fixture(CostMethod::Fifo);
        let err = f.service.value_outgoing_move(&[MoveId::new()], None).unwrap_err();
        assert!(matches!(err, ValuationError::NotFound(_)));
    }

    #[test]
    fn picking_code_does_not_change_outgoing_valuation() {
        let f = fixture(CostMethod::Standard);
        let r = done_move(&f, f.supplier, f.stock, dec!(3), 0);
        f.service.record_incoming_move(&[r], dec!(7)).unwrap();

        let out = done_move(&f, f.stock, f.customer, dec!(3), 1);
        let mut mv = f.service.store().moves.get(&out).unwrap().unwrap();
        mv.picking_code = Some(PickingCode::Outgoing);
        f.service.store().moves.upsert(out, mv).unwrap();

        assert_eq!(f.service.value_outgoing_move(&[out], None).unwrap(), dec!(21));
        let product = f.service.store().products.get(&f.product.id).unwrap().unwrap();
        assert_eq!(product.standard_price, dec!(20));
    }

    fn with_flaky_moves(moves: Arc<FlakyStore<MoveId, StockMove>>) -> impl FnOnce(UomCatalog) -> InventoryStore {
        move |units| {
            InventoryStore::new(
                Arc::new(InMemoryRecordStore::new()),
                Arc::new(InMemoryRecordStore::new()),
                moves,
                Arc::new(InMemoryRecordStore::new()),
                units,
            )
        }
    }

    #[test]
    fn failed_delivery_write_leaves_ledger_untouched() {
        let moves: Arc<FlakyStore<MoveId, StockMove>> = Arc::new(FlakyStore::new());
        let f = fixture_on(CostMethod::Fifo, with_flaky_moves(moves.clone()));
        let r = done_move(&f, f.supplier, f.stock, dec!(10), 0);
        f.service.record_incoming_move(&[r], dec!(10)).unwrap();
        let out = done_move(&f, f.stock, f.customer, dec!(4), 1);

        moves.fail_writes(true);
        let err = f.service.value_outgoing_move(&[out], None).unwrap_err();
        assert_eq!(err, ValuationError::Store(StoreError::Poisoned("flaky")));

        let ledger = f.service.ledgers().snapshot(f.product.id).unwrap().unwrap();
        assert_eq!(ledger.on_hand_quantity(), dec!(10));
        assert_eq!(ledger.consumed_by(out), Decimal::ZERO);
        assert_eq!(f.service.store().moves.get(&out).unwrap().unwrap().value, Decimal::ZERO);

        moves.fail_writes(false);
        assert_eq!(f.service.value_outgoing_move(&[out], None).unwrap(), dec!(40));
        let ledger = f.service.ledgers().snapshot(f.product.id).unwrap().unwrap();
        assert_eq!(ledger.on_hand_quantity(), dec!(6));
    }

    #[test]
    fn failed_receipt_write_records_no_receipt() {
        let moves: Arc<FlakyStore<MoveId, StockMove>> = Arc::new(FlakyStore::new());
        let f = fixture_on(CostMethod::Fifo, with_flaky_moves(moves.clone()));
        let r = done_move(&f, f.supplier, f.stock, dec!(10), 0);

        moves.fail_writes(true);
        assert!(matches!(
            f.service.record_incoming_move(&[r], dec!(10)),
            Err(ValuationError::Store(_))
        ));
        let ledger = f.service.ledgers().snapshot(f.product.id).unwrap().unwrap();
        assert!(ledger.receipts().is_empty());

        moves.fail_writes(false);
        let receipt = f.service.record_incoming_move(&[r], dec!(10)).unwrap();
        assert_eq!(receipt.quantity, dec!(10));
    }

    #[test]
    fn failed_product_write_restores_the_move() {
        let products: Arc<FlakyStore<ProductId, Product>> = Arc::new(FlakyStore::new());
        let shared = products.clone();
        let f = fixture_on(CostMethod::Fifo, move |units| {
            InventoryStore::new(
                shared,
                Arc::new(InMemoryRecordStore::new()),
                Arc::new(InMemoryRecordStore::new()),
                Arc::new(InMemoryRecordStore::new()),
                units,
            )
        });
        let r = done_move(&f, f.supplier, f.stock, dec!(10), 0);
        f.service.record_incoming_move(&[r], dec!(8)).unwrap();
        let out = done_move(&f, f.stock, f.customer, dec!(3), 1);

        products.fail_writes(true);
        assert!(f.service.value_outgoing_move(&[out], None).is_err());
        assert_eq!(f.service.store().moves.get(&out).unwrap().unwrap().value, Decimal::ZERO);
        let ledger = f.service.ledgers().snapshot(f.product.id).unwrap().unwrap();
        assert_eq!(ledger.on_hand_quantity(), dec!(10));

        products.fail_writes(false);
        assert_eq!(f.service.value_outgoing_move(&[out], None).unwrap(), dec!(24));
    }
}

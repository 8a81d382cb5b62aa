//! Owned per-product receipt ledgers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use stockledger_core::ProductId;
use stockledger_valuation::ReceiptLedger;

use crate::store::StoreError;

pub type SharedLedger = Arc<Mutex<ReceiptLedger>>;

/// One lock-guarded ledger per product.
///
/// Holding a ledger's lock serializes every valuation of that product;
/// other products proceed independently.
#[derive(Debug, Default)]
pub struct LedgerRegistry {
    ledgers: RwLock<HashMap<ProductId, SharedLedger>>,
}

impl LedgerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ledger of `product_id`, created empty on first use.
    pub fn ledger(&self, product_id: ProductId) -> Result<SharedLedger, StoreError> {
        if let Some(existing) = self
            .ledgers
            .read()
            .map_err(|_| StoreError::Poisoned("ledger registry"))?
            .get(&product_id)
        {
            return Ok(existing.clone());
        }

        let mut ledgers = self
            .ledgers
            .write()
            .map_err(|_| StoreError::Poisoned("ledger registry"))?;
        Ok(ledgers
            .entry(product_id)
            .or_insert_with(|| Arc::new(Mutex::new(ReceiptLedger::new(product_id))))
            .clone())
    }

    /// Copy of the current ledger state, if the product has one.
    pub fn snapshot(&self, product_id: ProductId) -> Result<Option<ReceiptLedger>, StoreError> {
        let shared = match self
            .ledgers
            .read()
            .map_err(|_| StoreError::Poisoned("ledger registry"))?
            .get(&product_id)
        {
            Some(shared) => shared.clone(),
            None => return Ok(None),
        };
        let ledger = shared.lock().map_err(|_| StoreError::Poisoned("receipt ledger"))?;
        Ok(Some(ledger.clone()))
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self
            .ledgers
            .read()
            .map_err(|_| StoreError::Poisoned("ledger registry"))?
            .len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

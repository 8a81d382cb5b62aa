use thiserror::Error;

use stockledger_core::DomainError;
use stockledger_uom::UomError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error(transparent)]
    Uom(#[from] UomError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

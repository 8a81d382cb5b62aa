use thiserror::Error;

use stockledger_core::UomId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UomError {
    #[error("cannot convert between units of different categories ({from} -> {to})")]
    IncompatibleUnits { from: String, to: String },

    #[error("unit {0} has a non-positive ratio")]
    InvalidRatio(String),

    #[error("unknown unit of measure {0}")]
    UnknownUnit(UomId),
}

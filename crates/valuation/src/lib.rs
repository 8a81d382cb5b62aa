//! FIFO stock valuation.
//!
//! A [`ReceiptLedger`] holds the valued receipts of one product in FIFO
//! order; [`FifoValuator`] consumes them to value outgoing moves.

pub mod fifo;
pub mod ledger;
pub mod receipt;

pub use fifo::{FifoRequest, FifoValuation, FifoValuator};
pub use ledger::{
    ConsumeFifo, LedgerCommand, LedgerEvent, ReceiptConsumed, ReceiptLedger, ReceiptRecorded,
    RecordReceipt,
};
pub use receipt::Receipt;

//! Batch runner behind the `stockledger` binary.

pub mod report;

pub use report::{Report, run};

//! Configuration loading and representation.

use anyhow::{Context, Result};

pub const DEFAULT_UOM_PRECISION: u32 = 3;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockConfig {
    /// Decimal digits used when comparing converted quantities.
    pub uom_precision_digits: u32,
    /// `tracing-subscriber` filter directive.
    pub log_filter: String,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            uom_precision_digits: DEFAULT_UOM_PRECISION,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl StockConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let uom_precision_digits = match lookup("STOCKLEDGER_UOM_PRECISION") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("STOCKLEDGER_UOM_PRECISION must be a digit count, got {raw:?}"))?,
            None => DEFAULT_UOM_PRECISION,
        };
        let log_filter = lookup("STOCKLEDGER_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            uom_precision_digits,
            log_filter,
        })
    }
}

use anyhow::{Context, Result};

use stockledger_infra::StockConfig;
use stockledger_infra::fixtures::Snapshot;

fn main() -> Result<()> {
    let config = StockConfig::from_env()?;
    stockledger_observability::init_with_filter(&config.log_filter);

    let path = std::env::args()
        .nth(1)
        .context("usage: stockledger <snapshot.json>")?;
    let snapshot = Snapshot::load(&path)?;
    tracing::info!(path = %path, moves = snapshot.moves.len(), "snapshot loaded");

    let report = stockledger_cli::run(&snapshot, &config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

//! Reading and writing JSON market snapshots

use anyhow::{Context, Result};
use outcome_amm::MarketState;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// Load a snapshot from a file, or from stdin when the path is `-`
pub fn read_market(path: &str) -> Result<MarketState> {
    let content = if path == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read market snapshot from stdin")?;
        buffer
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read market snapshot {}", path))?
    };

    let market: MarketState = serde_json::from_str(&content)
        .with_context(|| format!("Invalid market snapshot in {}", path))?;
    debug!(outcomes = market.outcome_count(), "Loaded market snapshot from {}", path);
    Ok(market)
}

/// Pretty JSON for stdout or a file
pub fn render<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output")
}

/// Write a value as pretty JSON to `path`
pub fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = render(value)?;
    fs::write(path, json + "\n").with_context(|| format!("Failed to write {:?}", path))?;
    debug!("Wrote snapshot to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use outcome_amm::AmmCalculator;
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("market.json");
        let market = AmmCalculator::default()
            .initialize_market(&["yes", "no"], 500.0)
            .unwrap();

        write_json(&market, &path).unwrap();
        let loaded = read_market(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded, market);
    }

    #[test]
    fn test_rejects_malformed_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("market.json");
        fs::write(&path, "{\"outcomes\": 3}").unwrap();

        let err = read_market(path.to_str().unwrap()).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid market snapshot"));
    }
}

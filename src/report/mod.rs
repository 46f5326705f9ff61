//! Reporting: normalized chart datasets for the plot renderer and text summaries.

use crate::aligner::{self, AlignedDataset};
use crate::collector;
use crate::config::Config;
use crate::model::{MetricKind, Network};
use crate::storage::TransactionStore;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

pub const X_LABEL: &str = "Contract method name";
pub const FEE_DATASET_NAME: &str = "tx-fees";
pub const FEE_Y_LABEL: &str = "Mean transaction fee (ETH)";

/// Network whose label order drives the chart axis.
pub const PRIMARY_NETWORK: Network = Network::ZkevmTestnet;
pub const SECONDARY_NETWORK: Network = Network::Goerli;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub network: Network,
    pub values: Vec<f64>,
}

/// Grouped-bar chart input: one series per network over a shared label axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub name: String,
    pub x_label: String,
    pub y_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_limit: Option<f64>,
    pub generated_at: DateTime<Utc>,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

impl ChartDataset {
    fn from_aligned(
        name: &str,
        y_label: &str,
        y_limit: Option<f64>,
        aligned: AlignedDataset,
    ) -> Self {
        ChartDataset {
            name: name.to_string(),
            x_label: X_LABEL.to_string(),
            y_label: y_label.to_string(),
            y_limit,
            generated_at: Utc::now(),
            labels: aligned.labels,
            series: vec![
                Series {
                    network: PRIMARY_NETWORK,
                    values: aligned.primary,
                },
                Series {
                    network: SECONDARY_NETWORK,
                    values: aligned.secondary,
                },
            ],
        }
    }
}

/// Benchmark metric of both networks, aligned by label.
pub fn metric_dataset(config: &Config, kind: MetricKind) -> anyhow::Result<ChartDataset> {
    let primary = collector::collect(
        &config.data.network_dir(PRIMARY_NETWORK),
        kind.shard_prefix(),
    )
    .with_context(|| format!("collecting {} for {}", kind.dataset_name(), PRIMARY_NETWORK))?;
    let secondary = collector::collect(
        &config.data.network_dir(SECONDARY_NETWORK),
        kind.shard_prefix(),
    )
    .with_context(|| format!("collecting {} for {}", kind.dataset_name(), SECONDARY_NETWORK))?;
    let aligned = aligner::align(&primary, &secondary)?;
    Ok(ChartDataset::from_aligned(
        kind.dataset_name(),
        kind.y_label(),
        Some(kind.y_limit()),
        aligned,
    ))
}

/// Mean fee per method of both networks, aligned by method name.
pub fn fee_dataset(store: &TransactionStore) -> anyhow::Result<ChartDataset> {
    let primary = store.read_aggregated(PRIMARY_NETWORK)?;
    let secondary = store.read_aggregated(SECONDARY_NETWORK)?;
    let aligned = aligner::align(&primary, &secondary)?;
    Ok(ChartDataset::from_aligned(
        FEE_DATASET_NAME,
        FEE_Y_LABEL,
        None,
        aligned,
    ))
}

/// Write `<dir>/<name>.json` and return its path.
pub fn write_dataset(dir: &Path, dataset: &ChartDataset) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output dir: {}", dir.display()))?;
    let path = dir.join(format!("{}.json", dataset.name));
    let json = serde_json::to_string_pretty(dataset)?;
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write dataset: {}", path.display()))?;
    info!(path = %path.display(), labels = dataset.labels.len(), "dataset written");
    Ok(path)
}

pub fn print_dataset_summary(dataset: &ChartDataset) {
    println!("--- {} ({}) ---", dataset.name, dataset.y_label);
    if dataset.labels.is_empty() {
        println!("No data.");
        return;
    }
    let header: Vec<&str> = dataset.series.iter().map(|s| s.network.name()).collect();
    println!("{:<20} {}", "method", header.join(" "));
    for (i, label) in dataset.labels.iter().enumerate() {
        let values: Vec<String> = dataset
            .series
            .iter()
            .map(|s| format!("{:>14.6}", s.values[i]))
            .collect();
        println!("{:<20} {}", label, values.join(" "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionRecord;

    #[test]
    fn test_fee_dataset_empty_logs() {
        let dir = tempfile::tempdir().unwrap();
        let store = TransactionStore::new(dir.path());
        let ds = fee_dataset(&store).unwrap();
        assert!(ds.labels.is_empty());
        assert_eq!(ds.series.len(), 2);
        print_dataset_summary(&ds);
    }

    #[test]
    fn test_fee_dataset_aligns_methods() {
        let dir = tempfile::tempdir().unwrap();
        let store = TransactionStore::new(dir.path());
        store
            .append_all(
                Network::ZkevmTestnet,
                &[TransactionRecord::new("0x1", 1.0, 2, "approve")],
            )
            .unwrap();
        store
            .append_all(
                Network::Goerli,
                &[
                    TransactionRecord::new("0x2", 1.0, 4, "approve"),
                    TransactionRecord::new("0x3", 1.0, 6, "approve"),
                ],
            )
            .unwrap();
        let ds = fee_dataset(&store).unwrap();
        assert_eq!(ds.labels, vec!["approve"]);
        assert_eq!(ds.series[0].network, Network::ZkevmTestnet);
        assert_eq!(ds.series[0].values, vec![2.0]);
        assert_eq!(ds.series[1].values, vec![5.0]);
        assert_eq!(ds.y_limit, None);
    }

    #[test]
    fn test_write_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let ds = ChartDataset::from_aligned(
            "gas-used",
            MetricKind::GasUsed.y_label(),
            Some(MetricKind::GasUsed.y_limit()),
            AlignedDataset {
                labels: vec!["init".to_string()],
                primary: vec![1.0],
                secondary: vec![2.0],
            },
        );
        let path = write_dataset(&dir.path().join("plots"), &ds).unwrap();
        assert!(path.ends_with("gas-used.json"));
        let back: ChartDataset =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.series[1].network, Network::Goerli);
        assert_eq!(back.y_limit, Some(310_000.0));
    }
}

//! Networks, metric kinds, aggregated metrics and enriched transaction records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two benchmarked test networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    Goerli,
    ZkevmTestnet,
}

impl Network {
    pub fn name(self) -> &'static str {
        match self {
            Network::Goerli => "goerli",
            Network::ZkevmTestnet => "zkevm_testnet",
        }
    }

    /// Block-explorer API endpoint for this network.
    pub fn api_base_url(self) -> &'static str {
        match self {
            Network::Goerli => "https://api-goerli.etherscan.io/api",
            Network::ZkevmTestnet => "https://api-testnet-zkevm.polygonscan.com/api",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "goerli" => Ok(Network::Goerli),
            "zkevm_testnet" | "zkevm-testnet" | "zkevm" => Ok(Network::ZkevmTestnet),
            other => Err(format!(
                "unknown network {other:?} (expected goerli or zkevm_testnet)"
            )),
        }
    }
}

/// Benchmark measurement kinds written by the test harness as sharded JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    ElapsedTimes,
    GasUsed,
}

impl MetricKind {
    /// File-name fragment identifying shards of this kind.
    pub fn shard_prefix(self) -> &'static str {
        match self {
            MetricKind::ElapsedTimes => "elapsed-times-",
            MetricKind::GasUsed => "gas-used-",
        }
    }

    pub fn dataset_name(self) -> &'static str {
        match self {
            MetricKind::ElapsedTimes => "elapsed-times",
            MetricKind::GasUsed => "gas-used",
        }
    }

    pub fn y_label(self) -> &'static str {
        match self {
            MetricKind::ElapsedTimes => "Elapsed Time (ms)",
            MetricKind::GasUsed => "Gas units used",
        }
    }

    /// Upper bound of the value axis used by the chart renderer.
    pub fn y_limit(self) -> f64 {
        match self {
            MetricKind::ElapsedTimes => 30_000.0,
            MetricKind::GasUsed => 310_000.0,
        }
    }
}

impl FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "elapsed-times" | "elapsed_times" => Ok(MetricKind::ElapsedTimes),
            "gas-used" | "gas_used" => Ok(MetricKind::GasUsed),
            other => Err(format!(
                "unknown metric kind {other:?} (expected elapsed-times or gas-used)"
            )),
        }
    }
}

/// Mean over every sample recorded for a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedMetric {
    pub label: String,
    pub mean: f64,
}

impl AggregatedMetric {
    pub fn new(label: impl Into<String>, mean: f64) -> Self {
        AggregatedMetric {
            label: label.into(),
            mean,
        }
    }
}

/// Enriched transaction. Built once; the fee is derived at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(rename = "_tx_hash")]
    tx_hash: String,
    /// Gas price in ETH.
    #[serde(rename = "_gas_price")]
    gas_price: f64,
    #[serde(rename = "_gas_used")]
    gas_used: u64,
    #[serde(rename = "_method_name")]
    method_name: String,
    /// Fee in ETH.
    #[serde(rename = "_tx_fee")]
    tx_fee: f64,
}

impl TransactionRecord {
    pub fn new(
        tx_hash: impl Into<String>,
        gas_price: f64,
        gas_used: u64,
        method_name: impl Into<String>,
    ) -> Self {
        TransactionRecord {
            tx_hash: tx_hash.into(),
            gas_price,
            gas_used,
            method_name: method_name.into(),
            tx_fee: gas_price * gas_used as f64,
        }
    }

    pub fn tx_hash(&self) -> &str {
        &self.tx_hash
    }

    pub fn gas_price(&self) -> f64 {
        self.gas_price
    }

    pub fn gas_used(&self) -> u64 {
        self.gas_used
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn tx_fee(&self) -> f64 {
        self.tx_fee
    }
}

//! Configuration load and validation.

use crate::model::Network;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub explorer: ExplorerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Directory holding the per-network data directories.
    #[serde(default = "default_data_root")]
    pub root: PathBuf,
    /// Per-network directory name is `<dir_prefix><network>`.
    #[serde(default = "default_dir_prefix")]
    pub dir_prefix: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            root: default_data_root(),
            dir_prefix: default_dir_prefix(),
        }
    }
}

impl DataConfig {
    pub fn network_dir(&self, network: Network) -> PathBuf {
        self.root
            .join(format!("{}{}", self.dir_prefix, network.name()))
    }
}

fn default_data_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_dir_prefix() -> String {
    "data_".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Sustained explorer request rate shared by all workers.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
    /// Token bucket capacity.
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Concurrent enrichment workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub api_keys: ApiKeys,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        ExplorerConfig {
            timeout_secs: default_timeout_secs(),
            requests_per_second: default_requests_per_second(),
            burst: default_burst(),
            workers: default_workers(),
            api_keys: ApiKeys::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeys {
    pub goerli: Option<String>,
    pub zkevm_testnet: Option<String>,
}

impl ApiKeys {
    pub fn for_network(&self, network: Network) -> Option<&str> {
        match network {
            Network::Goerli => self.goerli.as_deref(),
            Network::ZkevmTestnet => self.zkevm_testnet.as_deref(),
        }
        .filter(|k| !k.is_empty())
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_requests_per_second() -> f64 {
    5.0
}

fn default_burst() -> u32 {
    1
}

fn default_workers() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory for the per-network transaction logs.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// SQLite file listing processed transaction hashes.
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            log_dir: default_log_dir(),
            index_path: default_index_path(),
        }
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("tx_logs")
}

fn default_index_path() -> PathBuf {
    PathBuf::from("tx_logs/processed.db")
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Where chart datasets are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("plots")
}

impl Config {
    /// Load and validate config from a TOML file.
    pub fn load(path: &Path) -> Result<Config> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        Config::from_toml(&data)
    }

    pub fn from_toml(data: &str) -> Result<Config> {
        let config: Config = toml::from_str(data).context("invalid config TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.data.dir_prefix.is_empty() {
            anyhow::bail!("data.dir_prefix must be non-empty");
        }
        let rps = self.explorer.requests_per_second;
        if !rps.is_finite() || rps <= 0.0 {
            anyhow::bail!("explorer.requests_per_second must be positive");
        }
        if self.explorer.burst == 0 {
            anyhow::bail!("explorer.burst must be at least 1");
        }
        if self.explorer.workers == 0 {
            anyhow::bail!("explorer.workers must be at least 1");
        }
        Ok(())
    }
}

/// Default config for use when no file is present (e.g. documentation).
pub fn default_config_toml() -> &'static str {
    r#"
# Benchmark shards live in <root>/<dir_prefix><network>/ (e.g. ./data_goerli).
[data]
root = "."
dir_prefix = "data_"

# Block-explorer access. Explorers allow about 5 requests/second per key.
[explorer]
timeout_secs = 30
requests_per_second = 5.0
burst = 1
workers = 1

[explorer.api_keys]
# goerli = "YOUR_ETHERSCAN_KEY"
# zkevm_testnet = "YOUR_POLYGONSCAN_KEY"

[storage]
log_dir = "tx_logs"
index_path = "tx_logs/processed.db"

[report]
output_dir = "plots"
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = Config::from_toml(default_config_toml()).unwrap();
        assert_eq!(config.explorer.requests_per_second, 5.0);
        assert_eq!(config.explorer.workers, 1);
        assert_eq!(
            config.data.network_dir(Network::Goerli),
            PathBuf::from("./data_goerli")
        );
        assert_eq!(config.explorer.api_keys.for_network(Network::Goerli), None);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.storage.log_dir, PathBuf::from("tx_logs"));
        assert_eq!(config.report.output_dir, PathBuf::from("plots"));
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let err = Config::from_toml("[explorer]\nworkers = 0\n").unwrap_err();
        assert!(err.to_string().contains("workers"));
    }

    #[test]
    fn test_api_key_lookup() {
        let config = Config::from_toml(
            "[explorer.api_keys]\ngoerli = \"k1\"\nzkevm_testnet = \"\"\n",
        )
        .unwrap();
        assert_eq!(config.explorer.api_keys.for_network(Network::Goerli), Some("k1"));
        assert_eq!(
            config.explorer.api_keys.for_network(Network::ZkevmTestnet),
            None
        );
    }
}

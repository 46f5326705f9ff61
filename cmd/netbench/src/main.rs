//! Binary entrypoint for netbench.

use clap::Parser;
use netbench::collector::{self, RECEIPTS_PREFIX};
use netbench::config::Config;
use netbench::enricher::{self, Enricher};
use netbench::model::{MetricKind, Network};
use netbench::report;
use netbench::storage::{self, TransactionStore};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(clap::Parser)]
#[command(
    name = "netbench",
    about = "Cross-network benchmark and transaction-fee analytics"
)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Aggregate benchmark shards of both networks into a chart dataset.
    Metrics {
        /// Metric kind: elapsed-times or gas-used.
        #[arg(long)]
        kind: MetricKind,
    },
    /// Fetch fee and method data for transaction hashes and append them to the log.
    Enrich {
        /// Network: goerli or zkevm_testnet.
        #[arg(long)]
        network: Network,
        /// Transaction hash to enrich (repeatable). Defaults to every hash in the receipt shards.
        #[arg(long = "tx")]
        txs: Vec<String>,
    },
    /// Aggregate logged transaction fees per method into a chart dataset.
    Fees,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| std::env::var("NETBENCH_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.toml"));
    let config = Config::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("netbench=info".parse()?),
        )
        .init();

    let store = TransactionStore::new(&config.storage.log_dir);
    match cli.command {
        Command::Metrics { kind } => {
            let dataset = report::metric_dataset(&config, kind)?;
            report::write_dataset(&config.report.output_dir, &dataset)?;
            report::print_dataset_summary(&dataset);
        }
        Command::Enrich { network, txs } => {
            let api_key = config
                .explorer
                .api_keys
                .for_network(network)
                .ok_or_else(|| anyhow::anyhow!("explorer.api_keys.{} is not set", network))?;
            let hashes = if txs.is_empty() {
                collector::collect_tx_hashes(&config.data.network_dir(network), RECEIPTS_PREFIX)?
            } else {
                txs
            };
            let index = storage::open_index(&config.storage.index_path)?;
            let enricher = Arc::new(Enricher::from_config(&config.explorer)?);
            let summary = enricher::run_enrich(
                enricher,
                &store,
                &index,
                network,
                &hashes,
                api_key,
                config.explorer.workers,
            )
            .await?;
            let processed_total = storage::processed_count(&index, network)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            println!("processed total for {}: {}", network, processed_total);
        }
        Command::Fees => {
            let dataset = report::fee_dataset(&store)?;
            report::write_dataset(&config.report.output_dir, &dataset)?;
            report::print_dataset_summary(&dataset);
        }
    }
    Ok(())
}

//! Transaction enrichment via block-explorer proxy APIs. Turns a bare hash into a
//! [`TransactionRecord`] with decoded method and derived fee.

pub mod rate_limit;

use crate::config::ExplorerConfig;
use crate::decoder;
use crate::error::{Error, Result};
use crate::model::{Network, TransactionRecord};
use crate::storage::{self, TransactionStore};
use crate::util::{normalize_tx_hash, parse_hex_quantity, parse_tx_hash, wei_to_eth};
use async_trait::async_trait;
use rate_limit::RateLimiter;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

const ACTION_TX_BY_HASH: &str = "eth_getTransactionByHash";
const ACTION_TX_RECEIPT: &str = "eth_getTransactionReceipt";

/// HTTP GET against an explorer endpoint, returning the decoded JSON body.
#[async_trait]
pub trait ExplorerTransport: Send + Sync {
    async fn get(&self, base_url: &str, query: &[(&str, &str)]) -> Result<Value>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpTransport { client })
    }
}

#[async_trait]
impl ExplorerTransport for HttpTransport {
    async fn get(&self, base_url: &str, query: &[(&str, &str)]) -> Result<Value> {
        let resp = self
            .client
            .get(base_url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }
}

pub struct Enricher<T> {
    transport: T,
    limiter: Arc<RateLimiter>,
}

impl Enricher<HttpTransport> {
    pub fn from_config(config: &ExplorerConfig) -> Result<Self> {
        let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs))?;
        let limiter = RateLimiter::new(config.requests_per_second, config.burst);
        Ok(Enricher::new(transport, Arc::new(limiter)))
    }
}

impl<T: ExplorerTransport> Enricher<T> {
    pub fn new(transport: T, limiter: Arc<RateLimiter>) -> Self {
        Enricher { transport, limiter }
    }

    /// Fetch the transaction and its receipt, then build the record.
    /// Either call failing, or any required field missing, fails the whole record.
    pub async fn enrich(
        &self,
        network: Network,
        tx_hash: &str,
        api_key: &str,
    ) -> Result<TransactionRecord> {
        let tx_hash =
            parse_tx_hash(tx_hash).ok_or_else(|| Error::InvalidTxHash(tx_hash.to_string()))?;
        let tx = self
            .proxy_call(network, ACTION_TX_BY_HASH, &tx_hash, api_key)
            .await?;
        let receipt = self
            .proxy_call(network, ACTION_TX_RECEIPT, &tx_hash, api_key)
            .await?;

        let price_hex = str_field(&receipt, "effectiveGasPrice")
            .or_else(|| str_field(&tx, "gasPrice"))
            .ok_or_else(|| invalid(&tx_hash, "missing gasPrice"))?;
        let price_wei = parse_hex_quantity(price_hex)
            .ok_or_else(|| invalid(&tx_hash, format!("bad gas price {price_hex:?}")))?;
        let used_hex =
            str_field(&receipt, "gasUsed").ok_or_else(|| invalid(&tx_hash, "missing gasUsed"))?;
        let gas_used = parse_hex_quantity(used_hex)
            .and_then(|v| u64::try_from(v).ok())
            .ok_or_else(|| invalid(&tx_hash, format!("bad gasUsed {used_hex:?}")))?;
        let input = str_field(&tx, "input").ok_or_else(|| invalid(&tx_hash, "missing input"))?;
        let method = decoder::decode(input);

        Ok(TransactionRecord::new(
            tx_hash,
            wei_to_eth(price_wei),
            gas_used,
            method,
        ))
    }

    async fn proxy_call(
        &self,
        network: Network,
        action: &str,
        tx_hash: &str,
        api_key: &str,
    ) -> Result<Map<String, Value>> {
        self.limiter.acquire().await;
        debug!(%network, action, tx_hash, "explorer request");
        let query = [
            ("module", "proxy"),
            ("action", action),
            ("txhash", tx_hash),
            ("apikey", api_key),
        ];
        let body = self.transport.get(network.api_base_url(), &query).await?;
        match body.get("result") {
            Some(Value::Object(obj)) => Ok(obj.clone()),
            Some(Value::Null) => Err(Error::TransactionNotFound(tx_hash.to_string())),
            // Explorers report errors (rate limit, bad key) as a string result.
            Some(Value::String(msg)) => Err(invalid(tx_hash, format!("{action}: {msg}"))),
            Some(other) => Err(invalid(
                tx_hash,
                format!("{action}: unexpected result {other}"),
            )),
            None => match body.get("error") {
                Some(e) => Err(invalid(tx_hash, format!("{action}: {e}"))),
                None => Err(invalid(tx_hash, format!("{action}: no result"))),
            },
        }
    }
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn invalid(tx_hash: &str, reason: impl Into<String>) -> Error {
    Error::InvalidResponse {
        tx_hash: tx_hash.to_string(),
        reason: reason.into(),
    }
}

/// Outcome counts of one enrichment batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichSummary {
    /// Distinct hashes asked for.
    pub requested: usize,
    /// Already in the processed index.
    pub skipped: usize,
    pub enriched: usize,
    /// Malformed hashes and network errors; left unmarked so the next run retries them.
    pub failed: usize,
}

/// Enrich `hashes` for `network` and append the records to the store.
///
/// Hashes already in the processed index are skipped. `workers` tasks pull from a
/// shared queue and share the enricher's rate limiter; only this function's loop
/// writes to the log and the index. A record is marked processed after its line
/// is appended. Per-transaction network errors are logged and counted; storage
/// errors abort the batch.
pub async fn run_enrich<T: ExplorerTransport + 'static>(
    enricher: Arc<Enricher<T>>,
    store: &TransactionStore,
    index: &Connection,
    network: Network,
    hashes: &[String],
    api_key: &str,
    workers: usize,
) -> Result<EnrichSummary> {
    let backfilled = storage::backfill_index(index, store, network)?;
    if backfilled > 0 {
        info!(%network, backfilled, "indexed hashes already present in log");
    }

    let mut summary = EnrichSummary::default();
    let mut seen = HashSet::new();
    let mut pending = VecDeque::new();
    for raw in hashes {
        let hash = normalize_tx_hash(raw);
        if !seen.insert(hash.clone()) {
            continue;
        }
        summary.requested += 1;
        let Some(hash) = parse_tx_hash(&hash) else {
            summary.failed += 1;
            warn!(%network, tx_hash = %raw, "not a transaction hash, skipping");
            continue;
        };
        if storage::is_processed(index, network, &hash)? {
            summary.skipped += 1;
        } else {
            pending.push_back(hash);
        }
    }
    if pending.is_empty() {
        info!(%network, requested = summary.requested, "nothing to enrich");
        return Ok(summary);
    }

    let workers = workers.clamp(1, pending.len());
    let queue = Arc::new(std::sync::Mutex::new(pending));
    let (tx, mut rx) = mpsc::channel::<(String, Result<TransactionRecord>)>(workers * 2);
    let mut tasks = JoinSet::new();
    for worker in 0..workers {
        let queue = queue.clone();
        let enricher = enricher.clone();
        let tx = tx.clone();
        let api_key = api_key.to_string();
        tasks.spawn(async move {
            loop {
                let next = queue.lock().ok().and_then(|mut q| q.pop_front());
                let Some(hash) = next else { break };
                let result = enricher.enrich(network, &hash, &api_key).await;
                if tx.send((hash, result)).await.is_err() {
                    break;
                }
            }
            debug!(worker, "enrichment worker done");
        });
    }
    drop(tx);

    while let Some((hash, result)) = rx.recv().await {
        match result {
            Ok(record) => {
                store.append_all(network, std::slice::from_ref(&record))?;
                storage::mark_processed(index, network, &hash)?;
                summary.enriched += 1;
                info!(
                    %network,
                    tx_hash = %hash,
                    method = record.method_name(),
                    fee = record.tx_fee(),
                    "enriched"
                );
            }
            Err(e) if e.is_network() => {
                summary.failed += 1;
                warn!(%network, tx_hash = %hash, "enrichment failed: {}", e);
            }
            Err(e) => return Err(e),
        }
    }
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            warn!("enrichment worker ended abnormally: {}", e);
        }
    }

    info!(
        %network,
        requested = summary.requested,
        skipped = summary.skipped,
        enriched = summary.enriched,
        failed = summary.failed,
        "enrich done"
    );
    Ok(summary)
}

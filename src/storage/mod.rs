//! Append-only per-network transaction logs and the SQLite processed-hash index.

use crate::error::{Error, Result};
use crate::model::{AggregatedMetric, Network, TransactionRecord};
use crate::util;
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS processed_hashes (
    network TEXT NOT NULL,
    tx_hash TEXT NOT NULL,
    processed_at TEXT NOT NULL,
    PRIMARY KEY (network, tx_hash)
);
";

/// One JSONL log per network under `dir`. Lines are only ever appended.
#[derive(Debug, Clone)]
pub struct TransactionStore {
    dir: PathBuf,
}

impl TransactionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        TransactionStore { dir: dir.into() }
    }

    pub fn log_path(&self, network: Network) -> PathBuf {
        self.dir.join(format!("transactions-{}.jsonl", network.name()))
    }

    /// Append one line per record. Atomic only per line.
    pub fn append_all(&self, network: Network, records: &[TransactionRecord]) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let path = self.log_path(network);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;
        let torn = ends_mid_line(&mut file).map_err(|e| Error::io(&path, e))?;
        let mut out = BufWriter::new(file);
        if torn {
            // Terminate the fragment left by an interrupted write so it stays on its own line.
            warn!(path = %path.display(), "log ends mid-line, terminating fragment");
            writeln!(out).map_err(|e| Error::io(&path, e))?;
        }
        for record in records {
            let line = serde_json::to_string(record)?;
            writeln!(out, "{}", line).map_err(|e| Error::io(&path, e))?;
        }
        out.flush().map_err(|e| Error::io(&path, e))?;
        debug!(%network, appended = records.len(), "log append");
        Ok(())
    }

    /// All records in the log. A torn final line, or a truncated line that a later
    /// append closed off, is skipped; any other bad line is an error.
    pub fn read_records(&self, network: Network) -> Result<Vec<TransactionRecord>> {
        let path = self.log_path(network);
        let data = match std::fs::read_to_string(&path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&path, e)),
        };
        let lines: Vec<&str> = data.lines().filter(|l| !l.trim().is_empty()).collect();
        let mut records = Vec::with_capacity(lines.len());
        for (i, line) in lines.iter().enumerate() {
            match serde_json::from_str::<TransactionRecord>(line) {
                Ok(r) => records.push(r),
                Err(e) if i + 1 == lines.len() || e.is_eof() => {
                    warn!(path = %path.display(), line = i + 1, "skipping incomplete log line: {}", e);
                }
                Err(e) => {
                    return Err(Error::input_format(
                        &path,
                        format!("line {}: {}", i + 1, e),
                    ))
                }
            }
        }
        Ok(records)
    }

    /// Mean fee per method, sorted by method name. Empty log gives an empty list.
    pub fn read_aggregated(&self, network: Network) -> Result<Vec<AggregatedMetric>> {
        let mut fees: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for record in self.read_records(network)? {
            fees.entry(record.method_name().to_string())
                .or_default()
                .push(record.tx_fee());
        }
        let mut out = Vec::with_capacity(fees.len());
        for (method, values) in fees {
            let mean = util::mean(&method, &values)?;
            out.push(AggregatedMetric::new(method, mean));
        }
        Ok(out)
    }
}

/// Whether a non-empty file does not end with a newline.
fn ends_mid_line(file: &mut std::fs::File) -> std::io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

pub fn open_index(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

pub fn is_processed(conn: &Connection, network: Network, tx_hash: &str) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT 1 FROM processed_hashes WHERE network = ?1 AND tx_hash = ?2")?;
    let mut rows = stmt.query(rusqlite::params![network.name(), tx_hash])?;
    Ok(rows.next()?.is_some())
}

pub fn mark_processed(conn: &Connection, network: Network, tx_hash: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO processed_hashes (network, tx_hash, processed_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![network.name(), tx_hash, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

pub fn processed_count(conn: &Connection, network: Network) -> Result<u64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM processed_hashes WHERE network = ?1",
        [network.name()],
        |r| r.get(0),
    )?;
    Ok(n as u64)
}

/// Mark every hash already present in the network's log. Returns how many were new to the index.
pub fn backfill_index(
    conn: &Connection,
    store: &TransactionStore,
    network: Network,
) -> Result<usize> {
    let mut added = 0;
    for record in store.read_records(network)? {
        if !is_processed(conn, network, record.tx_hash())? {
            mark_processed(conn, network, record.tx_hash())?;
            added += 1;
        }
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_per_network() {
        let store = TransactionStore::new("logs");
        assert_eq!(
            store.log_path(Network::Goerli),
            PathBuf::from("logs/transactions-goerli.jsonl")
        );
    }

    #[test]
    fn test_torn_final_line_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = TransactionStore::new(dir.path());
        store
            .append_all(
                Network::Goerli,
                &[TransactionRecord::new("0x1", 1.0, 2, "approve")],
            )
            .unwrap();
        let mut f = OpenOptions::new()
            .append(true)
            .open(store.log_path(Network::Goerli))
            .unwrap();
        write!(f, "{{\"_tx_hash\":\"0x2\",\"_gas_pr").unwrap();
        assert_eq!(store.read_records(Network::Goerli).unwrap().len(), 1);
    }

    #[test]
    fn test_append_after_torn_line_keeps_new_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = TransactionStore::new(dir.path());
        let path = store.log_path(Network::Goerli);
        store
            .append_all(
                Network::Goerli,
                &[TransactionRecord::new("0x1", 1.0, 2, "approve")],
            )
            .unwrap();
        let mut f = OpenOptions::new().append(true).open(&path).unwrap();
        write!(f, "{{\"_tx_hash\":\"0x2\",\"_gas_pr").unwrap();
        drop(f);

        store
            .append_all(
                Network::Goerli,
                &[TransactionRecord::new("0x3", 1.0, 4, "transfer")],
            )
            .unwrap();
        store
            .append_all(
                Network::Goerli,
                &[TransactionRecord::new("0x4", 1.0, 6, "transfer")],
            )
            .unwrap();

        let hashes: Vec<String> = store
            .read_records(Network::Goerli)
            .unwrap()
            .iter()
            .map(|r| r.tx_hash().to_string())
            .collect();
        assert_eq!(hashes, vec!["0x1", "0x3", "0x4"]);
        assert_eq!(
            store.read_aggregated(Network::Goerli).unwrap(),
            vec![
                AggregatedMetric::new("approve", 2.0),
                AggregatedMetric::new("transfer", 5.0),
            ]
        );
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .contains("\"_gas_pr\n"));
    }

    #[test]
    fn test_corrupt_middle_line_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TransactionStore::new(dir.path());
        std::fs::write(store.log_path(Network::Goerli), "garbage\n").unwrap();
        store
            .append_all(
                Network::Goerli,
                &[TransactionRecord::new("0x1", 1.0, 2, "approve")],
            )
            .unwrap();
        assert!(matches!(
            store.read_records(Network::Goerli),
            Err(Error::InputFormat { .. })
        ));
    }

    #[test]
    fn test_index_mark_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open_index(&dir.path().join("idx").join("processed.db")).unwrap();
        assert!(!is_processed(&conn, Network::Goerli, "0xaa").unwrap());
        mark_processed(&conn, Network::Goerli, "0xaa").unwrap();
        mark_processed(&conn, Network::Goerli, "0xaa").unwrap();
        assert!(is_processed(&conn, Network::Goerli, "0xaa").unwrap());
        assert!(!is_processed(&conn, Network::ZkevmTestnet, "0xaa").unwrap());
        assert_eq!(processed_count(&conn, Network::Goerli).unwrap(), 1);
    }

    #[test]
    fn test_backfill_index_from_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = TransactionStore::new(dir.path());
        let conn = open_index(&dir.path().join("processed.db")).unwrap();
        store
            .append_all(
                Network::ZkevmTestnet,
                &[
                    TransactionRecord::new("0x1", 1.0, 1, "approve"),
                    TransactionRecord::new("0x2", 1.0, 1, "approve"),
                ],
            )
            .unwrap();
        assert_eq!(backfill_index(&conn, &store, Network::ZkevmTestnet).unwrap(), 2);
        assert_eq!(backfill_index(&conn, &store, Network::ZkevmTestnet).unwrap(), 0);
    }
}

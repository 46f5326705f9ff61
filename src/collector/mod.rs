//! Sharded benchmark result collection. Merges per-label samples across shard files.

use crate::error::{Error, Result};
use crate::model::AggregatedMetric;
use crate::util;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File-name fragment of the receipt shards written by the benchmark harness.
pub const RECEIPTS_PREFIX: &str = "receipts-";

/// Collect every shard under `root` whose file name contains `prefix` and
/// return the per-label mean over all concatenated samples, sorted by label.
pub fn collect(root: &Path, prefix: &str) -> Result<Vec<AggregatedMetric>> {
    let mut samples: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let shards = matching_files(root, prefix)?;
    for path in &shards {
        let map = read_shard_map(path)?;
        for (label, value) in map {
            let values = value.as_array().ok_or_else(|| {
                Error::input_format(path, format!("samples for {label:?} are not an array"))
            })?;
            let entry = samples.entry(label.clone()).or_default();
            for v in values {
                let x = v.as_f64().ok_or_else(|| {
                    Error::input_format(path, format!("non-numeric sample for {label:?}: {v}"))
                })?;
                entry.push(x);
            }
        }
    }

    let mut out = Vec::with_capacity(samples.len());
    for (label, values) in &samples {
        let mean = util::mean(label, values)?;
        out.push(AggregatedMetric::new(label.clone(), mean));
    }
    info!(
        root = %root.display(),
        prefix,
        shards = shards.len(),
        labels = out.len(),
        "collect done"
    );
    Ok(out)
}

/// Transaction hashes recorded in receipt shards under `root`, deduplicated and sorted.
pub fn collect_tx_hashes(root: &Path, prefix: &str) -> Result<Vec<String>> {
    let mut hashes = BTreeSet::new();
    for path in matching_files(root, prefix)? {
        let map = read_shard_map(&path)?;
        hashes.extend(map.keys().map(|h| util::normalize_tx_hash(h)));
    }
    Ok(hashes.into_iter().collect())
}

fn read_shard_map(path: &Path) -> Result<serde_json::Map<String, Value>> {
    let data = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let json: Value = serde_json::from_str(&data)
        .map_err(|e| Error::input_format(path, format!("invalid JSON: {e}")))?;
    match json.get("map") {
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(Error::input_format(path, "\"map\" is not an object")),
        None => Err(Error::input_format(path, "missing \"map\" key")),
    }
}

/// Files under `root` (recursive) whose name contains `prefix`, in sorted order.
fn matching_files(root: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|e| Error::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&dir, e))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| Error::io(&path, e))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if entry.file_name().to_string_lossy().contains(prefix) {
                debug!(path = %path.display(), "matched shard");
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}

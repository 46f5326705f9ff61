//! Alignment of two per-network metric lists into parallel chart series.

use crate::error::{Error, Result};
use crate::model::AggregatedMetric;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Parallel arrays sharing one label axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedDataset {
    pub labels: Vec<String>,
    pub primary: Vec<f64>,
    pub secondary: Vec<f64>,
}

/// Keyed join on label. The axis follows `primary`'s order; a label present on
/// only one side is reported instead of being misaligned.
pub fn align(primary: &[AggregatedMetric], secondary: &[AggregatedMetric]) -> Result<AlignedDataset> {
    let by_label: HashMap<&str, f64> = secondary
        .iter()
        .map(|m| (m.label.as_str(), m.mean))
        .collect();
    let mut out = AlignedDataset {
        labels: Vec::with_capacity(primary.len()),
        primary: Vec::with_capacity(primary.len()),
        secondary: Vec::with_capacity(primary.len()),
    };
    for m in primary {
        let other = by_label.get(m.label.as_str()).ok_or_else(|| Error::MissingLabel {
            label: m.label.clone(),
            missing_from: "secondary",
        })?;
        out.labels.push(m.label.clone());
        out.primary.push(m.mean);
        out.secondary.push(*other);
    }
    if let Some(extra) = secondary
        .iter()
        .find(|m| !primary.iter().any(|p| p.label == m.label))
    {
        return Err(Error::MissingLabel {
            label: extra.label.clone(),
            missing_from: "primary",
        });
    }
    Ok(out)
}

/// Index-based alignment: labels from `primary`, secondary values read at the
/// same position. Label disagreement is only logged.
pub fn align_positional(
    primary: &[AggregatedMetric],
    secondary: &[AggregatedMetric],
) -> Result<AlignedDataset> {
    if secondary.len() < primary.len() {
        return Err(Error::LengthMismatch {
            primary: primary.len(),
            secondary: secondary.len(),
        });
    }
    for (i, (p, s)) in primary.iter().zip(secondary).enumerate() {
        if p.label != s.label {
            warn!(
                index = i,
                primary = %p.label,
                secondary = %s.label,
                "positional alignment pairs different labels"
            );
        }
    }
    Ok(AlignedDataset {
        labels: primary.iter().map(|m| m.label.clone()).collect(),
        primary: primary.iter().map(|m| m.mean).collect(),
        secondary: secondary[..primary.len()].iter().map(|m| m.mean).collect(),
    })
}

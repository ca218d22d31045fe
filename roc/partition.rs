//! Ground-truth partitioning of proxy readings.
//!
//! The reference saturation decides which hypothesis is actually true for a
//! subject:
//!
//! - H0, condition-negative: reference >= cutoff (no hypoxemia);
//! - H1, condition-positive: reference < cutoff (hypoxemia, what the alarm is for).
//!
//! Only the proxy values are kept in each subset, because the detector never
//! sees the reference reading.

use crate::data::Dataset;
use std::fmt;

/// Clinical hypoxemia cutoff on arterial oxygen saturation, in percent.
pub const DEFAULT_CLINICAL_CUTOFF: f64 = 88.0;

/// Label used for the concatenation of every subgroup.
pub const POOLED_LABEL: &str = "pooled";

/// Which side of the clinical cutoff a subset holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Reference at or above the cutoff.
    Negative,
    /// Reference strictly below the cutoff.
    Positive,
}

impl Condition {
    pub fn of(reference: f64, cutoff: f64) -> Self {
        if reference < cutoff {
            Self::Positive
        } else {
            Self::Negative
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Negative => "condition-negative",
            Self::Positive => "condition-positive",
        }
    }

    /// Comparison of the reference reading against the cutoff that selects this side.
    pub fn comparison(self) -> &'static str {
        match self {
            Self::Negative => ">=",
            Self::Positive => "<",
        }
    }

    /// Name of the probability estimated from this side's proxy readings.
    pub fn probability_name(self) -> &'static str {
        match self {
            Self::Negative => "false-alarm",
            Self::Positive => "detection",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Proxy readings of one population split by ground truth.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundTruthPartition {
    pub population: String,
    pub cutoff: f64,
    /// Proxy values whose reference is `>= cutoff`.
    pub negative: Vec<f64>,
    /// Proxy values whose reference is `< cutoff`.
    pub positive: Vec<f64>,
}

impl GroundTruthPartition {
    pub fn subset(&self, condition: Condition) -> &[f64] {
        match condition {
            Condition::Negative => &self.negative,
            Condition::Positive => &self.positive,
        }
    }

    pub fn total(&self) -> usize {
        self.negative.len() + self.positive.len()
    }
}

/// Splits a dataset's proxy values on the reference cutoff, keeping row order
/// within each subset.
pub fn partition(dataset: &Dataset, cutoff: f64) -> GroundTruthPartition {
    let mut negative = Vec::new();
    let mut positive = Vec::new();
    for obs in dataset.observations() {
        match Condition::of(obs.reference, cutoff) {
            Condition::Negative => negative.push(obs.proxy),
            Condition::Positive => positive.push(obs.proxy),
        }
    }

    log::info!(
        "Subgroup '{}': {} condition-negative, {} condition-positive (cutoff {cutoff})",
        dataset.label(),
        negative.len(),
        positive.len()
    );

    GroundTruthPartition {
        population: dataset.label().to_string(),
        cutoff,
        negative,
        positive,
    }
}

/// Concatenates already-partitioned subsets into one pooled partition.
///
/// Subsets are merged in the order given, so the pooled negative subset is the
/// first group's negatives followed by the second's, and so on.
pub fn pool(label: &str, partitions: &[GroundTruthPartition]) -> GroundTruthPartition {
    let cutoff = partitions
        .first()
        .map_or(DEFAULT_CLINICAL_CUTOFF, |part| part.cutoff);
    debug_assert!(partitions.iter().all(|part| part.cutoff == cutoff));

    let negative = partitions
        .iter()
        .flat_map(|part| part.negative.iter().copied())
        .collect();
    let positive = partitions
        .iter()
        .flat_map(|part| part.positive.iter().copied())
        .collect();

    GroundTruthPartition {
        population: label.to_string(),
        cutoff,
        negative,
        positive,
    }
}

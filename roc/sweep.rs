//! Threshold sweep: empirical false-alarm and detection probabilities.
//!
//! The detector alarms when the proxy reading is strictly below the threshold.
//! For a partition with negative subset `N` and positive subset `P`:
//!
//! - false alarm at `t` is `|{x in N : x < t}| / |N|`;
//! - detection at `t` is `|{x in P : x < t}| / |P|`.
//!
//! Both are evaluations of an empirical CDF with a strict comparison. Each
//! subset is sorted once and every threshold is answered by binary search.
//!
//! An empty subset has no defined probability. Requesting one is an error
//! naming the population and the condition, never a silent zero or NaN.

use crate::partition::{Condition, GroundTruthPartition};
use thiserror::Error;

/// Thresholds below 84.5 used by the default sweep; the rest step by one point.
const DEFAULT_LOW_THRESHOLDS: [f64; 5] = [60.5, 70.5, 76.5, 80.5, 82.5];
const DEFAULT_STEP_START: f64 = 84.5;
const DEFAULT_STEP_END: f64 = 98.5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SweepError {
    #[error(
        "Population '{population}' has no {condition} observations (reference {} {cutoff}), so its {} probability is undefined.",
        .condition.comparison(),
        .condition.probability_name()
    )]
    EmptyPartition {
        population: String,
        condition: Condition,
        cutoff: f64,
    },
    #[error("The threshold list is empty; at least one threshold is required.")]
    EmptyThresholds,
    #[error("Threshold #{index} is not finite ({value}).")]
    NonFiniteThreshold { index: usize, value: f64 },
    #[error(
        "Thresholds must be ascending, but threshold #{index} ({value}) follows {previous}."
    )]
    UnsortedThresholds {
        index: usize,
        previous: f64,
        value: f64,
    },
}

/// An immutable, ascending (not necessarily strictly) list of finite thresholds.
#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdList(Vec<f64>);

impl ThresholdList {
    pub fn new(values: Vec<f64>) -> Result<Self, SweepError> {
        if values.is_empty() {
            return Err(SweepError::EmptyThresholds);
        }
        for (index, &value) in values.iter().enumerate() {
            if !value.is_finite() {
                return Err(SweepError::NonFiniteThreshold { index, value });
            }
            if index > 0 && value < values[index - 1] {
                return Err(SweepError::UnsortedThresholds {
                    index,
                    previous: values[index - 1],
                    value,
                });
            }
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ThresholdList {
    /// `##.5` values avoid ties with the integer-valued proxy readings.
    fn default() -> Self {
        Self(default_thresholds())
    }
}

/// The default candidate thresholds: a coarse low range, then 84.5 to 98.5 by 1.0.
pub fn default_thresholds() -> Vec<f64> {
    let steps = (DEFAULT_STEP_END - DEFAULT_STEP_START).round() as usize;
    DEFAULT_LOW_THRESHOLDS
        .iter()
        .copied()
        .chain((0..=steps).map(|i| DEFAULT_STEP_START + i as f64))
        .collect()
}

/// Sorted sample supporting strict-less-than CDF queries.
#[derive(Clone, Debug)]
pub struct EmpiricalCdf {
    sorted: Vec<f64>,
}

impl EmpiricalCdf {
    pub fn new(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self { sorted }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Number of sample values strictly below `threshold`.
    pub fn count_below(&self, threshold: f64) -> usize {
        self.sorted.partition_point(|&x| x < threshold)
    }

    /// Fraction of the sample strictly below `threshold`, or `None` if empty.
    pub fn fraction_below(&self, threshold: f64) -> Option<f64> {
        if self.sorted.is_empty() {
            return None;
        }
        Some(self.count_below(threshold) as f64 / self.sorted.len() as f64)
    }
}

/// One operating point of the detector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RocPoint {
    pub threshold: f64,
    pub false_alarm: f64,
    pub detection: f64,
}

/// The operating points of one population, indexed like the threshold list.
#[derive(Clone, Debug, PartialEq)]
pub struct RocCurve {
    pub population: String,
    pub n_negative: usize,
    pub n_positive: usize,
    pub points: Vec<RocPoint>,
}

impl RocCurve {
    pub fn false_alarm(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.false_alarm).collect()
    }

    pub fn detection(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.detection).collect()
    }
}

fn rate(
    partition: &GroundTruthPartition,
    condition: Condition,
    threshold: f64,
) -> Result<f64, SweepError> {
    EmpiricalCdf::new(partition.subset(condition))
        .fraction_below(threshold)
        .ok_or_else(|| empty_partition(partition, condition))
}

fn empty_partition(partition: &GroundTruthPartition, condition: Condition) -> SweepError {
    SweepError::EmptyPartition {
        population: partition.population.clone(),
        condition,
        cutoff: partition.cutoff,
    }
}

/// Probability that the detector alarms on a truly negative case.
pub fn false_alarm_probability(
    partition: &GroundTruthPartition,
    threshold: f64,
) -> Result<f64, SweepError> {
    rate(partition, Condition::Negative, threshold)
}

/// Probability that the detector alarms on a truly positive case.
pub fn detection_probability(
    partition: &GroundTruthPartition,
    threshold: f64,
) -> Result<f64, SweepError> {
    rate(partition, Condition::Positive, threshold)
}

/// Evaluates both probabilities at every threshold.
pub fn sweep(
    partition: &GroundTruthPartition,
    thresholds: &ThresholdList,
) -> Result<RocCurve, SweepError> {
    let negative = EmpiricalCdf::new(&partition.negative);
    let positive = EmpiricalCdf::new(&partition.positive);
    if negative.is_empty() {
        return Err(empty_partition(partition, Condition::Negative));
    }
    if positive.is_empty() {
        return Err(empty_partition(partition, Condition::Positive));
    }

    let mut points = Vec::with_capacity(thresholds.len());
    for &threshold in thresholds.as_slice() {
        let false_alarm = negative.count_below(threshold) as f64 / negative.len() as f64;
        let detection = positive.count_below(threshold) as f64 / positive.len() as f64;
        log::debug!(
            "{}: threshold {threshold:.1} -> P_FA {false_alarm:.4}, P_D {detection:.4}",
            partition.population
        );
        points.push(RocPoint {
            threshold,
            false_alarm,
            detection,
        });
    }

    Ok(RocCurve {
        population: partition.population.clone(),
        n_negative: negative.len(),
        n_positive: positive.len(),
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use crate::partition::partition;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn example_partition() -> GroundTruthPartition {
        let data = Dataset::new(
            "White",
            array![85.0, 90.0, 87.0, 95.0],
            array![80.0, 92.0, 84.0, 94.0],
        )
        .unwrap();
        partition(&data, 88.0)
    }

    #[test]
    fn worked_example_at_85_5() {
        let part = example_partition();
        assert_abs_diff_eq!(false_alarm_probability(&part, 85.5).unwrap(), 0.0);
        assert_abs_diff_eq!(detection_probability(&part, 85.5).unwrap(), 1.0);
    }

    #[test]
    fn comparison_is_strict() {
        let part = example_partition();
        // 84 is not below 84, so only 80 alarms.
        assert_abs_diff_eq!(detection_probability(&part, 84.0).unwrap(), 0.5);
        assert_abs_diff_eq!(false_alarm_probability(&part, 94.0).unwrap(), 0.5);
    }

    #[test]
    fn default_thresholds_match_published_sweep() {
        let list = ThresholdList::default();
        assert_eq!(list.len(), 20);
        assert_eq!(&list.as_slice()[..6], &[60.5, 70.5, 76.5, 80.5, 82.5, 84.5]);
        assert_abs_diff_eq!(*list.as_slice().last().unwrap(), 98.5);
        assert!(list.as_slice().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn threshold_list_validation() {
        assert_eq!(ThresholdList::new(vec![]), Err(SweepError::EmptyThresholds));
        assert!(matches!(
            ThresholdList::new(vec![80.5, f64::NAN]),
            Err(SweepError::NonFiniteThreshold { index: 1, .. })
        ));
        assert!(matches!(
            ThresholdList::new(vec![80.5, 90.5, 85.5]),
            Err(SweepError::UnsortedThresholds { index: 2, .. })
        ));
        // Repeated values are allowed; the list is only non-strictly ascending.
        assert!(ThresholdList::new(vec![80.5, 80.5, 90.5]).is_ok());
    }

    #[test]
    fn empty_positive_subset_is_an_error() {
        let data = Dataset::new("Black", array![90.0, 95.0], array![91.0, 96.0]).unwrap();
        let part = partition(&data, 88.0);

        let err = detection_probability(&part, 90.5).unwrap_err();
        assert_eq!(
            err,
            SweepError::EmptyPartition {
                population: "Black".to_string(),
                condition: Condition::Positive,
                cutoff: 88.0,
            }
        );
        let message = err.to_string();
        assert!(message.contains("Black"));
        assert!(message.contains("condition-positive"));
        assert!(message.contains("detection"));

        // False alarm is still well defined for this population.
        assert_abs_diff_eq!(false_alarm_probability(&part, 95.5).unwrap(), 0.5);
        assert!(sweep(&part, &ThresholdList::default()).is_err());
    }

    #[test]
    fn empty_negative_subset_is_an_error() {
        let data = Dataset::new("Black", array![80.0], array![82.0]).unwrap();
        let part = partition(&data, 88.0);
        let err = sweep(&part, &ThresholdList::default()).unwrap_err();
        assert!(matches!(
            err,
            SweepError::EmptyPartition {
                condition: Condition::Negative,
                ..
            }
        ));
    }

    #[test]
    fn sweep_indexes_points_by_threshold() {
        let part = example_partition();
        let thresholds = ThresholdList::new(vec![79.5, 85.5, 93.0, 99.5]).unwrap();
        let curve = sweep(&part, &thresholds).unwrap();

        assert_eq!(curve.n_negative, 2);
        assert_eq!(curve.n_positive, 2);
        assert_eq!(curve.false_alarm(), vec![0.0, 0.0, 0.5, 1.0]);
        assert_eq!(curve.detection(), vec![0.0, 1.0, 1.0, 1.0]);
        for (point, &t) in curve.points.iter().zip(thresholds.as_slice()) {
            assert_eq!(point.threshold, t);
        }
    }

    #[test]
    fn empirical_cdf_counts_strictly_below() {
        let cdf = EmpiricalCdf::new(&[94.0, 80.0, 92.0, 92.0]);
        assert_eq!(cdf.count_below(92.0), 1);
        assert_eq!(cdf.count_below(92.5), 3);
        assert_eq!(cdf.fraction_below(100.0), Some(1.0));
        assert_eq!(EmpiricalCdf::new(&[]).fraction_below(90.0), None);
    }
}

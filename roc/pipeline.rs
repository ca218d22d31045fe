//! End-to-end analysis: load every subgroup, partition on the clinical cutoff,
//! pool the partitions, and sweep the thresholds for each population.

use crate::config::{ConfigError, GroupInput, RocConfig};
use crate::data::{DataError, Dataset, load_dataset};
use crate::partition::{POOLED_LABEL, partition, pool};
use crate::plot::PlotError;
use crate::report::ReportError;
use crate::sweep::{RocCurve, SweepError, ThresholdList, sweep};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Sweep(#[from] SweepError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Plot(#[from] PlotError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("At least one subgroup dataset is required.")]
    NoGroups,
}

/// ROC curves for every subgroup plus the pooled population, all sharing one
/// threshold list.
#[derive(Clone, Debug, PartialEq)]
pub struct RocAnalysis {
    pub cutoff: f64,
    pub thresholds: ThresholdList,
    /// One curve per subgroup, in input order.
    pub groups: Vec<RocCurve>,
    pub pooled: RocCurve,
}

impl RocAnalysis {
    /// Subgroup curves in input order, then the pooled curve.
    pub fn curves(&self) -> impl Iterator<Item = &RocCurve> {
        self.groups.iter().chain(std::iter::once(&self.pooled))
    }
}

/// Loads each subgroup table, failing on the first unreadable input.
pub fn load_groups(groups: &[GroupInput]) -> Result<Vec<Dataset>, PipelineError> {
    if groups.is_empty() {
        return Err(PipelineError::NoGroups);
    }
    groups
        .iter()
        .map(|group| load_dataset(&group.label, &group.path).map_err(PipelineError::from))
        .collect()
}

/// Partitions and sweeps already-loaded subgroups.
///
/// Every population, the pooled one included, must have both condition-negative
/// and condition-positive observations; otherwise the first empty subset found
/// is reported as `SweepError::EmptyPartition`.
pub fn analyze(
    datasets: &[Dataset],
    cutoff: f64,
    thresholds: &ThresholdList,
) -> Result<RocAnalysis, PipelineError> {
    if datasets.is_empty() {
        return Err(PipelineError::NoGroups);
    }

    let partitions: Vec<_> = datasets.iter().map(|data| partition(data, cutoff)).collect();
    let pooled_partition = pool(POOLED_LABEL, &partitions);
    log::info!(
        "Pooled population: {} condition-negative, {} condition-positive",
        pooled_partition.negative.len(),
        pooled_partition.positive.len()
    );

    let groups = partitions
        .iter()
        .map(|part| sweep(part, thresholds))
        .collect::<Result<Vec<_>, _>>()?;
    let pooled = sweep(&pooled_partition, thresholds)?;

    Ok(RocAnalysis {
        cutoff,
        thresholds: thresholds.clone(),
        groups,
        pooled,
    })
}

/// Validates the configuration, loads its subgroups and runs the analysis.
pub fn run(config: &RocConfig) -> Result<RocAnalysis, PipelineError> {
    config.validate()?;
    let thresholds = config.threshold_list()?;
    let datasets = load_groups(&config.groups)?;
    analyze(&datasets, config.clinical_cutoff, &thresholds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::Condition;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn white() -> Dataset {
        Dataset::new(
            "White",
            array![85.0, 90.0, 87.0, 95.0],
            array![80.0, 92.0, 84.0, 94.0],
        )
        .unwrap()
    }

    fn black() -> Dataset {
        Dataset::new(
            "Black",
            array![86.0, 92.0, 99.0, 80.0],
            array![90.0, 91.0, 97.0, 83.0],
        )
        .unwrap()
    }

    #[test]
    fn analyzes_subgroups_and_pooled_population() {
        let thresholds = ThresholdList::new(vec![85.5, 90.5, 95.5]).unwrap();
        let analysis = analyze(&[white(), black()], 88.0, &thresholds).unwrap();

        assert_eq!(analysis.groups.len(), 2);
        assert_eq!(analysis.groups[0].population, "White");
        assert_eq!(analysis.groups[1].population, "Black");
        assert_eq!(analysis.pooled.population, POOLED_LABEL);

        // Black negatives {91, 97}, positives {90, 83}.
        assert_eq!(analysis.groups[1].false_alarm(), vec![0.0, 0.0, 0.5]);
        assert_eq!(analysis.groups[1].detection(), vec![0.5, 1.0, 1.0]);

        // Pooled negatives {92, 94, 91, 97}, positives {80, 84, 90, 83}.
        assert_eq!(analysis.pooled.n_negative, 4);
        assert_eq!(analysis.pooled.n_positive, 4);
        assert_abs_diff_eq!(analysis.pooled.points[0].detection, 0.75);
        assert_abs_diff_eq!(analysis.pooled.points[2].false_alarm, 0.75);

        let names: Vec<&str> = analysis.curves().map(|c| c.population.as_str()).collect();
        assert_eq!(names, vec!["White", "Black", "pooled"]);
    }

    #[test]
    fn empty_subset_in_any_subgroup_fails_the_run() {
        let healthy = Dataset::new("Asian", array![95.0, 97.0], array![96.0, 98.0]).unwrap();
        let err = analyze(&[white(), healthy], 88.0, &ThresholdList::default()).unwrap_err();
        match err {
            PipelineError::Sweep(SweepError::EmptyPartition {
                population,
                condition,
                ..
            }) => {
                assert_eq!(population, "Asian");
                assert_eq!(condition, Condition::Positive);
            }
            other => panic!("Expected EmptyPartition, got {:?}", other),
        }
    }

    #[test]
    fn no_datasets_is_an_error() {
        assert!(matches!(
            analyze(&[], 88.0, &ThresholdList::default()),
            Err(PipelineError::NoGroups)
        ));
        assert!(matches!(load_groups(&[]), Err(PipelineError::NoGroups)));
    }

    #[test]
    fn run_loads_configured_files() {
        let mut white_file = NamedTempFile::new().unwrap();
        writeln!(white_file, "# SaO2,SpO2\n85,80\n90,92\n87,84\n95,94").unwrap();
        let mut black_file = NamedTempFile::new().unwrap();
        writeln!(black_file, "86,90\n92,91\n99,97\n80,83").unwrap();

        let config = RocConfig {
            groups: vec![
                GroupInput {
                    label: "White".to_string(),
                    path: white_file.path().to_path_buf(),
                },
                GroupInput {
                    label: "Black".to_string(),
                    path: black_file.path().to_path_buf(),
                },
            ],
            ..RocConfig::default()
        };
        let analysis = run(&config).unwrap();
        assert_eq!(analysis.thresholds, ThresholdList::default());
        assert_eq!(analysis.groups[0].points.len(), 20);
        assert_eq!(analysis.pooled.n_negative + analysis.pooled.n_positive, 8);
    }

    #[test]
    fn run_reports_missing_file() {
        let config = RocConfig {
            groups: vec![GroupInput {
                label: "White".to_string(),
                path: "/no/such/white.csv".into(),
            }],
            ..RocConfig::default()
        };
        assert!(matches!(
            run(&config),
            Err(PipelineError::Data(DataError::Io { .. }))
        ));
    }
}

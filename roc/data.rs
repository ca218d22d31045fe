//! # Data Loading and Validation Module
//!
//! This module is the exclusive entry point for subgroup measurement tables.
//! Each table is a comma-separated file with exactly two numeric columns per
//! row and no header:
//!
//! - column 0: the reference (arterial, SaO2) saturation, treated as ground truth;
//! - column 1: the proxy (pulse, SpO2) saturation, the detector's input.
//!
//! A `#` starts a comment that runs to the end of its line, so whole-line,
//! indented and trailing comments are all ignored. Every failure is assumed to be a
//! user-input problem, so `DataError` always names the file and, where it can,
//! the offending line and column.

use ndarray::Array1;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Number of columns every data row must carry.
const EXPECTED_COLUMNS: usize = 2;

/// One subject's simultaneous reference and proxy saturation readings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation {
    pub reference: f64,
    pub proxy: f64,
}

/// An ordered, labelled collection of observations for one subgroup.
///
/// The reference and proxy arrays always have the same length; index `i` of
/// both refers to the same subject.
#[derive(Clone, Debug)]
pub struct Dataset {
    label: String,
    reference: Array1<f64>,
    proxy: Array1<f64>,
}

/// A comprehensive error type for all data loading and validation failures.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Could not open input file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read input file '{}': {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error(
        "Line {line} of '{}' has {found} columns, but exactly 2 (reference, proxy) are required.",
        .path.display()
    )]
    ColumnCount {
        path: PathBuf,
        line: u64,
        found: usize,
    },
    #[error(
        "Line {line}, column {column} of '{}' is not a number: '{value}'.",
        .path.display()
    )]
    NonNumeric {
        path: PathBuf,
        line: u64,
        column: usize,
        value: String,
    },
    #[error(
        "Line {line}, column {column} of '{}' is not finite ({value}). All saturations must be finite.",
        .path.display()
    )]
    NonFinite {
        path: PathBuf,
        line: u64,
        column: usize,
        value: f64,
    },
    #[error(
        "Subgroup '{label}' has {reference} reference values but {proxy} proxy values; they must be paired."
    )]
    LengthMismatch {
        label: String,
        reference: usize,
        proxy: usize,
    },
}

impl Dataset {
    /// Builds a dataset from already-aligned arrays.
    pub fn new(
        label: impl Into<String>,
        reference: Array1<f64>,
        proxy: Array1<f64>,
    ) -> Result<Self, DataError> {
        let label = label.into();
        if reference.len() != proxy.len() {
            return Err(DataError::LengthMismatch {
                label,
                reference: reference.len(),
                proxy: proxy.len(),
            });
        }
        Ok(Self {
            label,
            reference,
            proxy,
        })
    }

    /// Builds a dataset from observation pairs, keeping their order.
    pub fn from_observations(label: impl Into<String>, observations: &[Observation]) -> Self {
        let reference = observations.iter().map(|obs| obs.reference).collect();
        let proxy = observations.iter().map(|obs| obs.proxy).collect();
        Self {
            label: label.into(),
            reference,
            proxy,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.reference.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }

    pub fn reference(&self) -> &Array1<f64> {
        &self.reference
    }

    pub fn proxy(&self) -> &Array1<f64> {
        &self.proxy
    }

    /// Iterates the observations in row order.
    pub fn observations(&self) -> impl Iterator<Item = Observation> + '_ {
        self.reference
            .iter()
            .zip(self.proxy.iter())
            .map(|(&reference, &proxy)| Observation { reference, proxy })
    }
}

/// Loads one subgroup table and tags it with `label`.
pub fn load_dataset(label: &str, path: &Path) -> Result<Dataset, DataError> {
    log::info!("Loading subgroup '{label}' from '{}'", path.display());

    let file = File::open(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let observations = internal::read_observations(file, path)?;
    if observations.is_empty() {
        log::warn!(
            "Input file '{}' for subgroup '{label}' contains no observations",
            path.display()
        );
    }

    log::info!(
        "Loaded {} observations for subgroup '{label}'",
        observations.len()
    );
    Ok(Dataset::from_observations(label, &observations))
}

/// Internal module for row parsing.
mod internal {
    use super::*;
    use itertools::Itertools;
    use std::io::Read;

    /// Drops everything from the first `#` on. Line breaks are kept so csv
    /// positions still match the file's line numbers.
    pub(super) fn strip_comments(text: &str) -> String {
        text.lines()
            .map(|line| line.split_once('#').map_or(line, |(data, _)| data))
            .join("\n")
    }

    pub(super) fn read_observations<R: Read>(
        mut source: R,
        path: &Path,
    ) -> Result<Vec<Observation>, DataError> {
        let mut text = String::new();
        source
            .read_to_string(&mut text)
            .map_err(|err| DataError::Io {
                path: path.to_path_buf(),
                source: err,
            })?;
        let table = strip_comments(&text);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(table.as_bytes());

        let mut observations = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| DataError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            let line = record.position().map_or(0, |pos| pos.line());

            // Blank and comment-only lines are not rows.
            if record.iter().all(str::is_empty) {
                continue;
            }
            if record.len() != EXPECTED_COLUMNS {
                return Err(DataError::ColumnCount {
                    path: path.to_path_buf(),
                    line,
                    found: record.len(),
                });
            }

            let reference = parse_field(&record[0], path, line, 0)?;
            let proxy = parse_field(&record[1], path, line, 1)?;
            observations.push(Observation { reference, proxy });
        }
        Ok(observations)
    }

    fn parse_field(raw: &str, path: &Path, line: u64, column: usize) -> Result<f64, DataError> {
        let value: f64 = raw.parse().map_err(|_| DataError::NonNumeric {
            path: path.to_path_buf(),
            line,
            column,
            value: raw.to_string(),
        })?;
        if !value.is_finite() {
            return Err(DataError::NonFinite {
                path: path.to_path_buf(),
                line,
                column,
                value,
            });
        }
        Ok(value)
    }
}

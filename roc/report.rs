//! Machine-readable ROC table and a console summary of the analysis.

use crate::pipeline::RocAnalysis;
use itertools::Itertools;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Could not create ROC table '{}': {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write ROC table: {0}")]
    Csv(#[from] csv::Error),
    #[error("Failed to flush ROC table: {0}")]
    Io(#[from] std::io::Error),
}

/// One `(population, threshold)` line of the ROC table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RocTableRow<'a> {
    pub population: &'a str,
    pub threshold: f64,
    pub false_alarm: f64,
    pub detection: f64,
    pub n_negative: usize,
    pub n_positive: usize,
}

/// Rows for every subgroup in input order, then the pooled population.
pub fn table_rows(analysis: &RocAnalysis) -> Vec<RocTableRow<'_>> {
    analysis
        .curves()
        .flat_map(|curve| {
            curve.points.iter().map(move |point| RocTableRow {
                population: &curve.population,
                threshold: point.threshold,
                false_alarm: point.false_alarm,
                detection: point.detection,
                n_negative: curve.n_negative,
                n_positive: curve.n_positive,
            })
        })
        .collect()
}

/// Writes the ROC table as tab-separated values with a header row.
pub fn write_table_to<W: Write>(analysis: &RocAnalysis, sink: W) -> Result<(), ReportError> {
    let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_writer(sink);
    for row in table_rows(analysis) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_table(analysis: &RocAnalysis, path: &Path) -> Result<(), ReportError> {
    let file = File::create(path).map_err(|source| ReportError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    write_table_to(analysis, file)?;
    log::info!("Wrote ROC table to '{}'", path.display());
    Ok(())
}

/// Human-readable summary: subset sizes, then one line per threshold with each
/// population's false-alarm and detection probabilities.
pub fn format_summary(analysis: &RocAnalysis) -> String {
    const COLUMN: usize = 22;

    let mut lines = vec![format!(
        "Ground truth: reference < {} is condition-positive",
        analysis.cutoff
    )];
    for curve in analysis.curves() {
        lines.push(format!(
            "  {:<12} {:>6} condition-negative {:>6} condition-positive",
            curve.population, curve.n_negative, curve.n_positive
        ));
    }
    lines.push(String::new());

    let header = analysis
        .curves()
        .map(|curve| format!("{:>COLUMN$}", format!("{} P_FA / P_D", curve.population)))
        .join("");
    lines.push(format!("{:>9}{header}", "threshold"));

    for (index, threshold) in analysis.thresholds.as_slice().iter().enumerate() {
        let cells = analysis
            .curves()
            .map(|curve| {
                let point = &curve.points[index];
                format!(
                    "{:>COLUMN$}",
                    format!("{:.4} / {:.4}", point.false_alarm, point.detection)
                )
            })
            .join("");
        lines.push(format!("{:>9}{cells}", format!("{threshold:?}")));
    }

    lines.join("\n")
}

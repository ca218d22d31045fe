//! Run configuration: the clinical cutoff, threshold list, subgroup inputs and
//! plot styling, persisted as human-readable TOML.

use crate::partition::{DEFAULT_CLINICAL_CUTOFF, POOLED_LABEL};
use crate::plot::style::{PlotStyle, StyleError};
use crate::sweep::{SweepError, ThresholdList, default_thresholds};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One subgroup's display label and the CSV table holding its measurements.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupInput {
    pub label: String,
    pub path: PathBuf,
}

impl GroupInput {
    /// Parses a `LABEL=PATH` command-line value.
    pub fn parse(spec: &str) -> Result<Self, ConfigError> {
        let (label, path) = spec
            .split_once('=')
            .ok_or_else(|| ConfigError::GroupSpec(spec.to_string()))?;
        let label = label.trim();
        let path = path.trim();
        if label.is_empty() || path.is_empty() {
            return Err(ConfigError::GroupSpec(spec.to_string()));
        }
        Ok(Self {
            label: label.to_string(),
            path: PathBuf::from(path),
        })
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read or write config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML config file: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize config to TOML format: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("clinical_cutoff must be a finite saturation, got {0}.")]
    InvalidCutoff(f64),
    #[error("Invalid thresholds: {0}")]
    Thresholds(#[from] SweepError),
    #[error("Invalid [plot] settings: {0}")]
    Style(#[from] StyleError),
    #[error("Invalid subgroup '{0}'. Expected LABEL=PATH, e.g. White=white.csv.")]
    GroupSpec(String),
    #[error("No subgroups were given. Supply at least one with --group LABEL=PATH or [[groups]].")]
    NoGroups,
    #[error("Subgroup label '{0}' is used more than once.")]
    DuplicateGroup(String),
    #[error("Subgroup label 'pooled' is reserved for the combined population.")]
    ReservedGroup,
}

/// Everything a run needs besides the data itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RocConfig {
    pub clinical_cutoff: f64,
    pub thresholds: Vec<f64>,
    pub groups: Vec<GroupInput>,
    pub plot: PlotStyle,
}

impl Default for RocConfig {
    fn default() -> Self {
        Self {
            clinical_cutoff: DEFAULT_CLINICAL_CUTOFF,
            thresholds: default_thresholds(),
            groups: Vec::new(),
            plot: PlotStyle::default(),
        }
    }
}

impl RocConfig {
    /// Checks every setting except the group list, which is often supplied later
    /// on the command line.
    pub fn validate_settings(&self) -> Result<(), ConfigError> {
        if !self.clinical_cutoff.is_finite() {
            return Err(ConfigError::InvalidCutoff(self.clinical_cutoff));
        }
        self.threshold_list()?;
        self.plot.validate()?;
        Ok(())
    }

    /// Full validation, including at least one uniquely labelled subgroup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_settings()?;
        if self.groups.is_empty() {
            return Err(ConfigError::NoGroups);
        }
        for (i, group) in self.groups.iter().enumerate() {
            if group.label == POOLED_LABEL {
                return Err(ConfigError::ReservedGroup);
            }
            if self.groups[..i].iter().any(|g| g.label == group.label) {
                return Err(ConfigError::DuplicateGroup(group.label.clone()));
            }
        }
        Ok(())
    }

    pub fn threshold_list(&self) -> Result<ThresholdList, ConfigError> {
        Ok(ThresholdList::new(self.thresholds.clone())?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Saves the configuration to a file in TOML format.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let toml_string = self.to_toml_string()?;
        let mut file = BufWriter::new(fs::File::create(path)?);
        file.write_all(toml_string.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Loads a configuration from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let toml_string = fs::read_to_string(path)?;
        let config: RocConfig = toml::from_str(&toml_string)?;
        config.validate_settings()?;
        log::info!(
            "Loaded config from '{}' ({} subgroups, {} thresholds)",
            path.display(),
            config.groups.len(),
            config.thresholds.len()
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::style::{LegendPosition, MarkerShape, Rgb};
    use tempfile::tempdir;

    fn two_group_config() -> RocConfig {
        RocConfig {
            groups: vec![
                GroupInput::parse("White=data/white.csv").unwrap(),
                GroupInput::parse("Black=data/black.csv").unwrap(),
            ],
            ..RocConfig::default()
        }
    }

    #[test]
    fn parses_group_specs() {
        let group = GroupInput::parse(" White = sims/white.csv ").unwrap();
        assert_eq!(group.label, "White");
        assert_eq!(group.path, PathBuf::from("sims/white.csv"));

        // Only the first '=' separates label from path.
        let group = GroupInput::parse("A=dir=1/a.csv").unwrap();
        assert_eq!(group.path, PathBuf::from("dir=1/a.csv"));

        for bad in ["white.csv", "=white.csv", "White="] {
            assert!(matches!(
                GroupInput::parse(bad),
                Err(ConfigError::GroupSpec(_))
            ));
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("oxroc.toml");
        let mut config = two_group_config();
        config.clinical_cutoff = 90.0;
        config.plot.legend_position = LegendPosition::UpperLeft;
        config.plot.groups[1].fill = Rgb(0, 128, 0);

        config.save(&path).unwrap();
        let loaded = RocConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let text = r#"
clinical_cutoff = 88.0

[[groups]]
label = "White"
path = "white.csv"

[plot]
x_grid = 0.05

[[plot.groups]]
marker = "square"
fill = "orange"
label_below = 94.0
label_dx = 0.0
label_dy = 0.01
label_align = "left"
"#;
        let config: RocConfig = toml::from_str(text).unwrap();
        assert_eq!(config.thresholds, default_thresholds());
        assert_eq!(config.plot.x_grid, 0.05);
        assert_eq!(config.plot.y_grid, 0.1);
        assert_eq!(config.plot.groups.len(), 1);
        assert_eq!(config.plot.groups[0].marker, MarkerShape::Square);
        assert_eq!(config.plot.groups[0].fill, Rgb(255, 165, 0));
        assert_eq!(config.plot.groups[0].marker_size, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bad_colour_fails_to_parse() {
        let text = r#"
[[plot.groups]]
marker = "diamond"
fill = "not-a-colour"
label_below = 95.0
label_dx = 0.0
label_dy = 0.0
label_align = "right"
"#;
        let err = toml::from_str::<RocConfig>(text).unwrap_err();
        assert!(err.to_string().contains("not-a-colour"));
    }

    #[test]
    fn rejects_invalid_thresholds_and_cutoff() {
        let mut config = two_group_config();
        config.thresholds = vec![90.5, 85.5];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Thresholds(SweepError::UnsortedThresholds { .. }))
        ));

        let mut config = two_group_config();
        config.thresholds.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Thresholds(SweepError::EmptyThresholds))
        ));

        let mut config = two_group_config();
        config.clinical_cutoff = f64::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCutoff(_))
        ));
    }

    #[test]
    fn rejects_missing_duplicate_and_reserved_groups() {
        assert!(matches!(
            RocConfig::default().validate(),
            Err(ConfigError::NoGroups)
        ));
        assert!(RocConfig::default().validate_settings().is_ok());

        let mut config = two_group_config();
        config.groups.push(GroupInput::parse("White=again.csv").unwrap());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateGroup(label)) if label == "White"
        ));

        let mut config = two_group_config();
        config.groups.push(GroupInput::parse("pooled=all.csv").unwrap());
        assert!(matches!(config.validate(), Err(ConfigError::ReservedGroup)));
    }

    #[test]
    fn invalid_plot_style_surfaces_as_config_error() {
        let mut config = two_group_config();
        config.plot.y_range = (0.5, 0.5);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Style(StyleError::InvalidRange { axis: "y", .. }))
        ));
    }
}

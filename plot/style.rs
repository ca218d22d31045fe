//! Plot styling constants, exposed as configuration.
//!
//! Nothing here is computed from data. Axis ranges, grid spacing and label
//! cutoffs are tuned for the default 88% cutoff and threshold list; a different
//! cutoff or threshold range usually needs them re-tuned in the config file.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Upper bound on major plus minor gridlines along one axis.
pub const MAX_GRID_LINES: usize = 1000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleError {
    #[error(
        "Invalid colour '{0}'. Use '#rrggbb' or one of: black, white, red, green, blue, orange, purple, gray."
    )]
    InvalidColor(String),
    #[error("Axis range for {axis} must be finite and increasing, got [{lo}, {hi}].")]
    InvalidRange { axis: &'static str, lo: f64, hi: f64 },
    #[error("Grid spacing for {axis} must be finite and positive, got {spacing}.")]
    InvalidGridSpacing { axis: &'static str, spacing: f64 },
    #[error(
        "Grid spacing {spacing} for {axis} would draw more than {limit} gridlines across the axis; use a coarser spacing."
    )]
    GridTooDense {
        axis: &'static str,
        spacing: f64,
        limit: usize,
    },
    #[error("Plot size must be non-zero, got {width}x{height}.")]
    InvalidSize { width: u32, height: u32 },
    #[error("At least one subgroup style is required under [[plot.groups]].")]
    NoGroupStyles,
}

/// An opaque RGB colour, written as `#rrggbb` in config files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const BLUE: Rgb = Rgb(0, 0, 255);

    pub fn parse(text: &str) -> Result<Self, StyleError> {
        let trimmed = text.trim();
        let named = match trimmed.to_ascii_lowercase().as_str() {
            "black" => Some(Rgb(0, 0, 0)),
            "white" => Some(Rgb(255, 255, 255)),
            "red" => Some(Rgb(255, 0, 0)),
            "green" => Some(Rgb(0, 128, 0)),
            "blue" => Some(Rgb(0, 0, 255)),
            "orange" => Some(Rgb(255, 165, 0)),
            "purple" => Some(Rgb(128, 0, 128)),
            "gray" | "grey" => Some(Rgb(128, 128, 128)),
            _ => None,
        };
        if let Some(color) = named {
            return Ok(color);
        }

        let hex = trimmed
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| StyleError::InvalidColor(text.to_string()))?;
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| StyleError::InvalidColor(text.to_string()))
        };
        Ok(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl TryFrom<String> for Rgb {
    type Error = StyleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::parse(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// Marker glyphs, drawn as filled polygons with a black edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerShape {
    Diamond,
    Cross,
    Square,
    Triangle,
    Circle,
}

impl MarkerShape {
    /// Polygon vertices in pixel offsets around the marker centre (y grows downward).
    pub fn vertices(self, size: u32) -> Vec<(i32, i32)> {
        let s = size.max(1) as i32;
        match self {
            Self::Diamond => vec![(0, -s), (s, 0), (0, s), (-s, 0)],
            Self::Square => vec![(-s, -s), (s, -s), (s, s), (-s, s)],
            Self::Triangle => vec![(0, -s), (s, s), (-s, s)],
            Self::Cross => {
                let w = (s / 3).max(1);
                vec![
                    (-s, -s + w),
                    (-s + w, -s),
                    (0, -w),
                    (s - w, -s),
                    (s, -s + w),
                    (w, 0),
                    (s, s - w),
                    (s - w, s),
                    (0, w),
                    (-s + w, s),
                    (-s, s - w),
                    (-w, 0),
                ]
            }
            Self::Circle => {
                const SEGMENTS: usize = 16;
                (0..SEGMENTS)
                    .map(|i| {
                        let angle = i as f64 * std::f64::consts::TAU / SEGMENTS as f64;
                        (
                            (s as f64 * angle.cos()).round() as i32,
                            (s as f64 * angle.sin()).round() as i32,
                        )
                    })
                    .collect()
            }
        }
    }
}

/// Horizontal anchoring of a threshold label relative to its position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelAlign {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendPosition {
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

/// Per-subgroup marker and threshold-label settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupStyle {
    pub marker: MarkerShape,
    pub fill: Rgb,
    #[serde(default = "default_marker_size")]
    pub marker_size: u32,
    /// Thresholds strictly below this value get a text label.
    pub label_below: f64,
    /// Label offset from the point, in false-alarm units.
    pub label_dx: f64,
    /// Label offset from the point, in detection units.
    pub label_dy: f64,
    pub label_align: LabelAlign,
}

fn default_marker_size() -> u32 {
    6
}

/// Every cosmetic setting of the ROC comparison plot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    /// Major gridline spacing; minor lines fall halfway between.
    pub x_grid: f64,
    pub y_grid: f64,
    pub x_label: String,
    pub y_label: String,
    pub axis_font_size: u32,
    pub tick_font_size: u32,
    pub label_font_size: u32,
    pub legend_font_size: u32,
    pub legend_position: LegendPosition,
    pub connector_color: Rgb,
    pub connector_width: u32,
    /// Styles by subgroup position, cycled when there are more subgroups.
    pub groups: Vec<GroupStyle>,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 630,
            height: 550,
            x_range: (-0.013, 0.21),
            y_range: (-0.01, 0.68),
            x_grid: 0.04,
            y_grid: 0.1,
            x_label: "Prob. of False Alarm / Type I Error".to_string(),
            y_label: "Prob. of Detection / True Positive".to_string(),
            axis_font_size: 16,
            tick_font_size: 14,
            label_font_size: 11,
            legend_font_size: 14,
            legend_position: LegendPosition::LowerRight,
            connector_color: Rgb::BLUE,
            connector_width: 2,
            groups: default_group_styles(),
        }
    }
}

/// Red diamonds labelled on the left, then blue crosses labelled below right.
pub fn default_group_styles() -> Vec<GroupStyle> {
    vec![
        GroupStyle {
            marker: MarkerShape::Diamond,
            fill: Rgb::RED,
            marker_size: default_marker_size(),
            label_below: 95.0,
            label_dx: -0.0035,
            label_dy: 0.0,
            label_align: LabelAlign::Right,
        },
        GroupStyle {
            marker: MarkerShape::Cross,
            fill: Rgb::BLUE,
            marker_size: default_marker_size(),
            label_below: 96.0,
            label_dx: 0.004,
            label_dy: -0.015,
            label_align: LabelAlign::Left,
        },
    ]
}

impl PlotStyle {
    pub fn validate(&self) -> Result<(), StyleError> {
        if self.width == 0 || self.height == 0 {
            return Err(StyleError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        check_range("x", self.x_range)?;
        check_range("y", self.y_range)?;
        check_spacing("x", self.x_grid, self.x_range)?;
        check_spacing("y", self.y_grid, self.y_range)?;
        if self.groups.is_empty() {
            return Err(StyleError::NoGroupStyles);
        }
        Ok(())
    }

    /// Style for the subgroup at `index`, cycling through the configured list.
    pub fn group_style(&self, index: usize) -> GroupStyle {
        if self.groups.is_empty() {
            let defaults = default_group_styles();
            return defaults[index % defaults.len()].clone();
        }
        if index >= self.groups.len() {
            log::warn!(
                "Subgroup #{} has no dedicated style; reusing style #{}",
                index + 1,
                index % self.groups.len() + 1
            );
        }
        self.groups[index % self.groups.len()].clone()
    }
}

fn check_range(axis: &'static str, (lo, hi): (f64, f64)) -> Result<(), StyleError> {
    if !(lo.is_finite() && hi.is_finite() && lo < hi) {
        return Err(StyleError::InvalidRange { axis, lo, hi });
    }
    Ok(())
}

fn check_spacing(axis: &'static str, spacing: f64, (lo, hi): (f64, f64)) -> Result<(), StyleError> {
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(StyleError::InvalidGridSpacing { axis, spacing });
    }
    // Lines fall every half spacing.
    if (hi - lo) / (spacing / 2.0) > MAX_GRID_LINES as f64 {
        return Err(StyleError::GridTooDense {
            axis,
            spacing,
            limit: MAX_GRID_LINES,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_named_colours() {
        assert_eq!(Rgb::parse("#ff8000").unwrap(), Rgb(255, 128, 0));
        assert_eq!(Rgb::parse("Blue").unwrap(), Rgb::BLUE);
        assert_eq!(Rgb(255, 0, 0).to_string(), "#ff0000");
        assert!(matches!(Rgb::parse("#12345"), Err(StyleError::InvalidColor(_))));
        assert!(matches!(Rgb::parse("#gg0000"), Err(StyleError::InvalidColor(_))));
        assert!(matches!(Rgb::parse("teal"), Err(StyleError::InvalidColor(_))));
    }

    #[test]
    fn default_style_matches_published_figure() {
        let style = PlotStyle::default();
        assert_eq!(style.x_range, (-0.013, 0.21));
        assert_eq!(style.y_range, (-0.01, 0.68));
        assert_eq!(style.x_grid, 0.04);
        assert_eq!(style.y_grid, 0.1);
        assert_eq!(style.groups.len(), 2);
        assert_eq!(style.groups[0].label_below, 95.0);
        assert_eq!(style.groups[1].label_below, 96.0);
        assert!(style.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_range_and_bad_spacing() {
        let mut style = PlotStyle::default();
        style.x_range = (0.2, 0.1);
        assert!(matches!(
            style.validate(),
            Err(StyleError::InvalidRange { axis: "x", .. })
        ));

        let mut style = PlotStyle::default();
        style.y_grid = 0.0;
        assert!(matches!(
            style.validate(),
            Err(StyleError::InvalidGridSpacing { axis: "y", .. })
        ));

        let mut style = PlotStyle::default();
        style.y_grid = 1e-9;
        assert!(matches!(
            style.validate(),
            Err(StyleError::GridTooDense { axis: "y", .. })
        ));

        let mut style = PlotStyle::default();
        style.x_grid = 0.001;
        assert!(style.validate().is_ok());

        let mut style = PlotStyle::default();
        style.groups.clear();
        assert_eq!(style.validate(), Err(StyleError::NoGroupStyles));
    }

    #[test]
    fn group_styles_cycle() {
        let style = PlotStyle::default();
        assert_eq!(style.group_style(2), style.groups[0]);
        assert_eq!(style.group_style(3).marker, MarkerShape::Cross);
    }

    #[test]
    fn marker_polygons_are_centred() {
        for shape in [
            MarkerShape::Diamond,
            MarkerShape::Cross,
            MarkerShape::Square,
            MarkerShape::Triangle,
            MarkerShape::Circle,
        ] {
            let vertices = shape.vertices(6);
            assert!(vertices.len() >= 3, "{shape:?} has too few vertices");
            assert!(
                vertices
                    .iter()
                    .all(|&(x, y)| x.abs() <= 6 && y.abs() <= 6),
                "{shape:?} escapes its bounding box"
            );
        }
        assert_eq!(MarkerShape::Cross.vertices(6).len(), 12);
    }
}

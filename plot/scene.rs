//! Backend-free description of the ROC comparison figure.
//!
//! `build_scene` decides *what* goes on the plot: one marker per subgroup and
//! threshold, a connector through every subgroup's point at the same threshold,
//! threshold labels, and gridlines. It does no drawing, so the layout can be
//! checked without a display or an output file.

use super::style::{GroupStyle, LabelAlign, MAX_GRID_LINES, PlotStyle};
use crate::sweep::RocCurve;

pub type Point = (f64, f64);

/// Markers and legend entry for one subgroup.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesScene {
    pub label: String,
    pub style: GroupStyle,
    /// `(threshold, (false_alarm, detection))` for every point inside the axes.
    pub markers: Vec<(f64, Point)>,
}

/// Line segment linking the subgroups' operating points for one threshold.
#[derive(Clone, Debug, PartialEq)]
pub struct Connector {
    pub threshold: f64,
    pub from: Point,
    pub to: Point,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdLabel {
    pub group: usize,
    pub text: String,
    pub position: Point,
    pub align: LabelAlign,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GridLine {
    pub from: Point,
    pub to: Point,
    pub major: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RocScene {
    pub series: Vec<SeriesScene>,
    pub connectors: Vec<Connector>,
    pub labels: Vec<ThresholdLabel>,
    pub grid: Vec<GridLine>,
    /// Axis tick positions, one per major gridline.
    pub x_ticks: Vec<f64>,
    pub y_ticks: Vec<f64>,
}

/// Lays out the subgroup curves. All curves must share the same threshold list.
pub fn build_scene(curves: &[RocCurve], style: &PlotStyle) -> RocScene {
    let bounds = Bounds::from_style(style);

    let mut series = Vec::with_capacity(curves.len());
    let mut labels = Vec::new();
    for (group, curve) in curves.iter().enumerate() {
        let group_style = style.group_style(group);
        let mut markers = Vec::with_capacity(curve.points.len());
        for point in &curve.points {
            let position = (point.false_alarm, point.detection);
            if !bounds.contains(position) {
                log::debug!(
                    "{} at {:.1} lies outside the axes at {:?}; marker not drawn",
                    curve.population,
                    point.threshold,
                    position
                );
                continue;
            }
            markers.push((point.threshold, position));

            if point.threshold < group_style.label_below {
                let anchor = (
                    position.0 + group_style.label_dx,
                    position.1 + group_style.label_dy,
                );
                if bounds.contains(anchor) {
                    labels.push(ThresholdLabel {
                        group,
                        text: format_threshold(point.threshold),
                        position: anchor,
                        align: group_style.label_align,
                    });
                } else {
                    log::debug!(
                        "Label {:.1} for {} falls outside the axes; skipped",
                        point.threshold,
                        curve.population
                    );
                }
            }
        }
        series.push(SeriesScene {
            label: curve.population.clone(),
            style: group_style,
            markers,
        });
    }

    RocScene {
        series,
        connectors: connectors(curves, &bounds),
        labels,
        grid: gridlines(style, &bounds),
        x_ticks: major_positions(bounds.x, style.x_grid),
        y_ticks: major_positions(bounds.y, style.y_grid),
    }
}

/// Threshold text as shown next to a marker: the shortest form that reads back
/// as the same value, e.g. `84.5`, `84.25` or `90.0`.
pub fn format_threshold(threshold: f64) -> String {
    format!("{threshold:?}")
}

fn connectors(curves: &[RocCurve], bounds: &Bounds) -> Vec<Connector> {
    let n_thresholds = curves.iter().map(|c| c.points.len()).min().unwrap_or(0);
    let mut segments = Vec::new();
    for index in 0..n_thresholds {
        for pair in curves.windows(2) {
            let a = &pair[0].points[index];
            let b = &pair[1].points[index];
            debug_assert_eq!(a.threshold, b.threshold);
            if let Some((from, to)) = bounds.clip(
                (a.false_alarm, a.detection),
                (b.false_alarm, b.detection),
            ) {
                segments.push(Connector {
                    threshold: a.threshold,
                    from,
                    to,
                });
            }
        }
    }
    segments
}

fn gridlines(style: &PlotStyle, bounds: &Bounds) -> Vec<GridLine> {
    let mut lines = Vec::new();
    for (x, major) in grid_positions(bounds.x, style.x_grid) {
        lines.push(GridLine {
            from: (x, bounds.y.0),
            to: (x, bounds.y.1),
            major,
        });
    }
    for (y, major) in grid_positions(bounds.y, style.y_grid) {
        lines.push(GridLine {
            from: (bounds.x.0, y),
            to: (bounds.x.1, y),
            major,
        });
    }
    lines
}

/// Multiples of `spacing` (major) and the halfway points between them (minor)
/// that fall within `range`, in ascending order. Empty when the spacing would
/// produce more than `MAX_GRID_LINES` lines.
fn grid_positions(range: (f64, f64), spacing: f64) -> Vec<(f64, bool)> {
    let half = spacing / 2.0;
    let first = (range.0 / half).ceil();
    let last = (range.1 / half).floor();
    if !(first.is_finite() && last.is_finite()) || last - first >= MAX_GRID_LINES as f64 {
        log::warn!("Grid spacing {spacing} is too fine for axis range {range:?}; gridlines skipped");
        return Vec::new();
    }
    (first as i64..=last as i64)
        .map(|k| (k as f64 * half, k % 2 == 0))
        .collect()
}

fn major_positions(range: (f64, f64), spacing: f64) -> Vec<f64> {
    grid_positions(range, spacing)
        .into_iter()
        .filter_map(|(position, major)| major.then_some(position))
        .collect()
}

#[derive(Clone, Copy, Debug)]
struct Bounds {
    x: (f64, f64),
    y: (f64, f64),
}

impl Bounds {
    fn from_style(style: &PlotStyle) -> Self {
        Self {
            x: style.x_range,
            y: style.y_range,
        }
    }

    fn contains(&self, (x, y): Point) -> bool {
        x >= self.x.0 && x <= self.x.1 && y >= self.y.0 && y <= self.y.1
    }

    /// Liang-Barsky clipping of segment `a -> b` to the axis box.
    fn clip(&self, a: Point, b: Point) -> Option<(Point, Point)> {
        let dx = b.0 - a.0;
        let dy = b.1 - a.1;
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        let edges = [
            (-dx, a.0 - self.x.0),
            (dx, self.x.1 - a.0),
            (-dy, a.1 - self.y.0),
            (dy, self.y.1 - a.1),
        ];
        for (p, q) in edges {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
        Some((
            (a.0 + t0 * dx, a.1 + t0 * dy),
            (a.0 + t1 * dx, a.1 + t1 * dy),
        ))
    }
}

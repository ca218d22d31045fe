//! Draws a `RocScene` with plotters. Only the SVG backend is compiled in.

use super::scene::{RocScene, build_scene};
use super::style::{LabelAlign, LegendPosition, PlotStyle, Rgb, StyleError};
use crate::sweep::RocCurve;
use plotters::coord::Shift;
use plotters::coord::combinators::BindKeyPoints;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fmt::Display;
use std::path::Path;
use thiserror::Error;

const FONT_FAMILY: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Plot style is invalid: {0}")]
    Style(#[from] StyleError),
    #[error("Failed to draw the ROC plot: {0}")]
    Drawing(String),
}

fn drawing_error<E: Display>(err: E) -> PlotError {
    PlotError::Drawing(err.to_string())
}

fn color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.0, rgb.1, rgb.2)
}

fn series_label_position(position: LegendPosition) -> SeriesLabelPosition {
    match position {
        LegendPosition::UpperLeft => SeriesLabelPosition::UpperLeft,
        LegendPosition::UpperRight => SeriesLabelPosition::UpperRight,
        LegendPosition::LowerLeft => SeriesLabelPosition::LowerLeft,
        LegendPosition::LowerRight => SeriesLabelPosition::LowerRight,
    }
}

/// Renders the subgroup curves to an SVG file at `path`.
pub fn render_svg(curves: &[RocCurve], style: &PlotStyle, path: &Path) -> Result<(), PlotError> {
    style.validate()?;
    let scene = build_scene(curves, style);

    let root = SVGBackend::new(path, (style.width, style.height)).into_drawing_area();
    draw_scene(&root, &scene, style)?;
    root.present().map_err(drawing_error)?;

    log::info!("Wrote ROC plot to '{}'", path.display());
    Ok(())
}

/// Renders the subgroup curves to an in-memory SVG document.
pub fn render_svg_string(curves: &[RocCurve], style: &PlotStyle) -> Result<String, PlotError> {
    style.validate()?;
    let scene = build_scene(curves, style);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (style.width, style.height)).into_drawing_area();
        draw_scene(&root, &scene, style)?;
        root.present().map_err(drawing_error)?;
    }
    Ok(svg)
}

/// Draws gridlines, axes, connectors, markers, threshold labels and the legend,
/// in that order, onto any plotters backend.
pub fn draw_scene<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    scene: &RocScene,
    style: &PlotStyle,
) -> Result<(), PlotError> {
    root.fill(&WHITE).map_err(drawing_error)?;

    let (x0, x1) = style.x_range;
    let (y0, y1) = style.y_range;
    let mut chart = ChartBuilder::on(root)
        .margin(12)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (x0..x1).with_key_points(scene.x_ticks.clone()),
            (y0..y1).with_key_points(scene.y_ticks.clone()),
        )
        .map_err(drawing_error)?;

    let major = BLACK.mix(0.25).stroke_width(1);
    let minor = BLACK.mix(0.08).stroke_width(1);
    chart
        .draw_series(scene.grid.iter().map(|line| {
            PathElement::new(vec![line.from, line.to], if line.major { major } else { minor })
        }))
        .map_err(drawing_error)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(scene.x_ticks.len())
        .y_labels(scene.y_ticks.len())
        .x_desc(style.x_label.as_str())
        .y_desc(style.y_label.as_str())
        .axis_desc_style((FONT_FAMILY, style.axis_font_size))
        .label_style((FONT_FAMILY, style.tick_font_size))
        .x_label_formatter(&|v: &f64| format!("{v:.2}"))
        .y_label_formatter(&|v: &f64| format!("{v:.1}"))
        .draw()
        .map_err(drawing_error)?;

    let connector = color(style.connector_color).stroke_width(style.connector_width);
    chart
        .draw_series(
            scene
                .connectors
                .iter()
                .map(|segment| PathElement::new(vec![segment.from, segment.to], connector)),
        )
        .map_err(drawing_error)?;

    for series in &scene.series {
        let fill = color(series.style.fill);
        let vertices = series.style.marker.vertices(series.style.marker_size);
        let mut outline = vertices.clone();
        if let Some(&first) = vertices.first() {
            outline.push(first);
        }

        let legend_vertices = vertices.clone();
        chart
            .draw_series(series.markers.iter().map(|&(_, position)| {
                EmptyElement::at(position)
                    + Polygon::new(vertices.clone(), fill.filled())
                    + PathElement::new(outline.clone(), BLACK.stroke_width(1))
            }))
            .map_err(drawing_error)?
            .label(series.label.as_str())
            .legend(move |(x, y)| {
                EmptyElement::at((x + 8, y)) + Polygon::new(legend_vertices.clone(), fill.filled())
            });
    }

    let font = (FONT_FAMILY, style.label_font_size).into_font();
    chart
        .draw_series(scene.labels.iter().map(|label| {
            let hpos = match label.align {
                LabelAlign::Left => HPos::Left,
                LabelAlign::Right => HPos::Right,
            };
            let text_style = font
                .color(&BLACK)
                .pos(Pos::new(hpos, VPos::Center));
            Text::new(label.text.clone(), label.position, text_style)
        }))
        .map_err(drawing_error)?;

    chart
        .configure_series_labels()
        .position(series_label_position(style.legend_position))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .label_font((FONT_FAMILY, style.legend_font_size))
        .draw()
        .map_err(drawing_error)?;

    Ok(())
}

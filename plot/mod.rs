//! ROC comparison figure: styling, backend-free layout, and SVG rendering.

pub mod render;
pub mod scene;
pub mod style;

pub use render::{PlotError, draw_scene, render_svg, render_svg_string};
pub use scene::{RocScene, build_scene};
pub use style::{GroupStyle, PlotStyle, Rgb, StyleError};

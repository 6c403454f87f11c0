//! Diagram rendering for mathdrill.
//!
//! Each visual engine has a pure renderer mapping its validated
//! configuration to [`Diagram`] primitives in a 300×300 canvas. Renderers
//! never fail: missing or degenerate geometry yields an empty diagram, or
//! skips only the affected primitive.

pub mod angles;
pub mod cartesian;
pub mod geometry;
pub mod html;
pub mod number_line;
pub mod primitives;
pub mod pythagoras;

use mathdrill_core::model::VisualConfig;

pub use primitives::{Diagram, Point, Primitive, CANVAS_SIZE};

/// Render any visual configuration.
pub fn render(config: &VisualConfig) -> Diagram {
    match config {
        VisualConfig::Opaque { .. } => Diagram::empty(),
        VisualConfig::Pythagoras(c) => pythagoras::render_pythagoras(c),
        VisualConfig::NumberLine(c) => number_line::render_number_line(c),
        VisualConfig::Cartesian(c) => cartesian::render_cartesian(c),
        VisualConfig::Geometry(c) => geometry::render_geometry(c),
        VisualConfig::Angles(c) => angles::render_angles(c),
    }
}

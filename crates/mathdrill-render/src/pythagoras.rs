//! Right-triangle scenes.

use mathdrill_core::model::PythagorasConfig;

use crate::geometry::{centroid, right_angle_marker, vertex_label};
use crate::primitives::{polyline_path, Diagram, Point, Primitive, Style, CENTER};

/// Longest side of the triangle's bounding box, in canvas units.
const FIT_SIZE: f64 = 180.0;
const SIDE_LABEL_OFFSET: f64 = 16.0;

/// Render a right triangle scaled to fit the canvas.
pub fn render_pythagoras(config: &PythagorasConfig) -> Diagram {
    let coords: Option<Vec<(f64, f64)>> = config.points.iter().map(|p| p.coords()).collect();
    let Some(coords) = coords.filter(|c| c.len() == 3) else {
        return Diagram::empty();
    };

    let vertices = fit_to_canvas(&coords);
    let mut diagram = Diagram::empty();
    diagram.push(Primitive::Path {
        d: polyline_path(&vertices, true),
        style: Style::fill("#fef3c7").with_stroke("#1f2937", 2.0),
    });

    let corner = config
        .right_angle
        .filter(|&i| i < 3)
        .or_else(|| infer_right_angle(&coords));
    if let Some(v) = corner {
        let marker = right_angle_marker(vertices[(v + 1) % 3], vertices[v], vertices[(v + 2) % 3]);
        diagram.primitives.extend(marker);
    }

    let center = centroid(&vertices);
    for (i, spec) in config.points.iter().enumerate() {
        diagram.push(vertex_label(spec, i, vertices[i], center));
    }

    for (i, text) in config.side_labels.iter().enumerate().take(3) {
        if text.trim().is_empty() {
            continue;
        }
        let mid = vertices[i].midpoint(vertices[(i + 1) % 3]);
        let outward = (mid - center).normalized().unwrap_or(Point::new(0.0, 1.0));
        diagram.push(Primitive::label(mid + outward * SIDE_LABEL_OFFSET, text.clone(), 13.0));
    }

    diagram
}

/// The vertex whose angle is closest to 90°, or `None` for a degenerate
/// triangle.
pub fn infer_right_angle(coords: &[(f64, f64)]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for i in 0..coords.len() {
        let v = Point::new(coords[i].0, coords[i].1);
        let a = Point::new(coords[(i + 1) % 3].0, coords[(i + 1) % 3].1) - v;
        let b = Point::new(coords[(i + 2) % 3].0, coords[(i + 2) % 3].1) - v;
        let (Some(a), Some(b)) = (a.normalized(), b.normalized()) else {
            continue;
        };
        let cos = (a.x * b.x + a.y * b.y).abs();
        if best.map_or(true, |(_, c)| cos < c) {
            best = Some((i, cos));
        }
    }
    best.map(|(i, _)| i)
}

fn fit_to_canvas(coords: &[(f64, f64)]) -> Vec<Point> {
    let (min_x, max_x) = bounds(coords.iter().map(|c| c.0));
    let (min_y, max_y) = bounds(coords.iter().map(|c| c.1));
    let span = (max_x - min_x).max(max_y - min_y);
    let scale = if span > 1e-9 { FIT_SIZE / span } else { 1.0 };
    let (mid_x, mid_y) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    coords
        .iter()
        .map(|&(x, y)| Point::new(CENTER + (x - mid_x) * scale, CENTER - (y - mid_y) * scale))
        .collect()
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

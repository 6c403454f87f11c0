//! Polygon scenes with coding overlays.

use mathdrill_core::model::{Coding, CodingKind, GeometryConfig, PointSpec};

use crate::primitives::{polyline_path, to_canvas, Diagram, Point, Primitive, Style};

const TICK_HALF_LENGTH: f64 = 6.0;
const DOUBLE_TICK_GAP: f64 = 3.0;
const RIGHT_ANGLE_SIZE: f64 = 12.0;
const LABEL_OFFSET: f64 = 14.0;
const LABEL_SIZE: f64 = 14.0;
const DOT_RADIUS: f64 = 3.0;
const STROKE: &str = "#1f2937";

/// Render a polygon with its codings, vertex labels and extra points.
///
/// Coordinates are offsets from the canvas center, multiplied by `scale`.
/// Fewer than three resolvable vertices renders nothing.
pub fn render_geometry(config: &GeometryConfig) -> Diagram {
    let scale = config
        .scale
        .value()
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(1.0);

    let Some(vertices) = resolve(&config.points, scale) else {
        tracing::debug!("geometry has unresolved vertices, nothing to draw");
        return Diagram::empty();
    };
    if vertices.len() < 3 {
        return Diagram::empty();
    }

    let mut diagram = Diagram::empty();
    diagram.push(Primitive::Path {
        d: polyline_path(&vertices, true),
        style: Style::fill("#e0f2fe").with_stroke(STROKE, 2.0),
    });

    for coding in &config.codings {
        diagram.primitives.extend(coding_marks(coding, &vertices));
    }

    let centroid = centroid(&vertices);
    for (i, (spec, p)) in config.points.iter().zip(&vertices).enumerate() {
        diagram.push(vertex_label(spec, i, *p, centroid));
    }

    for (j, spec) in config.extra_points.iter().enumerate() {
        let Some((x, y)) = spec.coords() else {
            continue;
        };
        let p = to_canvas(x, y, scale);
        diagram.push(Primitive::dot(p, DOT_RADIUS, STROKE));
        let text = spec
            .label
            .clone()
            .unwrap_or_else(|| letter_label(vertices.len() + j));
        diagram.push(Primitive::label(
            p + Point::new(8.0, -8.0),
            text,
            LABEL_SIZE,
        ));
    }

    diagram
}

/// Sequential vertex name: `A`..`Z`, then `A1`, `B1`, ...
pub fn letter_label(index: usize) -> String {
    let letter = char::from(b'A' + (index % 26) as u8);
    match index / 26 {
        0 => letter.to_string(),
        round => format!("{letter}{round}"),
    }
}

/// Canvas positions of every point, or `None` if any coordinate is still a
/// placeholder.
pub(crate) fn resolve(points: &[PointSpec], scale: f64) -> Option<Vec<Point>> {
    points
        .iter()
        .map(|p| p.coords().map(|(x, y)| to_canvas(x, y, scale)))
        .collect()
}

pub(crate) fn centroid(points: &[Point]) -> Point {
    let n = points.len().max(1) as f64;
    let sum = points
        .iter()
        .fold(Point::new(0.0, 0.0), |acc, p| acc + *p);
    sum * (1.0 / n)
}

/// Label for vertex `index`, pushed away from the polygon's centroid.
pub(crate) fn vertex_label(spec: &PointSpec, index: usize, at: Point, centroid: Point) -> Primitive {
    let outward = (at - centroid)
        .normalized()
        .unwrap_or(Point::new(0.0, -1.0));
    let text = spec.label.clone().unwrap_or_else(|| letter_label(index));
    Primitive::label(at + outward * LABEL_OFFSET, text, LABEL_SIZE)
}

/// Square-corner glyph at `vertex` between the edges towards `a` and `b`.
///
/// Returns `None` when either edge has zero length.
pub fn right_angle_marker(a: Point, vertex: Point, b: Point) -> Option<Primitive> {
    let u = (a - vertex).normalized()? * RIGHT_ANGLE_SIZE;
    let v = (b - vertex).normalized()? * RIGHT_ANGLE_SIZE;
    Some(Primitive::Path {
        d: polyline_path(&[vertex + u, vertex + u + v, vertex + v], false),
        style: Style::stroke(STROKE, 1.5),
    })
}

/// Strokes for one coding. Out-of-range indices and degenerate segments
/// produce nothing.
pub fn coding_marks(coding: &Coding, vertices: &[Point]) -> Vec<Primitive> {
    let at = |i: usize| coding.points.get(i).and_then(|&idx| vertices.get(idx)).copied();

    match coding.kind {
        CodingKind::Tick | CodingKind::DoubleTick => {
            let (Some(a), Some(b)) = (at(0), at(1)) else {
                return Vec::new();
            };
            let Some(dir) = (b - a).normalized() else {
                return Vec::new();
            };
            let mid = a.midpoint(b);
            let offsets: &[f64] = if coding.kind == CodingKind::Tick {
                &[0.0]
            } else {
                &[-DOUBLE_TICK_GAP, DOUBLE_TICK_GAP]
            };
            let normal = dir.perpendicular() * TICK_HALF_LENGTH;
            offsets
                .iter()
                .map(|&off| {
                    let center = mid + dir * off;
                    Primitive::line(center - normal, center + normal, STROKE, 1.5)
                })
                .collect()
        }
        CodingKind::RightAngle => match (at(0), at(1), at(2)) {
            (Some(a), Some(vertex), Some(b)) => right_angle_marker(a, vertex, b).into_iter().collect(),
            _ => Vec::new(),
        },
    }
}

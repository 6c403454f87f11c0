//! Drawing primitives in the fixed 300×300 logical canvas.
//!
//! The canvas origin is the top-left corner; mathematical coordinates are
//! placed relative to the center `(150, 150)` with the vertical axis
//! inverted, so mathematical "up" maps to decreasing canvas Y.

use std::ops::{Add, Mul, Sub};

use mathdrill_core::expr::format_number;
use serde::Serialize;

/// Logical canvas side length.
pub const CANVAS_SIZE: f64 = 300.0;

/// Canvas center on both axes.
pub const CENTER: f64 = CANVAS_SIZE / 2.0;

/// A point in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    pub fn normalized(self) -> Option<Point> {
        let len = self.length();
        (len > 1e-9 && len.is_finite()).then(|| Point::new(self.x / len, self.y / len))
    }

    /// The vector rotated a quarter turn.
    pub fn perpendicular(self) -> Point {
        Point::new(-self.y, self.x)
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    fn svg(self) -> String {
        format!("{} {}", format_number(self.x), format_number(self.y))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, k: f64) -> Point {
        Point::new(self.x * k, self.y * k)
    }
}

/// Map a mathematical offset from the canvas center into canvas space.
pub fn to_canvas(x: f64, y: f64, scale: f64) -> Point {
    Point::new(CENTER + x * scale, CENTER - y * scale)
}

/// Build a path through `points`, closed when `close` is set.
pub fn polyline_path(points: &[Point], close: bool) -> String {
    let mut d = String::new();
    for (i, p) in points.iter().enumerate() {
        d.push_str(if i == 0 { "M " } else { " L " });
        d.push_str(&p.svg());
    }
    if close && !d.is_empty() {
        d.push_str(" Z");
    }
    d
}

/// Fill and stroke settings shared by every primitive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Style {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl Style {
    pub fn stroke(color: &str, width: f64) -> Self {
        Self {
            fill: None,
            stroke: Some(color.to_string()),
            stroke_width: width,
            opacity: 1.0,
        }
    }

    pub fn fill(color: &str) -> Self {
        Self {
            fill: Some(color.to_string()),
            stroke: None,
            stroke_width: 0.0,
            opacity: 1.0,
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_stroke(mut self, color: &str, width: f64) -> Self {
        self.stroke = Some(color.to_string());
        self.stroke_width = width;
        self
    }

    fn svg_attrs(&self) -> String {
        let mut attrs = format!("fill=\"{}\"", escape(self.fill.as_deref().unwrap_or("none")));
        if let Some(stroke) = &self.stroke {
            attrs.push_str(&format!(
                " stroke=\"{}\" stroke-width=\"{}\"",
                escape(stroke),
                format_number(self.stroke_width)
            ));
        }
        if self.opacity < 1.0 {
            attrs.push_str(&format!(" opacity=\"{}\"", format_number(self.opacity)));
        }
        attrs
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
            Anchor::End => "end",
        }
    }
}

/// One drawable element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    Path {
        d: String,
        style: Style,
    },
    Line {
        from: Point,
        to: Point,
        style: Style,
    },
    Circle {
        center: Point,
        radius: f64,
        style: Style,
    },
    Text {
        at: Point,
        content: String,
        size: f64,
        color: String,
        bold: bool,
        anchor: Anchor,
    },
}

impl Primitive {
    pub fn line(from: Point, to: Point, color: &str, width: f64) -> Self {
        Primitive::Line {
            from,
            to,
            style: Style::stroke(color, width),
        }
    }

    pub fn dot(center: Point, radius: f64, color: &str) -> Self {
        Primitive::Circle {
            center,
            radius,
            style: Style::fill(color),
        }
    }

    pub fn label(at: Point, content: impl Into<String>, size: f64) -> Self {
        Primitive::Text {
            at,
            content: content.into(),
            size,
            color: "#111827".to_string(),
            bold: false,
            anchor: Anchor::Middle,
        }
    }

    fn to_svg(&self) -> String {
        match self {
            Primitive::Path { d, style } => {
                format!("<path d=\"{d}\" {}/>", style.svg_attrs())
            }
            Primitive::Line { from, to, style } => format!(
                "<line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" {}/>",
                format_number(from.x),
                format_number(from.y),
                format_number(to.x),
                format_number(to.y),
                style.svg_attrs()
            ),
            Primitive::Circle {
                center,
                radius,
                style,
            } => format!(
                "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" {}/>",
                format_number(center.x),
                format_number(center.y),
                format_number(*radius),
                style.svg_attrs()
            ),
            Primitive::Text {
                at,
                content,
                size,
                color,
                bold,
                anchor,
            } => format!(
                "<text x=\"{}\" y=\"{}\" font-size=\"{}\" fill=\"{}\" text-anchor=\"{}\" dominant-baseline=\"middle\"{}>{}</text>",
                format_number(at.x),
                format_number(at.y),
                format_number(*size),
                escape(color),
                anchor.as_str(),
                if *bold { " font-weight=\"bold\"" } else { "" },
                escape(content)
            ),
        }
    }
}

/// The rendered output of one visual configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagram {
    pub width: f64,
    pub height: f64,
    pub primitives: Vec<Primitive>,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::empty()
    }
}

impl Diagram {
    /// A diagram with no primitives.
    pub fn empty() -> Self {
        Self {
            width: CANVAS_SIZE,
            height: CANVAS_SIZE,
            primitives: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    /// Contents of every text primitive, in drawing order.
    pub fn texts(&self) -> Vec<&str> {
        self.primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Text { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Every path `d` attribute, in drawing order.
    pub fn paths(&self) -> Vec<&str> {
        self.primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Path { d, .. } => Some(d.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Standalone SVG document at the logical canvas size.
    pub fn to_svg(&self) -> String {
        self.to_svg_sized(self.width)
    }

    /// Standalone SVG document displayed at `size` pixels; the view box
    /// stays at the logical canvas size.
    pub fn to_svg_sized(&self, size: f64) -> String {
        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" font-family=\"sans-serif\">\n",
            format_number(size),
            format_number(size * self.height / self.width),
            format_number(self.width),
            format_number(self.height)
        );
        for primitive in &self.primitives {
            svg.push_str("  ");
            svg.push_str(&primitive.to_svg());
            svg.push('\n');
        }
        svg.push_str("</svg>\n");
        svg
    }
}

/// Escape a string for safe SVG/HTML insertion.
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_transform_inverts_y() {
        assert_eq!(to_canvas(0.0, 0.0, 1.0), Point::new(150.0, 150.0));
        assert_eq!(to_canvas(10.0, 20.0, 2.0), Point::new(170.0, 110.0));
    }

    #[test]
    fn zero_vector_has_no_direction() {
        assert_eq!(Point::new(0.0, 0.0).normalized(), None);
        assert_eq!(Point::new(3.0, 4.0).normalized(), Some(Point::new(0.6, 0.8)));
    }

    #[test]
    fn closed_polyline() {
        let d = polyline_path(
            &[Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(0.0, 5.5)],
            true,
        );
        assert_eq!(d, "M 0 0 L 10 0 L 0 5.5 Z");
        assert_eq!(polyline_path(&[], true), "");
    }

    #[test]
    fn svg_output_escapes_text() {
        let mut diagram = Diagram::empty();
        diagram.push(Primitive::label(Point::new(1.0, 2.0), "a<b", 12.0));
        diagram.push(Primitive::dot(Point::new(5.0, 5.0), 3.0, "#000"));
        let svg = diagram.to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("viewBox=\"0 0 300 300\""));
        assert!(svg.contains("a&lt;b"));
        assert!(svg.contains("<circle cx=\"5\" cy=\"5\" r=\"3\""));
        assert_eq!(diagram.texts(), vec!["a<b"]);
    }

    #[test]
    fn sized_svg_keeps_view_box() {
        let svg = Diagram::empty().to_svg_sized(600.0);
        assert!(svg.contains("width=\"600\" height=\"600\" viewBox=\"0 0 300 300\""));
    }
}

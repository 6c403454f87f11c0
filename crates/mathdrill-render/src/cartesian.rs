//! Cartesian plots with function traces.

use mathdrill_core::expr::{Bindings, Expr};
use mathdrill_core::model::CartesianConfig;

use crate::geometry::letter_label;
use crate::primitives::{Anchor, Diagram, Point, Primitive, Style, CANVAS_SIZE};

const MARGIN: f64 = 20.0;
const SAMPLES: usize = 150;
const MAX_GRID_LINES: f64 = 20.0;
const GRID_COLOR: &str = "#e5e7eb";
const AXIS_COLOR: &str = "#374151";
const TRACE_COLORS: [&str; 4] = ["#2563eb", "#dc2626", "#16a34a", "#9333ea"];

/// Maps plot coordinates onto the canvas.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl Viewport {
    pub fn to_canvas(&self, x: f64, y: f64) -> Point {
        let span = CANVAS_SIZE - 2.0 * MARGIN;
        Point::new(
            MARGIN + (x - self.x_min) / (self.x_max - self.x_min) * span,
            MARGIN + (self.y_max - y) / (self.y_max - self.y_min) * span,
        )
    }

    fn contains_y(&self, y: f64) -> bool {
        let slack = self.y_max - self.y_min;
        y >= self.y_min - slack && y <= self.y_max + slack
    }
}

/// Render axes, optional grid, function traces and points.
///
/// An empty or unresolved window renders nothing; a trace whose
/// expression does not parse is skipped.
pub fn render_cartesian(config: &CartesianConfig) -> Diagram {
    let bounds = (
        config.x_min.value(),
        config.x_max.value(),
        config.y_min.value(),
        config.y_max.value(),
    );
    let (Some(x_min), Some(x_max), Some(y_min), Some(y_max)) = bounds else {
        return Diagram::empty();
    };
    if x_max <= x_min || y_max <= y_min {
        return Diagram::empty();
    }
    if !(x_max - x_min).is_finite() || !(y_max - y_min).is_finite() {
        tracing::debug!(x_min, x_max, y_min, y_max, "window span overflows, nothing to draw");
        return Diagram::empty();
    }
    let view = Viewport {
        x_min,
        x_max,
        y_min,
        y_max,
    };

    let mut diagram = Diagram::empty();
    if config.grid {
        grid(&mut diagram, &view);
    }
    axes(&mut diagram, &view);

    for (i, trace) in config.functions.iter().enumerate() {
        let expr = match Expr::parse(&trace.expr) {
            Ok(expr) => expr,
            Err(e) => {
                tracing::warn!(expr = %trace.expr, error = %e, "skipping function trace");
                continue;
            }
        };
        let color = trace
            .color
            .clone()
            .unwrap_or_else(|| TRACE_COLORS[i % TRACE_COLORS.len()].to_string());
        let (d, last) = trace_path(&expr, &view);
        if d.is_empty() {
            continue;
        }
        diagram.push(Primitive::Path {
            d,
            style: Style::stroke(&color, 2.0),
        });
        if let (Some(label), Some(at)) = (&trace.label, last) {
            diagram.push(Primitive::Text {
                at: at + Point::new(-4.0, -10.0),
                content: label.clone(),
                size: 13.0,
                color,
                bold: false,
                anchor: Anchor::End,
            });
        }
    }

    for (i, spec) in config.points.iter().enumerate() {
        let Some((x, y)) = spec.coords() else {
            continue;
        };
        let p = view.to_canvas(x, y);
        diagram.push(Primitive::dot(p, 3.5, "#111827"));
        let text = spec.label.clone().unwrap_or_else(|| letter_label(i));
        diagram.push(Primitive::label(p + Point::new(8.0, -8.0), text, 12.0));
    }

    diagram
}

/// Sample `expr` over the window. Gaps (evaluation errors, values far off
/// screen) split the path into separate sub-paths.
fn trace_path(expr: &Expr, view: &Viewport) -> (String, Option<Point>) {
    let mut d = String::new();
    let mut pen_down = false;
    let mut last = None;
    let mut vars = Bindings::new();

    for k in 0..=SAMPLES {
        let x = view.x_min + (view.x_max - view.x_min) * k as f64 / SAMPLES as f64;
        vars.insert("x".to_string(), x);
        match expr.eval(&vars) {
            Ok(y) if view.contains_y(y) => {
                let p = view.to_canvas(x, y);
                if !d.is_empty() {
                    d.push(' ');
                }
                d.push_str(if pen_down { "L " } else { "M " });
                d.push_str(&format!("{:.2} {:.2}", p.x, p.y));
                pen_down = true;
                if y <= view.y_max && y >= view.y_min {
                    last = Some(p);
                }
            }
            _ => pen_down = false,
        }
    }
    (d, last)
}

fn grid_step(span: f64) -> f64 {
    let mut step = 1.0;
    // 1, 2, 5, 10, 20, 50, ...
    for factor in [2.0, 2.5, 2.0].into_iter().cycle() {
        if span / step <= MAX_GRID_LINES {
            break;
        }
        step *= factor;
    }
    step
}

fn grid(diagram: &mut Diagram, view: &Viewport) {
    for x in graduations(view.x_min, view.x_max) {
        diagram.push(Primitive::line(
            view.to_canvas(x, view.y_min),
            view.to_canvas(x, view.y_max),
            GRID_COLOR,
            1.0,
        ));
    }
    for y in graduations(view.y_min, view.y_max) {
        diagram.push(Primitive::line(
            view.to_canvas(view.x_min, y),
            view.to_canvas(view.x_max, y),
            GRID_COLOR,
            1.0,
        ));
    }
}

/// Multiples of the grid step inside `[min, max]`, at most
/// `MAX_GRID_LINES + 1` of them.
fn graduations(min: f64, max: f64) -> Vec<f64> {
    let step = grid_step(max - min);
    let start = (min / step).ceil() * step;
    (0..=MAX_GRID_LINES as usize)
        .map(|k| start + k as f64 * step)
        .take_while(|v| *v <= max)
        .collect()
}

fn axes(diagram: &mut Diagram, view: &Viewport) {
    if view.y_min <= 0.0 && view.y_max >= 0.0 {
        diagram.push(Primitive::line(
            view.to_canvas(view.x_min, 0.0),
            view.to_canvas(view.x_max, 0.0),
            AXIS_COLOR,
            1.5,
        ));
    }
    if view.x_min <= 0.0 && view.x_max >= 0.0 {
        diagram.push(Primitive::line(
            view.to_canvas(0.0, view.y_min),
            view.to_canvas(0.0, view.y_max),
            AXIS_COLOR,
            1.5,
        ));
    }
}

//! Number lines with highlighted intervals and marked values.

use mathdrill_core::expr::format_number;
use mathdrill_core::model::NumberLineConfig;

use crate::primitives::{Anchor, Diagram, Point, Primitive, Style, CANVAS_SIZE, CENTER};

const MARGIN: f64 = 30.0;
const MAX_TICKS: usize = 60;
const TICK_HEIGHT: f64 = 6.0;
const AXIS_COLOR: &str = "#1f2937";
const INTERVAL_COLOR: &str = "#2563eb";

/// Render a number line across the canvas width.
///
/// Unresolved bounds or an empty range render nothing.
pub fn render_number_line(config: &NumberLineConfig) -> Diagram {
    let (Some(min), Some(max)) = (config.min.value(), config.max.value()) else {
        return Diagram::empty();
    };
    if max <= min || !(max - min).is_finite() {
        return Diagram::empty();
    }
    let axis = Axis { min, max };

    let mut diagram = Diagram::empty();
    diagram.push(Primitive::line(
        Point::new(MARGIN - 10.0, CENTER),
        Point::new(CANVAS_SIZE - MARGIN + 10.0, CENTER),
        AXIS_COLOR,
        2.0,
    ));

    let step = config
        .step
        .value()
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(1.0);
    // Absorb float error so `0.3 / 0.1` still yields the last graduation.
    let count = ((max - min) / step + 1e-9).floor() as usize;
    if count <= MAX_TICKS {
        for k in 0..=count {
            let value = min + k as f64 * step;
            let x = axis.x(value);
            diagram.push(Primitive::line(
                Point::new(x, CENTER - TICK_HEIGHT),
                Point::new(x, CENTER + TICK_HEIGHT),
                AXIS_COLOR,
                1.0,
            ));
            diagram.push(Primitive::label(
                Point::new(x, CENTER + 20.0),
                format_number(value),
                11.0,
            ));
        }
    } else {
        tracing::debug!(count, "too many ticks, skipping graduations");
    }

    for interval in &config.intervals {
        let (Some(from), Some(to)) = (interval.from.value(), interval.to.value()) else {
            continue;
        };
        let color = interval.color.as_deref().unwrap_or(INTERVAL_COLOR);
        let (lo, hi) = (from.min(to).max(min), from.max(to).min(max));
        if lo > hi {
            continue;
        }
        diagram.push(Primitive::Line {
            from: Point::new(axis.x(lo), CENTER),
            to: Point::new(axis.x(hi), CENTER),
            style: Style::stroke(color, 6.0).with_opacity(0.6),
        });
        for (value, included) in [(from, interval.include_from), (to, interval.include_to)] {
            if value < min || value > max {
                continue;
            }
            let fill = if included { color } else { "#ffffff" };
            diagram.push(Primitive::Circle {
                center: Point::new(axis.x(value), CENTER),
                radius: 5.0,
                style: Style::fill(fill).with_stroke(color, 2.0),
            });
        }
    }

    for mark in &config.points {
        let Some(value) = mark.value.value() else {
            continue;
        };
        let at = Point::new(axis.x(value), CENTER);
        diagram.push(Primitive::dot(at, 4.0, "#dc2626"));
        if let Some(label) = &mark.label {
            diagram.push(Primitive::Text {
                at: Point::new(at.x, CENTER - 18.0),
                content: label.clone(),
                size: 13.0,
                color: "#dc2626".to_string(),
                bold: true,
                anchor: Anchor::Middle,
            });
        }
    }

    diagram
}

struct Axis {
    min: f64,
    max: f64,
}

impl Axis {
    fn x(&self, value: f64) -> f64 {
        MARGIN + (value - self.min) / (self.max - self.min) * (CANVAS_SIZE - 2.0 * MARGIN)
    }
}

//! Paired-angle scenes.
//!
//! Every scene is drawn around the canvas center. Wedges are named `a`,
//! `b` and `c`; labels and colors are looked up by those names.

use mathdrill_core::expr::format_number;
use mathdrill_core::model::AnglesConfig;
use mathdrill_core::normalize::{normalize_angles, AngleMode, AnglesScene, Relation};

use crate::primitives::{Anchor, Diagram, Point, Primitive, Style, CENTER};

const RAY_LENGTH: f64 = 120.0;
const WEDGE_RADIUS: f64 = 40.0;
const LABEL_RADIUS: f64 = 62.0;
const LABEL_SIZE: f64 = 14.0;
const UNKNOWN_SIZE: f64 = 24.0;
const UNKNOWN_LABEL: &str = "?";
const LINE_COLOR: &str = "#1f2937";

/// A filled sector between two ray directions.
struct Wedge {
    name: &'static str,
    start: f64,
    end: f64,
}

/// Normalize and render an angles configuration.
pub fn render_angles(config: &AnglesConfig) -> Diagram {
    render_scene(&normalize_angles(config))
}

/// Render a resolved scene.
pub fn render_scene(scene: &AnglesScene) -> Diagram {
    let angle = scene.angle;
    let (rays, wedges): (Vec<f64>, Vec<Wedge>) = match &scene.mode {
        AngleMode::XShape => {
            let a = Wedge { name: "a", start: 0.0, end: angle };
            let second = match scene.relation {
                Relation::Opposite => Wedge { name: "b", start: 180.0, end: 180.0 + angle },
                Relation::Adjacent => Wedge { name: "c", start: angle, end: 180.0 },
            };
            (vec![0.0, 180.0, angle, angle + 180.0], vec![a, second])
        }
        AngleMode::Complementary => (
            vec![0.0, angle, 90.0],
            vec![
                Wedge { name: "a", start: 0.0, end: angle },
                Wedge { name: "b", start: angle, end: 90.0 },
            ],
        ),
        AngleMode::Supplementary => (
            vec![0.0, angle, 180.0],
            vec![
                Wedge { name: "a", start: 0.0, end: angle },
                Wedge { name: "b", start: angle, end: 180.0 },
            ],
        ),
        AngleMode::Unrecognized(mode) => {
            tracing::warn!(mode = %mode, "unrecognized angle mode");
            return unrecognized(mode);
        }
    };

    let mut diagram = Diagram::empty();
    for wedge in &wedges {
        diagram.push(Primitive::Path {
            d: wedge_path(wedge.start, wedge.end, WEDGE_RADIUS),
            style: Style::fill(&color_for(scene, wedge.name)).with_opacity(0.45),
        });
    }
    for ray in rays {
        diagram.push(Primitive::line(
            Point::new(CENTER, CENTER),
            polar(ray, RAY_LENGTH),
            LINE_COLOR,
            2.0,
        ));
    }
    for wedge in &wedges {
        if let Some(label) = wedge_label(scene, wedge) {
            diagram.push(label);
        }
    }
    diagram
}

/// Canvas point at `degrees` (counter-clockwise from east) and `radius`
/// from the center.
pub fn polar(degrees: f64, radius: f64) -> Point {
    let rad = degrees.to_radians();
    Point::new(CENTER + radius * rad.cos(), CENTER - radius * rad.sin())
}

/// Whether the arc from `start` to `end`, swept counter-clockwise, spans
/// more than a semicircle.
pub fn large_arc(start: f64, end: f64) -> bool {
    (end - start).rem_euclid(360.0) > 180.0
}

/// Closed sector path from the center, swept counter-clockwise from `start`
/// to `end` degrees.
pub fn wedge_path(start: f64, end: f64, radius: f64) -> String {
    let from = polar(start, radius);
    let to = polar(end, radius);
    format!(
        "M {c} {c} L {} {} A {r} {r} 0 {} 0 {} {} Z",
        format_number(from.x),
        format_number(from.y),
        u8::from(large_arc(start, end)),
        format_number(to.x),
        format_number(to.y),
        c = format_number(CENTER),
        r = format_number(radius),
    )
}

fn color_for(scene: &AnglesScene, wedge: &str) -> String {
    scene.colors.get(wedge).cloned().unwrap_or_else(|| {
        match wedge {
            "a" => "#3b82f6",
            "b" => "#ef4444",
            _ => "#22c55e",
        }
        .to_string()
    })
}

fn wedge_label(scene: &AnglesScene, wedge: &Wedge) -> Option<Primitive> {
    let label = scene.labels.get(wedge.name)?.trim();
    let mid = wedge.start + (wedge.end - wedge.start).rem_euclid(360.0) / 2.0;
    let at = polar(mid, LABEL_RADIUS);

    if label == UNKNOWN_LABEL {
        return Some(Primitive::Text {
            at,
            content: UNKNOWN_LABEL.to_string(),
            size: UNKNOWN_SIZE,
            color: "#dc2626".to_string(),
            bold: true,
            anchor: Anchor::Middle,
        });
    }
    (!label.is_empty()).then(|| Primitive::label(at, label, LABEL_SIZE))
}

fn unrecognized(mode: &str) -> Diagram {
    let mut diagram = Diagram::empty();
    diagram.push(Primitive::Text {
        at: Point::new(CENTER, CENTER),
        content: format!("unsupported angle mode: {mode}"),
        size: LABEL_SIZE,
        color: "#dc2626".to_string(),
        bold: false,
        anchor: Anchor::Middle,
    });
    diagram
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scene(mode: AngleMode, relation: Relation, labels: &[(&str, &str)]) -> AnglesScene {
        AnglesScene {
            angle: 40.0,
            mode,
            relation,
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            colors: Default::default(),
        }
    }

    #[test]
    fn large_arc_boundary() {
        assert!(large_arc(10.0, 200.0));
        assert!(!large_arc(10.0, 190.0));
        assert!(!large_arc(0.0, 45.0));
        // Wraps through 0°.
        assert!(!large_arc(350.0, 20.0));
        assert!(large_arc(20.0, 0.0));
    }

    #[test]
    fn wedge_path_flags() {
        let d = wedge_path(10.0, 200.0, 40.0);
        assert!(d.starts_with("M 150 150 L "));
        assert!(d.contains(" A 40 40 0 1 0 "));
        assert!(wedge_path(10.0, 190.0, 40.0).contains(" A 40 40 0 0 0 "));
        assert!(d.ends_with(" Z"));
    }

    #[test]
    fn polar_inverts_y() {
        let p = polar(90.0, 100.0);
        assert!((p.x - 150.0).abs() < 1e-9);
        assert!((p.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn x_shape_relation_selects_wedges() {
        let opposite = render_scene(&scene(AngleMode::XShape, Relation::Opposite, &[]));
        let adjacent = render_scene(&scene(AngleMode::XShape, Relation::Adjacent, &[]));
        assert_eq!(opposite.paths().len(), 2);
        assert_eq!(adjacent.paths().len(), 2);
        assert_ne!(opposite.paths()[1], adjacent.paths()[1]);
    }

    #[test]
    fn question_mark_label_is_distinct() {
        let diagram = render_scene(&scene(
            AngleMode::Complementary,
            Relation::Adjacent,
            &[("a", "40°"), ("b", "?")],
        ));
        let texts: Vec<_> = diagram
            .primitives
            .iter()
            .filter_map(|p| match p {
                Primitive::Text { content, size, bold, .. } => Some((content.as_str(), *size, *bold)),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec![("40°", LABEL_SIZE, false), ("?", UNKNOWN_SIZE, true)]);
    }

    #[test]
    fn absent_or_blank_labels_are_skipped() {
        let diagram = render_scene(&scene(
            AngleMode::Supplementary,
            Relation::Adjacent,
            &[("a", "  ")],
        ));
        assert!(diagram.texts().is_empty());
        assert_eq!(diagram.paths().len(), 2);
    }

    #[test]
    fn unrecognized_mode_renders_diagnostic() {
        let diagram = render_scene(&scene(
            AngleMode::Unrecognized("TRIANGLE".into()),
            Relation::Adjacent,
            &[],
        ));
        assert_eq!(diagram.texts(), vec!["unsupported angle mode: TRIANGLE"]);
    }

    #[test]
    fn malformed_config_still_renders() {
        let config = AnglesConfig {
            angle: Some(json!("{a}°")),
            mode: Some(json!("undefined")),
            is_comp: Some(json!("1")),
            ..Default::default()
        };
        let diagram = render_angles(&config);
        assert_eq!(diagram.paths().len(), 2);
        // Complementary: base ray, angle ray, 90° ray.
        let lines = diagram
            .primitives
            .iter()
            .filter(|p| matches!(p, Primitive::Line { .. }))
            .count();
        assert_eq!(lines, 3);
    }
}

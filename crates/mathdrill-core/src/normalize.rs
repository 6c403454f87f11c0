//! Angle-diagram normalization.
//!
//! Resolves the loosely-typed categorical fields of an [`AnglesConfig`] into
//! an [`AnglesScene`]. Every input, however malformed, resolves to exactly
//! one scene so the renderer always has something to draw.
//!
//! Precedence, first match wins:
//!
//! | field    | explicit value usable | flag present           | otherwise |
//! |----------|-----------------------|------------------------|-----------|
//! | angle    | `angle`               | `angle1`               | 45        |
//! | mode     | `mode` verbatim       | `is_comp` truthy/falsy | X shape   |
//! | relation | `relation`            | `is_oppose` truthy     | adjacent  |
//!
//! An explicit value is usable when it is a non-empty string, not the
//! literal `"undefined"`, and free of unresolved `{`/`}` template braces.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::model::AnglesConfig;

/// Opening angle used when no usable magnitude is supplied.
pub const DEFAULT_ANGLE: f64 = 45.0;

/// Which paired-angle layout to draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AngleMode {
    /// Two crossing lines.
    XShape,
    /// Two angles summing to 90°.
    Complementary,
    /// Two angles summing to 180°.
    Supplementary,
    /// An explicit mode no renderer knows; drawn as a diagnostic.
    Unrecognized(String),
}

impl AngleMode {
    /// Interpret an explicit mode string.
    pub fn parse(s: &str) -> AngleMode {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "X_SHAPE" | "XSHAPE" | "X" => AngleMode::XShape,
            "COMPLEMENTARY" | "COMP" => AngleMode::Complementary,
            "SUPPLEMENTARY" | "SUPP" => AngleMode::Supplementary,
            _ => AngleMode::Unrecognized(s.to_string()),
        }
    }
}

impl fmt::Display for AngleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AngleMode::XShape => write!(f, "X_SHAPE"),
            AngleMode::Complementary => write!(f, "COMPLEMENTARY"),
            AngleMode::Supplementary => write!(f, "SUPPLEMENTARY"),
            AngleMode::Unrecognized(s) => write!(f, "{s}"),
        }
    }
}

/// Which pair of wedges an X-shape scene highlights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relation {
    Opposite,
    Adjacent,
}

impl Relation {
    fn parse(s: &str) -> Option<Relation> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPPOSITE" | "OPPOSE" => Some(Relation::Opposite),
            "ADJACENT" => Some(Relation::Adjacent),
            _ => None,
        }
    }
}

/// A fully resolved angle diagram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnglesScene {
    /// Opening angle in degrees.
    pub angle: f64,
    pub mode: AngleMode,
    pub relation: Relation,
    pub labels: BTreeMap<String, String>,
    pub colors: BTreeMap<String, String>,
}

/// Resolve every categorical field of `config`.
pub fn normalize_angles(config: &AnglesConfig) -> AnglesScene {
    let scene = AnglesScene {
        angle: resolve_angle(config),
        mode: resolve_mode(config),
        relation: resolve_relation(config),
        labels: config.labels.clone(),
        colors: config.colors.clone(),
    };
    tracing::debug!(
        angle = scene.angle,
        mode = %scene.mode,
        relation = ?scene.relation,
        "resolved angle scene"
    );
    scene
}

/// Opening angle: `angle`, else `angle1`, else 45. Text may carry a
/// trailing degree sign; anything that does not parse to a finite number
/// becomes 45.
pub fn resolve_angle(config: &AnglesConfig) -> f64 {
    present(&config.angle)
        .or_else(|| present(&config.angle1))
        .and_then(parse_degrees)
        .unwrap_or(DEFAULT_ANGLE)
}

/// Relationship mode, see the module table.
pub fn resolve_mode(config: &AnglesConfig) -> AngleMode {
    match (usable(&config.mode), present(&config.is_comp)) {
        (Some(mode), _) => AngleMode::parse(mode),
        (None, Some(flag)) if is_truthy(flag) => AngleMode::Complementary,
        (None, Some(_)) => AngleMode::Supplementary,
        (None, None) => AngleMode::XShape,
    }
}

/// Relation qualifier, see the module table.
pub fn resolve_relation(config: &AnglesConfig) -> Relation {
    match usable(&config.relation).and_then(Relation::parse) {
        Some(relation) => relation,
        None if present(&config.is_oppose).is_some_and(is_truthy) => Relation::Opposite,
        None => Relation::Adjacent,
    }
}

/// `true`, `"true"`, `"1"` and non-zero numbers are truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

/// Parse a degree value such as `35`, `"35"` or `"35°"`.
pub fn parse_degrees(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s
            .trim()
            .trim_end_matches('°')
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

/// The explicit string if it is usable (see the module docs).
fn usable(value: &Option<Value>) -> Option<&str> {
    let s = present(value)?.as_str()?.trim();
    let unresolved = s.is_empty() || s == "undefined" || s.contains(['{', '}']);
    (!unresolved).then_some(s)
}

fn present(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(fields: Value) -> AnglesConfig {
        let get = |k: &str| fields.get(k).cloned();
        AnglesConfig {
            angle: get("angle"),
            angle1: get("angle1"),
            mode: get("mode"),
            relation: get("relation"),
            is_comp: get("is_comp"),
            is_oppose: get("is_oppose"),
            ..Default::default()
        }
    }

    #[test]
    fn empty_config_is_x_shape() {
        let scene = normalize_angles(&config(json!({})));
        assert_eq!(scene.mode, AngleMode::XShape);
        assert_eq!(scene.relation, Relation::Adjacent);
        assert_eq!(scene.angle, DEFAULT_ANGLE);
    }

    #[test]
    fn string_one_is_complementary() {
        assert_eq!(
            resolve_mode(&config(json!({ "is_comp": "1" }))),
            AngleMode::Complementary
        );
    }

    #[test]
    fn falsy_flag_is_supplementary() {
        for flag in [json!(false), json!("false"), json!("0"), json!(0), json!("")] {
            assert_eq!(
                resolve_mode(&config(json!({ "is_comp": flag }))),
                AngleMode::Supplementary
            );
        }
    }

    #[test]
    fn undefined_mode_falls_through_to_flag() {
        assert_eq!(
            resolve_mode(&config(json!({ "mode": "undefined", "is_comp": true }))),
            AngleMode::Complementary
        );
        assert_eq!(
            resolve_mode(&config(json!({ "mode": "{mode}", "is_comp": "true" }))),
            AngleMode::Complementary
        );
        assert_eq!(
            resolve_mode(&config(json!({ "mode": "  ", "is_comp": false }))),
            AngleMode::Supplementary
        );
    }

    #[test]
    fn usable_mode_wins_over_flag() {
        assert_eq!(
            resolve_mode(&config(json!({ "mode": "supplementary", "is_comp": true }))),
            AngleMode::Supplementary
        );
        assert_eq!(
            resolve_mode(&config(json!({ "mode": "triangle" }))),
            AngleMode::Unrecognized("triangle".into())
        );
    }

    #[test]
    fn null_flag_counts_as_absent() {
        assert_eq!(
            resolve_mode(&config(json!({ "is_comp": null }))),
            AngleMode::XShape
        );
    }

    #[test]
    fn relation_inference() {
        assert_eq!(
            resolve_relation(&config(json!({ "is_oppose": "1" }))),
            Relation::Opposite
        );
        assert_eq!(
            resolve_relation(&config(json!({ "relation": "undefined", "is_oppose": true }))),
            Relation::Opposite
        );
        assert_eq!(
            resolve_relation(&config(json!({ "relation": "ADJACENT", "is_oppose": true }))),
            Relation::Adjacent
        );
        assert_eq!(resolve_relation(&config(json!({}))), Relation::Adjacent);
    }

    #[test]
    fn angle_precedence_and_parsing() {
        assert_eq!(resolve_angle(&config(json!({ "angle": "35°" }))), 35.0);
        assert_eq!(resolve_angle(&config(json!({ "angle": 12.5 }))), 12.5);
        assert_eq!(resolve_angle(&config(json!({ "angle1": "60" }))), 60.0);
        assert_eq!(
            resolve_angle(&config(json!({ "angle": 30, "angle1": 60 }))),
            30.0
        );
        assert_eq!(resolve_angle(&config(json!({ "angle": "{a}°" }))), DEFAULT_ANGLE);
        assert_eq!(resolve_angle(&config(json!({ "angle": "abc" }))), DEFAULT_ANGLE);
    }

    #[test]
    fn inference_is_deterministic() {
        let cfg = config(json!({ "mode": "undefined", "is_comp": "1", "angle": "20°" }));
        let first = normalize_angles(&cfg);
        for _ in 0..10 {
            assert_eq!(normalize_angles(&cfg), first);
        }
    }
}

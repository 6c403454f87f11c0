//! JSON exercise document validator.
//!
//! Loads exercise documents from JSON files and directories, checks every
//! field against the shape expected for the selected visual engine, and
//! coerces stringly-typed numerics. All shape violations are collected and
//! returned together.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::error::{FieldError, ValidationError};
use crate::expr::format_number;
use crate::model::{
    AnglesConfig, CartesianConfig, ChoiceOption, Coding, CodingKind, ExerciseDescriptor,
    FunctionTrace, GeometryConfig, Interval, LevelConfig, MarkedValue, NumberLineConfig, Numeric,
    PointSpec, PythagorasConfig, ResponseType, Variable, VisualConfig, VisualEngine,
};

/// Delimiter opening a deferred template expression.
pub const PLACEHOLDER_OPEN: char = '{';

const DEFAULT_XP: u32 = 5;

/// Coerce a loosely-typed numeric field.
///
/// Numbers pass through, numeric-looking strings are parsed (comma decimal
/// separators accepted), strings starting with `{` are kept as deferred
/// expressions. Anything else yields `None`.
pub fn coerce_numeric(value: &Value) -> Option<Numeric> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(Numeric::Value),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.starts_with(PLACEHOLDER_OPEN) {
                return Some(Numeric::Deferred(trimmed.to_string()));
            }
            trimmed
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Numeric::Value)
        }
        _ => None,
    }
}

/// Parse a single JSON file into an `ExerciseDescriptor`.
pub fn parse_exercise(path: &Path) -> Result<ExerciseDescriptor> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exercise file: {}", path.display()))?;

    parse_exercise_str(&content)
        .map_err(|e| anyhow::anyhow!("{}:\n{}", path.display(), e.diagnostic()))
}

/// Parse and validate a JSON string.
pub fn parse_exercise_str(content: &str) -> Result<ExerciseDescriptor, ValidationError> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| ValidationError::Syntax(e.to_string()))?;
    validate_exercise(&value)
}

/// Recursively list all `.json` files under a directory, sorted by path.
pub fn exercise_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            files.extend(exercise_files(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(files)
}

/// Recursively load all `.json` exercise files from a directory.
///
/// Invalid documents are skipped with a warning.
pub fn load_exercise_directory(dir: &Path) -> Result<Vec<ExerciseDescriptor>> {
    let mut exercises = Vec::new();
    for path in exercise_files(dir)? {
        match parse_exercise(&path) {
            Ok(exercise) => exercises.push(exercise),
            Err(e) => {
                tracing::warn!("skipping {}: {}", path.display(), e);
            }
        }
    }
    Ok(exercises)
}

/// Validate an already-parsed exercise document.
pub fn validate_exercise(doc: &Value) -> Result<ExerciseDescriptor, ValidationError> {
    let mut ck = Checker::default();

    let Some(root) = doc.as_object() else {
        return Err(ValidationError::Shape(vec![FieldError::new(
            "$",
            "expected an exercise object",
        )]));
    };

    let id = ck.required_string(root, "", "id").unwrap_or_default();
    let title = ck.opt_string(root, "", "title");

    let visual_engine = match present(root, "visual_engine") {
        None => VisualEngine::None,
        Some(Value::String(s)) => s.parse().unwrap_or_else(|_| {
            ck.fail(
                "visual_engine",
                format!(
                    "unknown visual engine `{s}` (expected one of {})",
                    VisualEngine::ALL.map(|e| e.to_string()).join(", ")
                ),
            );
            VisualEngine::None
        }),
        Some(_) => {
            ck.fail("visual_engine", "expected a string");
            VisualEngine::None
        }
    };

    let visual_template = ck.opt_object(root, "", "visual_config").unwrap_or_default();

    let mut levels = Vec::new();
    match present(root, "levels") {
        None => ck.fail("levels", "required field is missing"),
        Some(Value::Object(map)) if map.is_empty() => {
            ck.fail("levels", "at least one level is required")
        }
        Some(Value::Object(map)) => {
            for (level_id, level) in map {
                let path = join("levels", level_id);
                if let Some(level) =
                    validate_level(&mut ck, &path, level_id, level, visual_engine, &visual_template)
                {
                    levels.push(level);
                }
            }
        }
        Some(_) => ck.fail("levels", "expected an object keyed by level id"),
    }

    ck.finish(ExerciseDescriptor {
        id,
        title,
        visual_engine,
        visual_template,
        levels,
    })
}

/// Validate a standalone visual configuration for `engine`.
///
/// Field paths are reported under `visual_config`.
pub fn validate_visual(engine: VisualEngine, config: &Value) -> Result<VisualConfig, ValidationError> {
    let mut ck = Checker::default();
    let empty = Map::new();
    let map = match config {
        Value::Null => &empty,
        Value::Object(map) => map,
        _ => {
            return Err(ValidationError::Shape(vec![FieldError::new(
                "visual_config",
                "expected an object",
            )]))
        }
    };
    let origin = Origin {
        template_path: "visual_config",
        template: map,
        level: None,
    };
    let visual = visual_for_engine(&mut ck, &origin, engine, map);
    ck.finish(visual)
}

/// Shallow-merge a level override over the common template.
pub fn merge_visual(template: &Map<String, Value>, level: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = template.clone();
    for (key, value) in level {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn validate_level(
    ck: &mut Checker,
    path: &str,
    id: &str,
    value: &Value,
    engine: VisualEngine,
    template: &Map<String, Value>,
) -> Option<LevelConfig> {
    let Some(level) = value.as_object() else {
        ck.fail(path, "expected a level object");
        return None;
    };

    let mut variables = Vec::new();
    if let Some(vars) = ck.opt_object(level, path, "variables") {
        for (name, formula) in &vars {
            match scalar_text(formula) {
                Some(formula) => variables.push(Variable {
                    name: name.clone(),
                    formula,
                }),
                None => ck.fail(
                    join(&join(path, "variables"), name),
                    "expected a formula string",
                ),
            }
        }
    }

    let question = ck.required_string(level, path, "question").unwrap_or_default();
    let explanation = ck.opt_string(level, path, "explanation");

    let response_type = match ck.opt_string(level, path, "response_type") {
        None => ResponseType::default(),
        Some(s) => s.parse().unwrap_or_else(|e: String| {
            ck.fail(join(path, "response_type"), e);
            ResponseType::default()
        }),
    };

    let correct_answer = match present(level, "correct_answer") {
        None => {
            ck.fail(join(path, "correct_answer"), "required field is missing");
            String::new()
        }
        Some(v) => scalar_text(v).unwrap_or_else(|| {
            ck.fail(join(path, "correct_answer"), "expected a string or number");
            String::new()
        }),
    };

    let options_path = join(path, "options");
    let mut options = Vec::new();
    if let Some(items) = ck.opt_array(level, path, "options") {
        for (i, item) in items.iter().enumerate() {
            let item_path = join(&options_path, &i.to_string());
            let Some(obj) = ck.object(&item_path, item) else {
                continue;
            };
            let text = match present(obj, "text").map(scalar_text) {
                Some(Some(text)) => text,
                Some(None) => {
                    ck.fail(join(&item_path, "text"), "expected a string or number");
                    continue;
                }
                None => {
                    ck.fail(join(&item_path, "text"), "required field is missing");
                    continue;
                }
            };
            let correct = ck.opt_bool(obj, &item_path, "correct").unwrap_or(false);
            options.push(ChoiceOption { text, correct });
        }
    }
    if response_type == ResponseType::MultipleChoice && !options.iter().any(|o| o.correct) {
        ck.fail(
            &options_path,
            "multiple-choice level needs at least one correct option",
        );
    }

    let xp = match present(level, "xp") {
        None => DEFAULT_XP,
        Some(v) => match coerce_numeric(v) {
            Some(Numeric::Value(xp)) if xp >= 0.0 && xp.fract() == 0.0 => xp as u32,
            None if v.is_string() => {
                tracing::debug!(level = id, value = %v, "unparseable xp, using default");
                DEFAULT_XP
            }
            _ => {
                ck.fail(join(path, "xp"), "expected a non-negative whole number");
                DEFAULT_XP
            }
        },
    };

    let level_path = join(path, "visual_config");
    let overrides = ck.opt_object(level, path, "visual_config").unwrap_or_default();
    let visual_source = merge_visual(template, &overrides);
    let origin = Origin {
        template_path: "visual_config",
        template,
        level: Some((level_path.as_str(), &overrides)),
    };
    let visual = visual_for_engine(ck, &origin, engine, &visual_source);

    Some(LevelConfig {
        id: id.to_string(),
        variables,
        question,
        explanation,
        response_type,
        correct_answer,
        options,
        xp,
        visual_source,
        visual,
    })
}

fn visual_for_engine(
    ck: &mut Checker,
    origin: &Origin<'_>,
    engine: VisualEngine,
    map: &Map<String, Value>,
) -> VisualConfig {
    match engine {
        VisualEngine::None => VisualConfig::Opaque {
            fields: map.clone(),
        },
        VisualEngine::Pythagoras => VisualConfig::Pythagoras(pythagoras(ck, origin, map)),
        VisualEngine::NumberLine => VisualConfig::NumberLine(number_line(ck, origin, map)),
        VisualEngine::Cartesian => VisualConfig::Cartesian(cartesian(ck, origin, map)),
        VisualEngine::Geometry => VisualConfig::Geometry(geometry(ck, origin, map)),
        VisualEngine::Angles => VisualConfig::Angles(angles(ck, origin, map)),
    }
}

fn pythagoras(ck: &mut Checker, origin: &Origin<'_>, map: &Map<String, Value>) -> PythagorasConfig {
    const KNOWN: &[&str] = &["points", "right_angle", "side_labels"];

    let points_path = origin.path("points");
    let points = match present(map, "points") {
        Some(v) => ck.point_list(&points_path, v),
        None => {
            ck.fail(&points_path, "required field is missing");
            Vec::new()
        }
    };
    if present(map, "points").is_some_and(Value::is_array) && points.len() != 3 {
        ck.fail(&points_path, format!("expected exactly 3 points, got {}", points.len()));
    }

    let right_angle = present(map, "right_angle")
        .and_then(|v| ck.index(&origin.path("right_angle"), v, points.len()));

    let mut side_labels = Vec::new();
    if let Some(v) = present(map, "side_labels") {
        let path = origin.path("side_labels");
        match v.as_array() {
            Some(items) if items.len() <= 3 => {
                for (i, item) in items.iter().enumerate() {
                    match scalar_text(item) {
                        Some(label) => side_labels.push(label),
                        None => ck.fail(join(&path, &i.to_string()), "expected a string"),
                    }
                }
            }
            Some(items) => ck.fail(&path, format!("expected at most 3 labels, got {}", items.len())),
            None => ck.fail(&path, "expected an array"),
        }
    }

    PythagorasConfig {
        points,
        right_angle,
        side_labels,
        extra: extra_fields(map, KNOWN),
    }
}

fn number_line(ck: &mut Checker, origin: &Origin<'_>, map: &Map<String, Value>) -> NumberLineConfig {
    const KNOWN: &[&str] = &["min", "max", "step", "intervals", "points"];

    let min = ck.required_numeric(map, origin, "min");
    let max = ck.required_numeric(map, origin, "max");
    let step = ck.numeric_or(map, origin, "step", 1.0);
    if let (Some(lo), Some(hi)) = (literal(&min), literal(&max)) {
        if lo >= hi {
            ck.fail(origin.path("max"), "must be greater than min");
        }
    }
    if literal(&step).is_some_and(|s| s <= 0.0) {
        ck.fail(origin.path("step"), "must be positive");
    }

    let mut intervals = Vec::new();
    if let Some(items) = present(map, "intervals") {
        let path = origin.path("intervals");
        for (_, item_path, obj) in ck.objects(&path, items) {
            intervals.push(Interval {
                from: or_zero(ck.required_numeric_at(obj, &item_path, "from")),
                to: or_zero(ck.required_numeric_at(obj, &item_path, "to")),
                include_from: ck.opt_bool(obj, &item_path, "include_from").unwrap_or(true),
                include_to: ck.opt_bool(obj, &item_path, "include_to").unwrap_or(true),
                color: ck.opt_string(obj, &item_path, "color"),
            });
        }
    }

    let mut points = Vec::new();
    if let Some(items) = present(map, "points") {
        let path = origin.path("points");
        for (_, item_path, obj) in ck.objects(&path, items) {
            points.push(MarkedValue {
                value: or_zero(ck.required_numeric_at(obj, &item_path, "value")),
                label: ck.opt_string(obj, &item_path, "label"),
            });
        }
    }

    NumberLineConfig {
        min: or_zero(min),
        max: or_zero(max),
        step: step.unwrap_or(Numeric::Value(1.0)),
        intervals,
        points,
        extra: extra_fields(map, KNOWN),
    }
}

fn cartesian(ck: &mut Checker, origin: &Origin<'_>, map: &Map<String, Value>) -> CartesianConfig {
    const KNOWN: &[&str] = &["x_min", "x_max", "y_min", "y_max", "grid", "functions", "points"];

    let x_min = ck.numeric_or(map, origin, "x_min", -10.0);
    let x_max = ck.numeric_or(map, origin, "x_max", 10.0);
    let y_min = ck.numeric_or(map, origin, "y_min", -10.0);
    let y_max = ck.numeric_or(map, origin, "y_max", 10.0);
    for (lo, hi, key) in [(&x_min, &x_max, "x_max"), (&y_min, &y_max, "y_max")] {
        if let (Some(lo), Some(hi)) = (literal(lo), literal(hi)) {
            if lo >= hi {
                ck.fail(origin.path(key), "range is empty");
            }
        }
    }

    let grid = match present(map, "grid") {
        None => true,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            ck.fail(origin.path("grid"), "expected a boolean");
            true
        }
    };

    let mut functions = Vec::new();
    if let Some(items) = present(map, "functions") {
        let path = origin.path("functions");
        for (_, item_path, obj) in ck.objects(&path, items) {
            let Some(expr) = ck.required_string(obj, &item_path, "expr") else {
                continue;
            };
            functions.push(FunctionTrace {
                expr,
                color: ck.opt_string(obj, &item_path, "color"),
                label: ck.opt_string(obj, &item_path, "label"),
            });
        }
    }

    let points = match present(map, "points") {
        Some(v) => ck.point_list(&origin.path("points"), v),
        None => Vec::new(),
    };

    CartesianConfig {
        x_min: x_min.unwrap_or(Numeric::Value(-10.0)),
        x_max: x_max.unwrap_or(Numeric::Value(10.0)),
        y_min: y_min.unwrap_or(Numeric::Value(-10.0)),
        y_max: y_max.unwrap_or(Numeric::Value(10.0)),
        grid,
        functions,
        points,
        extra: extra_fields(map, KNOWN),
    }
}

fn geometry(ck: &mut Checker, origin: &Origin<'_>, map: &Map<String, Value>) -> GeometryConfig {
    const KNOWN: &[&str] = &["points", "extra_points", "codings", "scale"];

    let points_path = origin.path("points");
    let points = match present(map, "points") {
        Some(v) => ck.point_list(&points_path, v),
        None => {
            ck.fail(&points_path, "required field is missing");
            Vec::new()
        }
    };
    if present(map, "points").is_some_and(Value::is_array) && points.len() < 3 {
        ck.fail(&points_path, format!("expected at least 3 points, got {}", points.len()));
    }

    let extra_points = match present(map, "extra_points") {
        Some(v) => ck.point_list(&origin.path("extra_points"), v),
        None => Vec::new(),
    };

    let mut codings = Vec::new();
    if let Some(items) = present(map, "codings") {
        let path = origin.path("codings");
        for (_, item_path, obj) in ck.objects(&path, items) {
            let kind = match ck.required_string(obj, &item_path, "type") {
                Some(s) => match s.parse::<CodingKind>() {
                    Ok(kind) => kind,
                    Err(e) => {
                        ck.fail(join(&item_path, "type"), e);
                        continue;
                    }
                },
                None => continue,
            };
            let refs_path = join(&item_path, "points");
            let Some(refs) = present(obj, "points") else {
                ck.fail(&refs_path, "required field is missing");
                continue;
            };
            let Some(refs) = refs.as_array() else {
                ck.fail(&refs_path, "expected an array of point indices");
                continue;
            };
            if refs.len() != kind.arity() {
                ck.fail(
                    &refs_path,
                    format!("expected {} point indices, got {}", kind.arity(), refs.len()),
                );
                continue;
            }
            let indices: Vec<usize> = refs
                .iter()
                .enumerate()
                .filter_map(|(i, r)| ck.index(&join(&refs_path, &i.to_string()), r, points.len()))
                .collect();
            if indices.len() == kind.arity() {
                codings.push(Coding {
                    kind,
                    points: indices,
                });
            }
        }
    }

    let scale = ck.numeric_or(map, origin, "scale", 1.0);
    if literal(&scale).is_some_and(|s| s <= 0.0) {
        ck.fail(origin.path("scale"), "must be positive");
    }

    GeometryConfig {
        points,
        extra_points,
        codings,
        scale: scale.unwrap_or(Numeric::Value(1.0)),
        extra: extra_fields(map, KNOWN),
    }
}

fn angles(ck: &mut Checker, origin: &Origin<'_>, map: &Map<String, Value>) -> AnglesConfig {
    const KNOWN: &[&str] = &[
        "angle", "angle1", "mode", "relation", "is_comp", "is_oppose", "labels", "colors",
    ];

    let mut loose = |key: &str, accepts: fn(&Value) -> bool, expected: &str| {
        let value = present(map, key)?;
        if accepts(value) {
            Some(value.clone())
        } else {
            ck.fail(origin.path(key), format!("expected {expected}"));
            None
        }
    };
    let number_or_text = |v: &Value| v.is_number() || v.is_string();
    let flag = |v: &Value| v.is_boolean() || v.is_string() || v.is_number();

    let angle = loose("angle", number_or_text, "a number or string");
    let angle1 = loose("angle1", number_or_text, "a number or string");
    let mode = loose("mode", Value::is_string, "a string");
    let relation = loose("relation", Value::is_string, "a string");
    let is_comp = loose("is_comp", flag, "a boolean, string or number");
    let is_oppose = loose("is_oppose", flag, "a boolean, string or number");

    let labels = ck.string_map(map, origin, "labels");
    let colors = ck.string_map(map, origin, "colors");

    AnglesConfig {
        angle,
        angle1,
        mode,
        relation,
        is_comp,
        is_oppose,
        labels,
        colors,
        extra: extra_fields(map, KNOWN),
    }
}

/// Decides which path a top-level visual field is reported under: the
/// level override when it supplies (or should supply) the field, the common
/// template otherwise.
struct Origin<'a> {
    template_path: &'a str,
    template: &'a Map<String, Value>,
    level: Option<(&'a str, &'a Map<String, Value>)>,
}

impl Origin<'_> {
    fn path(&self, key: &str) -> String {
        match self.level {
            Some((level_path, overrides))
                if overrides.contains_key(key) || !self.template.contains_key(key) =>
            {
                join(level_path, key)
            }
            _ => join(self.template_path, key),
        }
    }
}

/// Collects field errors while walking a document.
#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        let err = FieldError::new(path, reason);
        // Template fields are checked once per level; report each only once.
        if !self.errors.contains(&err) {
            self.errors.push(err);
        }
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ValidationError::Shape(self.errors))
        }
    }

    fn object<'v>(&mut self, path: &str, value: &'v Value) -> Option<&'v Map<String, Value>> {
        let obj = value.as_object();
        if obj.is_none() {
            self.fail(path, "expected an object");
        }
        obj
    }

    /// Each element of an array that is an object, with its index and path.
    fn objects<'v>(
        &mut self,
        path: &str,
        value: &'v Value,
    ) -> Vec<(usize, String, &'v Map<String, Value>)> {
        let Some(items) = value.as_array() else {
            self.fail(path, "expected an array");
            return Vec::new();
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                let item_path = join(path, &i.to_string());
                self.object(&item_path, item).map(|obj| (i, item_path, obj))
            })
            .collect()
    }

    fn opt_object(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Option<Map<String, Value>> {
        let value = present(obj, key)?;
        self.object(&join(path, key), value).cloned()
    }

    fn opt_array<'v>(
        &mut self,
        obj: &'v Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Option<&'v Vec<Value>> {
        let value = present(obj, key)?;
        let items = value.as_array();
        if items.is_none() {
            self.fail(join(path, key), "expected an array");
        }
        items
    }

    fn required_string(&mut self, obj: &Map<String, Value>, path: &str, key: &str) -> Option<String> {
        match present(obj, key) {
            None => {
                self.fail(join(path, key), "required field is missing");
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.fail(join(path, key), "expected a string");
                None
            }
        }
    }

    fn opt_string(&mut self, obj: &Map<String, Value>, path: &str, key: &str) -> Option<String> {
        match present(obj, key)? {
            Value::String(s) => Some(s.clone()),
            _ => {
                self.fail(join(path, key), "expected a string");
                None
            }
        }
    }

    fn opt_bool(&mut self, obj: &Map<String, Value>, path: &str, key: &str) -> Option<bool> {
        match present(obj, key)? {
            Value::Bool(b) => Some(*b),
            _ => {
                self.fail(join(path, key), "expected a boolean");
                None
            }
        }
    }

    fn numeric(&mut self, path: &str, value: &Value) -> Option<Numeric> {
        let numeric = coerce_numeric(value);
        if numeric.is_none() {
            self.fail(path, "expected a number or placeholder");
        }
        numeric
    }

    fn required_numeric_at(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
        key: &str,
    ) -> Option<Numeric> {
        let path = join(path, key);
        match present(obj, key) {
            Some(v) => self.numeric(&path, v),
            None => {
                self.fail(path, "required field is missing");
                None
            }
        }
    }

    fn required_numeric(
        &mut self,
        map: &Map<String, Value>,
        origin: &Origin<'_>,
        key: &str,
    ) -> Option<Numeric> {
        let path = origin.path(key);
        match present(map, key) {
            Some(v) => self.numeric(&path, v),
            None => {
                self.fail(path, "required field is missing");
                None
            }
        }
    }

    fn numeric_or(
        &mut self,
        map: &Map<String, Value>,
        origin: &Origin<'_>,
        key: &str,
        default: f64,
    ) -> Option<Numeric> {
        match present(map, key) {
            Some(v) if v.is_string() => coerce_numeric(v).or_else(|| {
                tracing::debug!(field = key, value = %v, "unparseable optional number, using default");
                Some(Numeric::Value(default))
            }),
            Some(v) => self.numeric(&origin.path(key), v),
            None => Some(Numeric::Value(default)),
        }
    }

    fn index(&mut self, path: &str, value: &Value, len: usize) -> Option<usize> {
        match value.as_u64() {
            Some(i) if (i as usize) < len => Some(i as usize),
            Some(i) => {
                self.fail(path, format!("index {i} out of range ({len} points)"));
                None
            }
            None => {
                self.fail(path, "expected a point index");
                None
            }
        }
    }

    fn point_list(&mut self, path: &str, value: &Value) -> Vec<PointSpec> {
        self.objects(path, value)
            .into_iter()
            .map(|(_, item_path, obj)| PointSpec {
                x: or_zero(self.required_numeric_at(obj, &item_path, "x")),
                y: or_zero(self.required_numeric_at(obj, &item_path, "y")),
                label: match present(obj, "label") {
                    None => None,
                    Some(v) => scalar_text(v).or_else(|| {
                        self.fail(join(&item_path, "label"), "expected a string");
                        None
                    }),
                },
            })
            .collect()
    }

    fn string_map(
        &mut self,
        map: &Map<String, Value>,
        origin: &Origin<'_>,
        key: &str,
    ) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        let Some(value) = present(map, key) else {
            return out;
        };
        let path = origin.path(key);
        let Some(obj) = self.object(&path, value) else {
            return out;
        };
        for (k, v) in obj {
            match scalar_text(v) {
                Some(text) => {
                    out.insert(k.clone(), text);
                }
                None => self.fail(join(&path, k), "expected a string"),
            }
        }
        out
    }
}

/// A field that is present and not `null`.
fn present<'v>(obj: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    obj.get(key).filter(|v| !v.is_null())
}

/// Literal value of a successfully coerced numeric field.
fn literal(numeric: &Option<Numeric>) -> Option<f64> {
    numeric.as_ref().and_then(Numeric::value)
}

/// Stand-in for a field that already produced an error.
fn or_zero(numeric: Option<Numeric>) -> Numeric {
    numeric.unwrap_or(Numeric::Value(0.0))
}

/// Text of a string or number value.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_f64().map(format_number),
        _ => None,
    }
}

fn extra_fields(map: &Map<String, Value>, known: &[&str]) -> Map<String, Value> {
    map.iter()
        .filter(|(k, _)| !known.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ANGLES_DOC: &str = r#"{
        "id": "angles-01",
        "title": "Angles complémentaires",
        "visual_engine": "ANGLES",
        "visual_config": { "angle": "{a}°", "is_comp": "1", "labels": { "a": "{a}°", "b": "?" } },
        "levels": {
            "1": {
                "variables": { "a": "randint(20, 70)" },
                "question": "Calculer l'angle manquant.",
                "correct_answer": "{90-a}"
            }
        }
    }"#;

    fn geometry_doc(visual: Value) -> Value {
        json!({
            "id": "geo",
            "visual_engine": "GEOMETRY",
            "visual_config": visual,
            "levels": { "1": { "question": "?", "correct_answer": 1 } }
        })
    }

    #[test]
    fn parse_valid_angles_document() {
        let ex = parse_exercise_str(ANGLES_DOC).unwrap();
        assert_eq!(ex.id, "angles-01");
        assert_eq!(ex.visual_engine, VisualEngine::Angles);
        assert_eq!(ex.levels.len(), 1);
        let level = ex.first_level().unwrap();
        assert_eq!(level.xp, 5);
        assert_eq!(level.response_type, ResponseType::Numeric);
        assert_eq!(level.variables[0].name, "a");
        let VisualConfig::Angles(cfg) = &level.visual else {
            panic!("expected angles config");
        };
        assert_eq!(cfg.is_comp, Some(json!("1")));
        assert_eq!(cfg.labels.get("b").map(String::as_str), Some("?"));
    }

    #[test]
    fn coerce_numeric_strings() {
        assert_eq!(coerce_numeric(&json!(3)), Some(Numeric::Value(3.0)));
        assert_eq!(coerce_numeric(&json!("2.5")), Some(Numeric::Value(2.5)));
        assert_eq!(coerce_numeric(&json!(" 2,5 ")), Some(Numeric::Value(2.5)));
        assert_eq!(
            coerce_numeric(&json!("{a*2}")),
            Some(Numeric::Deferred("{a*2}".into()))
        );
        assert_eq!(coerce_numeric(&json!("abc")), None);
        assert_eq!(coerce_numeric(&json!(true)), None);
    }

    #[test]
    fn malformed_json_is_a_syntax_error() {
        let err = parse_exercise_str("{ \"id\": ").unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let doc = json!({
            "id": "x",
            "visual_engine": "SPHERES",
            "levels": { "1": { "question": "?", "correct_answer": "1" } }
        });
        let err = validate_exercise(&doc).unwrap_err();
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].path, "visual_engine");
    }

    #[test]
    fn at_least_one_level() {
        let err = validate_exercise(&json!({ "id": "x", "levels": {} })).unwrap_err();
        assert_eq!(
            err.diagnostic(),
            "[levels] : at least one level is required"
        );
    }

    #[test]
    fn three_invalid_fields_give_three_errors() {
        let doc = geometry_doc(json!({
            "points": [
                { "x": "abc", "y": 0 },
                { "x": 4, "y": [1] },
                { "x": 0 }
            ]
        }));
        let err = validate_exercise(&doc).unwrap_err();
        let paths: Vec<&str> = err.field_errors().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "visual_config.points.0.x",
                "visual_config.points.1.y",
                "visual_config.points.2.y"
            ]
        );
    }

    #[test]
    fn unparseable_optional_numbers_use_defaults() {
        let doc = json!({
            "id": "geo",
            "visual_engine": "GEOMETRY",
            "visual_config": {
                "points": [ { "x": 0, "y": 0 }, { "x": 4, "y": 0 }, { "x": 0, "y": 3 } ],
                "scale": "big"
            },
            "levels": { "1": { "question": "?", "correct_answer": 1, "xp": "lots" } }
        });
        let ex = validate_exercise(&doc).unwrap();
        let level = ex.first_level().unwrap();
        assert_eq!(level.xp, 5);
        match &level.visual {
            VisualConfig::Geometry(g) => assert_eq!(g.scale, Numeric::Value(1.0)),
            other => panic!("unexpected visual {other:?}"),
        }

        let line = validate_visual(
            VisualEngine::NumberLine,
            &json!({ "min": 0, "max": 10, "step": "often" }),
        )
        .unwrap();
        match line {
            VisualConfig::NumberLine(n) => assert_eq!(n.step, Numeric::Value(1.0)),
            other => panic!("unexpected visual {other:?}"),
        }
    }

    #[test]
    fn wrong_type_for_optional_number_still_fails() {
        let doc = geometry_doc(json!({
            "points": [ { "x": 0, "y": 0 }, { "x": 4, "y": 0 }, { "x": 0, "y": 3 } ],
            "scale": [2]
        }));
        let err = validate_exercise(&doc).unwrap_err();
        assert_eq!(err.diagnostic(), "[visual_config.scale] : expected a number or placeholder");
    }

    #[test]
    fn unparseable_required_number_fails() {
        let err = validate_visual(VisualEngine::NumberLine, &json!({ "min": "low", "max": 10 }))
            .unwrap_err();
        assert_eq!(err.diagnostic(), "[visual_config.min] : expected a number or placeholder");
    }

    #[test]
    fn template_errors_reported_once_across_levels() {
        let doc = json!({
            "id": "geo",
            "visual_engine": "GEOMETRY",
            "visual_config": { "points": [ { "x": 0, "y": 0 }, { "x": 1, "y": 0 }, { "x": "?", "y": 1 } ] },
            "levels": {
                "1": { "question": "?", "correct_answer": 1 },
                "2": { "question": "?", "correct_answer": 2 }
            }
        });
        let err = validate_exercise(&doc).unwrap_err();
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].path, "visual_config.points.2.x");
    }

    #[test]
    fn level_override_errors_use_level_path() {
        let doc = json!({
            "id": "nl",
            "visual_engine": "NUMBER_LINE",
            "visual_config": { "min": 0, "max": 10 },
            "levels": {
                "1": { "question": "?", "correct_answer": 1, "visual_config": { "max": "ten" } }
            }
        });
        let err = validate_exercise(&doc).unwrap_err();
        assert_eq!(
            err.diagnostic(),
            "[levels.1.visual_config.max] : expected a number or placeholder"
        );
    }

    #[test]
    fn missing_required_field_reported_under_level() {
        let doc = geometry_doc(json!({}));
        let err = validate_exercise(&doc).unwrap_err();
        assert_eq!(
            err.diagnostic(),
            "[levels.1.visual_config.points] : required field is missing"
        );
    }

    #[test]
    fn coding_index_out_of_range() {
        let doc = geometry_doc(json!({
            "points": [ { "x": 0, "y": 0 }, { "x": 4, "y": 0 }, { "x": 0, "y": 3 } ],
            "codings": [ { "type": "tick", "points": [0, 5] } ]
        }));
        let err = validate_exercise(&doc).unwrap_err();
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].path, "visual_config.codings.0.points.1");
        assert!(err.field_errors()[0].reason.contains("out of range"));
    }

    #[test]
    fn placeholders_pass_through_validation() {
        let doc = geometry_doc(json!({
            "points": [ { "x": 0, "y": 0 }, { "x": "{b}", "y": 0 }, { "x": 0, "y": "{c}" } ]
        }));
        let ex = validate_exercise(&doc).unwrap();
        let VisualConfig::Geometry(cfg) = &ex.levels[0].visual else {
            panic!("expected geometry config");
        };
        assert_eq!(cfg.points[1].x, Numeric::Deferred("{b}".into()));
        assert_eq!(cfg.scale, Numeric::Value(1.0));
    }

    #[test]
    fn extra_fields_are_preserved() {
        let doc = geometry_doc(json!({
            "points": [ { "x": 0, "y": 0 }, { "x": 4, "y": 0 }, { "x": 0, "y": 3 } ],
            "future_option": { "glow": true }
        }));
        let ex = validate_exercise(&doc).unwrap();
        let VisualConfig::Geometry(cfg) = &ex.levels[0].visual else {
            panic!("expected geometry config");
        };
        assert_eq!(cfg.extra.get("future_option"), Some(&json!({ "glow": true })));
    }

    #[test]
    fn none_engine_accepts_any_object() {
        let doc = json!({
            "id": "plain",
            "visual_config": { "anything": [1, 2, 3] },
            "levels": { "1": { "question": "2+2 ?", "correct_answer": 4 } }
        });
        let ex = validate_exercise(&doc).unwrap();
        assert_eq!(ex.visual_engine, VisualEngine::None);
        assert_eq!(ex.levels[0].correct_answer, "4");
        assert!(matches!(ex.levels[0].visual, VisualConfig::Opaque { .. }));
    }

    #[test]
    fn multiple_choice_needs_a_correct_option() {
        let doc = json!({
            "id": "mc",
            "levels": { "1": {
                "question": "?",
                "response_type": "MULTIPLE_CHOICE",
                "correct_answer": "b",
                "options": [ { "text": "a" }, { "text": "b", "correct": false } ]
            } }
        });
        let err = validate_exercise(&doc).unwrap_err();
        assert_eq!(err.field_errors()[0].path, "levels.1.options");
    }

    #[test]
    fn level_override_is_merged() {
        let doc = json!({
            "id": "nl",
            "visual_engine": "NUMBER_LINE",
            "visual_config": { "min": 0, "max": 10 },
            "levels": { "1": { "question": "?", "correct_answer": 1, "visual_config": { "max": 20 } } }
        });
        let ex = validate_exercise(&doc).unwrap();
        let VisualConfig::NumberLine(cfg) = &ex.levels[0].visual else {
            panic!("expected number line config");
        };
        assert_eq!(cfg.min, Numeric::Value(0.0));
        assert_eq!(cfg.max, Numeric::Value(20.0));
    }

    #[test]
    fn load_directory_skips_invalid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.json"), ANGLES_DOC).unwrap();
        std::fs::write(dir.path().join("bad.json"), "not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let exercises = load_exercise_directory(dir.path()).unwrap();
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].id, "angles-01");
    }
}

//! Core data model types for mathdrill exercises.
//!
//! These are the validated, type-coerced forms of exercise documents. Raw
//! JSON only becomes one of these types by going through [`crate::schema`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

/// Selector choosing which diagram renderer interprets a visual configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisualEngine {
    #[default]
    None,
    Pythagoras,
    NumberLine,
    Cartesian,
    Geometry,
    Angles,
}

impl VisualEngine {
    pub const ALL: [VisualEngine; 6] = [
        VisualEngine::None,
        VisualEngine::Pythagoras,
        VisualEngine::NumberLine,
        VisualEngine::Cartesian,
        VisualEngine::Geometry,
        VisualEngine::Angles,
    ];
}

impl fmt::Display for VisualEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisualEngine::None => write!(f, "NONE"),
            VisualEngine::Pythagoras => write!(f, "PYTHAGORAS"),
            VisualEngine::NumberLine => write!(f, "NUMBER_LINE"),
            VisualEngine::Cartesian => write!(f, "CARTESIAN"),
            VisualEngine::Geometry => write!(f, "GEOMETRY"),
            VisualEngine::Angles => write!(f, "ANGLES"),
        }
    }
}

impl FromStr for VisualEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VisualEngine::ALL
            .into_iter()
            .find(|engine| engine.to_string() == s)
            .ok_or_else(|| format!("unknown visual engine: {s}"))
    }
}

/// How a learner is expected to answer a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseType {
    #[default]
    Numeric,
    MultipleChoice,
    Text,
    MathInput,
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseType::Numeric => write!(f, "NUMERIC"),
            ResponseType::MultipleChoice => write!(f, "MULTIPLE_CHOICE"),
            ResponseType::Text => write!(f, "TEXT"),
            ResponseType::MathInput => write!(f, "MATH_INPUT"),
        }
    }
}

impl FromStr for ResponseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NUMERIC" => Ok(ResponseType::Numeric),
            "MULTIPLE_CHOICE" => Ok(ResponseType::MultipleChoice),
            "TEXT" => Ok(ResponseType::Text),
            "MATH_INPUT" => Ok(ResponseType::MathInput),
            other => Err(format!("unknown response type: {other}")),
        }
    }
}

/// A numeric field: either a literal value or a deferred placeholder
/// expression such as `{a+1}` that is resolved when a level is instantiated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Numeric {
    Value(f64),
    Deferred(String),
}

impl Numeric {
    /// The literal value, if the field is already resolved.
    pub fn value(&self) -> Option<f64> {
        match self {
            Numeric::Value(v) => Some(*v),
            Numeric::Deferred(_) => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Numeric::Deferred(_))
    }
}

impl From<f64> for Numeric {
    fn from(v: f64) -> Self {
        Numeric::Value(v)
    }
}

/// A named variable-generation formula (e.g. `a = randint(1, 9)`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    pub formula: String,
}

/// One answer option of a multiple-choice level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoiceOption {
    pub text: String,
    pub correct: bool,
}

/// A single difficulty level of an exercise.
#[derive(Debug, Clone, Serialize)]
pub struct LevelConfig {
    /// Level identifier (the key in the document's `levels` object).
    pub id: String,
    /// Variable formulas, evaluated in declaration order.
    pub variables: Vec<Variable>,
    /// Question template with `{expr}` placeholders.
    pub question: String,
    pub explanation: Option<String>,
    pub response_type: ResponseType,
    /// Expected answer, possibly containing placeholders.
    pub correct_answer: String,
    pub options: Vec<ChoiceOption>,
    /// Experience points awarded for a correct answer.
    pub xp: u32,
    /// The effective visual configuration as written (template merged with
    /// this level's override), before placeholder resolution.
    pub visual_source: Map<String, Value>,
    /// The validated effective visual configuration.
    pub visual: VisualConfig,
}

/// A validated exercise document.
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseDescriptor {
    pub id: String,
    pub title: Option<String>,
    pub visual_engine: VisualEngine,
    /// The common visual template shared by all levels.
    pub visual_template: Map<String, Value>,
    /// Levels in document order. Never empty.
    pub levels: Vec<LevelConfig>,
}

impl ExerciseDescriptor {
    /// Look up a level by id.
    pub fn level(&self, id: &str) -> Option<&LevelConfig> {
        self.levels.iter().find(|l| l.id == id)
    }

    /// The first level in document order.
    pub fn first_level(&self) -> Option<&LevelConfig> {
        self.levels.first()
    }
}

/// A point given in mathematical coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointSpec {
    pub x: Numeric,
    pub y: Numeric,
    pub label: Option<String>,
}

impl PointSpec {
    /// Both coordinates, if resolved.
    pub fn coords(&self) -> Option<(f64, f64)> {
        Some((self.x.value()?, self.y.value()?))
    }
}

/// Right-triangle diagram configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PythagorasConfig {
    pub points: Vec<PointSpec>,
    /// Vertex index carrying the right angle; inferred when absent.
    pub right_angle: Option<usize>,
    /// Side labels; side `i` joins point `i` and point `i + 1`.
    pub side_labels: Vec<String>,
    pub extra: Map<String, Value>,
}

/// A highlighted interval on a number line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interval {
    pub from: Numeric,
    pub to: Numeric,
    pub include_from: bool,
    pub include_to: bool,
    pub color: Option<String>,
}

/// A marked value on a number line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkedValue {
    pub value: Numeric,
    pub label: Option<String>,
}

/// Number-line diagram configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberLineConfig {
    pub min: Numeric,
    pub max: Numeric,
    pub step: Numeric,
    pub intervals: Vec<Interval>,
    pub points: Vec<MarkedValue>,
    pub extra: Map<String, Value>,
}

/// A function `y = f(x)` traced on a Cartesian plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionTrace {
    pub expr: String,
    pub color: Option<String>,
    pub label: Option<String>,
}

/// Cartesian plot configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartesianConfig {
    pub x_min: Numeric,
    pub x_max: Numeric,
    pub y_min: Numeric,
    pub y_max: Numeric,
    pub grid: bool,
    pub functions: Vec<FunctionTrace>,
    pub points: Vec<PointSpec>,
    pub extra: Map<String, Value>,
}

/// Kind of markup annotation drawn over a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodingKind {
    Tick,
    DoubleTick,
    RightAngle,
}

impl CodingKind {
    /// How many point indices this coding references.
    pub fn arity(&self) -> usize {
        match self {
            CodingKind::Tick | CodingKind::DoubleTick => 2,
            CodingKind::RightAngle => 3,
        }
    }
}

impl FromStr for CodingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tick" => Ok(CodingKind::Tick),
            "double_tick" => Ok(CodingKind::DoubleTick),
            "right_angle" => Ok(CodingKind::RightAngle),
            other => Err(format!("unknown coding type: {other}")),
        }
    }
}

/// A coding annotation referencing vertices by position.
///
/// Ticks reference a segment `[a, b]`; a right-angle marker references
/// `[a, vertex, b]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coding {
    pub kind: CodingKind,
    pub points: Vec<usize>,
}

/// General polygon geometry configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryConfig {
    pub points: Vec<PointSpec>,
    pub extra_points: Vec<PointSpec>,
    pub codings: Vec<Coding>,
    pub scale: Numeric,
    pub extra: Map<String, Value>,
}

/// Paired-angle diagram configuration.
///
/// The categorical fields stay loosely typed here; [`crate::normalize`]
/// resolves them into an [`crate::normalize::AnglesScene`].
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnglesConfig {
    pub angle: Option<Value>,
    pub angle1: Option<Value>,
    pub mode: Option<Value>,
    pub relation: Option<Value>,
    pub is_comp: Option<Value>,
    pub is_oppose: Option<Value>,
    pub labels: BTreeMap<String, String>,
    pub colors: BTreeMap<String, String>,
    pub extra: Map<String, Value>,
}

/// A validated visual configuration, one variant per visual engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "engine", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisualConfig {
    /// No diagram. Any fields are carried through untouched so documents
    /// written for newer renderers still validate.
    #[serde(rename = "NONE")]
    Opaque { fields: Map<String, Value> },
    Pythagoras(PythagorasConfig),
    NumberLine(NumberLineConfig),
    Cartesian(CartesianConfig),
    Geometry(GeometryConfig),
    Angles(AnglesConfig),
}

impl VisualConfig {
    pub fn engine(&self) -> VisualEngine {
        match self {
            VisualConfig::Opaque { .. } => VisualEngine::None,
            VisualConfig::Pythagoras(_) => VisualEngine::Pythagoras,
            VisualConfig::NumberLine(_) => VisualEngine::NumberLine,
            VisualConfig::Cartesian(_) => VisualEngine::Cartesian,
            VisualConfig::Geometry(_) => VisualEngine::Geometry,
            VisualConfig::Angles(_) => VisualEngine::Angles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_display_and_parse() {
        for engine in VisualEngine::ALL {
            assert_eq!(engine.to_string().parse::<VisualEngine>().unwrap(), engine);
        }
        assert_eq!(VisualEngine::NumberLine.to_string(), "NUMBER_LINE");
        assert!("angles".parse::<VisualEngine>().is_err());
        assert!("SPHERES".parse::<VisualEngine>().is_err());
    }

    #[test]
    fn response_type_parse() {
        assert_eq!(
            "MULTIPLE_CHOICE".parse::<ResponseType>().unwrap(),
            ResponseType::MultipleChoice
        );
        assert!("essay".parse::<ResponseType>().is_err());
        assert_eq!(ResponseType::default(), ResponseType::Numeric);
    }

    #[test]
    fn coding_kind_arity() {
        assert_eq!("tick".parse::<CodingKind>().unwrap().arity(), 2);
        assert_eq!("double_tick".parse::<CodingKind>().unwrap().arity(), 2);
        assert_eq!("right_angle".parse::<CodingKind>().unwrap().arity(), 3);
        assert!("arc".parse::<CodingKind>().is_err());
    }

    #[test]
    fn numeric_value_access() {
        assert_eq!(Numeric::Value(2.5).value(), Some(2.5));
        let deferred = Numeric::Deferred("{a}".into());
        assert!(deferred.is_deferred());
        assert_eq!(deferred.value(), None);
        assert_eq!(serde_json::to_string(&deferred).unwrap(), "\"{a}\"");
    }
}

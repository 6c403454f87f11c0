//! Exercise instantiation.
//!
//! Turns a validated [`ExerciseDescriptor`] level into a concrete
//! [`ExerciseInstance`]: variables are drawn from a seeded RNG, `{expr}`
//! placeholders are substituted everywhere, and the resolved visual
//! configuration is validated again.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::error::ValidationError;
use crate::expr::{format_number, Bindings, Expr, ExprError};
use crate::model::{ChoiceOption, ExerciseDescriptor, ResponseType, VisualConfig};
use crate::schema::validate_visual;
use crate::scoring::answers_match;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("exercise {exercise} has no level {level}")]
    UnknownLevel { exercise: String, level: String },

    #[error("variable {name}: {source}")]
    Variable {
        name: String,
        #[source]
        source: ExprError,
    },

    #[error("resolved visual configuration is invalid:\n{}", .0.diagnostic())]
    Visual(ValidationError),
}

/// One concrete, fully resolved exercise level.
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseInstance {
    pub exercise_id: String,
    pub level_id: String,
    pub seed: u64,
    pub bindings: Bindings,
    pub question: String,
    pub explanation: Option<String>,
    pub response_type: ResponseType,
    pub correct_answer: String,
    pub options: Vec<ChoiceOption>,
    pub xp: u32,
    pub visual: VisualConfig,
}

impl ExerciseInstance {
    /// Judge a learner answer. Returns the xp earned: the level reward when
    /// correct, 0 otherwise.
    pub fn check(&self, answer: &str) -> u32 {
        if self.is_correct(answer) {
            self.xp
        } else {
            0
        }
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        if answer.trim().is_empty() {
            return false;
        }
        match self.response_type {
            ResponseType::MultipleChoice if self.options.iter().any(|o| o.correct) => self
                .options
                .iter()
                .filter(|o| o.correct)
                .any(|o| answers_match(answer, &o.text)),
            _ => answers_match(answer, &self.correct_answer),
        }
    }
}

/// Instantiate `level_id` of `descriptor` with `seed`.
///
/// The same descriptor, level and seed always produce the same instance.
pub fn instantiate(
    descriptor: &ExerciseDescriptor,
    level_id: &str,
    seed: u64,
) -> Result<ExerciseInstance, GenerateError> {
    let level = descriptor
        .level(level_id)
        .ok_or_else(|| GenerateError::UnknownLevel {
            exercise: descriptor.id.clone(),
            level: level_id.to_string(),
        })?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut bindings = Bindings::new();
    for var in &level.variables {
        let value = Expr::parse(&var.formula)
            .and_then(|expr| expr.eval_random(&bindings, &mut rng))
            .map_err(|source| GenerateError::Variable {
                name: var.name.clone(),
                source,
            })?;
        bindings.insert(var.name.clone(), value);
    }

    let mut correct_answer = fill_placeholders(&level.correct_answer, &bindings);
    if level.response_type == ResponseType::Numeric && parse_number(&correct_answer).is_none() {
        if let Ok(value) = Expr::parse(&correct_answer).and_then(|e| e.eval(&bindings)) {
            correct_answer = format_number(value);
        }
    }

    let resolved = resolve_placeholders(&Value::Object(level.visual_source.clone()), &bindings);
    let visual = validate_visual(descriptor.visual_engine, &resolved).map_err(GenerateError::Visual)?;

    tracing::debug!(
        exercise = %descriptor.id,
        level = %level.id,
        seed,
        variables = bindings.len(),
        "instantiated exercise"
    );

    Ok(ExerciseInstance {
        exercise_id: descriptor.id.clone(),
        level_id: level.id.clone(),
        seed,
        question: fill_placeholders(&level.question, &bindings),
        explanation: level
            .explanation
            .as_deref()
            .map(|text| fill_placeholders(text, &bindings)),
        response_type: level.response_type,
        correct_answer,
        options: level
            .options
            .iter()
            .map(|o| ChoiceOption {
                text: fill_placeholders(&o.text, &bindings),
                correct: o.correct,
            })
            .collect(),
        xp: level.xp,
        visual,
        bindings,
    })
}

/// Replace every `{expr}` in `text` with its evaluated value.
///
/// A placeholder that does not evaluate, or is never closed, is kept as
/// written.
pub fn fill_placeholders(text: &str, bindings: &Bindings) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let inner = &after[..close];
        match eval_placeholder(inner, bindings) {
            Some(value) => out.push_str(&format_number(value)),
            None => {
                out.push('{');
                out.push_str(inner);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Resolve placeholders inside a JSON value.
///
/// A string that is exactly one placeholder becomes a JSON number so
/// numeric fields validate as numbers; other strings are filled as text.
pub fn resolve_placeholders(value: &Value, bindings: &Bindings) -> Value {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            let whole = trimmed
                .strip_prefix('{')
                .and_then(|t| t.strip_suffix('}'))
                .filter(|inner| !inner.contains(['{', '}']));
            match whole.and_then(|inner| eval_placeholder(inner, bindings)) {
                Some(v) => number_value(v),
                None => Value::String(fill_placeholders(s, bindings)),
            }
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_placeholders(item, bindings))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_placeholders(v, bindings)))
                .collect::<Map<String, Value>>(),
        ),
        other => other.clone(),
    }
}

fn eval_placeholder(inner: &str, bindings: &Bindings) -> Option<f64> {
    Expr::parse(inner).and_then(|e| e.eval(bindings)).ok()
}

fn number_value(v: f64) -> Value {
    let rounded = v.round();
    if (v - rounded).abs() < 1e-9 && rounded.abs() < 1e15 {
        Value::Number(Number::from(rounded as i64))
    } else {
        Number::from_f64(v).map_or(Value::Null, Value::Number)
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse::<f64>().ok()
}

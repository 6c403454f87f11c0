//! Mock-exam subject tree and learner answers.
//!
//! A subject is a static hierarchy (subject → parts → exercises →
//! questions) loaded once per exam session and never mutated.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FieldError, ValidationError};

/// A complete exam subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSubject {
    pub id: String,
    pub title: String,
    /// Points reserved for what is not machine-evaluated (presentation,
    /// handwriting). Overrides the configured allowance when set.
    #[serde(default)]
    pub non_evaluated_points: Option<f64>,
    #[serde(default)]
    pub parts: Vec<ExamPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamPart {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub exercises: Vec<ExamExercise>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamExercise {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub questions: Vec<ExamQuestion>,
}

/// A single question with its point value and expected answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamQuestion {
    pub id: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub answer: Option<ExpectedAnswer>,
}

impl ExamQuestion {
    /// Whether this question counts toward the score.
    pub fn is_scored(&self) -> bool {
        self.kind == QuestionKind::Answer
    }
}

/// Scored answer question or informational (never scored) statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    #[default]
    Answer,
    Info,
}

/// A literal expected value, as written in the subject file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    pub fn as_text(&self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }
}

/// Either a single expected value or a set of equivalent alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpectedAnswer {
    AnyOf(Vec<Scalar>),
    One(Scalar),
}

impl ExpectedAnswer {
    /// All acceptable values as text.
    pub fn alternatives(&self) -> Vec<String> {
        match self {
            ExpectedAnswer::One(s) => vec![s.as_text()],
            ExpectedAnswer::AnyOf(items) => items.iter().map(Scalar::as_text).collect(),
        }
    }
}

impl ExamSubject {
    /// Every question with its (part, exercise) ancestry, in document order.
    pub fn questions(&self) -> impl Iterator<Item = (&ExamPart, &ExamExercise, &ExamQuestion)> {
        self.parts.iter().flat_map(|part| {
            part.exercises.iter().flat_map(move |exercise| {
                exercise
                    .questions
                    .iter()
                    .map(move |question| (part, exercise, question))
            })
        })
    }

    pub fn question(&self, id: &str) -> Option<&ExamQuestion> {
        self.questions().map(|(_, _, q)| q).find(|q| q.id == id)
    }
}

/// Answers submitted during one exam session, keyed by question id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    answers: BTreeMap<String, String>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the answer to one question.
    pub fn set(&mut self, question_id: impl Into<String>, value: impl Into<String>) {
        self.answers.insert(question_id.into(), value.into());
    }

    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    pub fn remove(&mut self, question_id: &str) -> Option<String> {
        self.answers.remove(question_id)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Parse a JSON object mapping question ids to string or number values.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: BTreeMap<String, Value> =
            serde_json::from_str(content).context("failed to parse answers JSON")?;
        let mut answers = AnswerSet::new();
        for (id, value) in raw {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Null => continue,
                other => anyhow::bail!("answer for {id} must be a string or number, got {other}"),
            };
            answers.set(id, text);
        }
        Ok(answers)
    }

    /// Load answers from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read answers from {}", path.display()))?;
        Self::from_json_str(&content)
    }
}

/// Parse a subject file.
pub fn parse_subject(path: &Path) -> Result<ExamSubject> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read subject file: {}", path.display()))?;
    parse_subject_str(&content)
        .map_err(|e| anyhow::anyhow!("{}:\n{}", path.display(), e.diagnostic()))
}

/// Parse and check a subject document.
pub fn parse_subject_str(content: &str) -> Result<ExamSubject, ValidationError> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| ValidationError::Syntax(e.to_string()))?;
    let subject: ExamSubject = serde_json::from_value(value)
        .map_err(|e| ValidationError::Shape(vec![FieldError::new("$", e.to_string())]))?;

    let errors = validate_subject(&subject);
    if errors.is_empty() {
        Ok(subject)
    } else {
        Err(ValidationError::Shape(errors))
    }
}

/// Check a subject for duplicate ids, negative points and scored questions
/// without an expected answer.
pub fn validate_subject(subject: &ExamSubject) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let mut seen_ids = HashSet::new();

    for (p, part) in subject.parts.iter().enumerate() {
        for (e, exercise) in part.exercises.iter().enumerate() {
            for (q, question) in exercise.questions.iter().enumerate() {
                let path = format!("parts.{p}.exercises.{e}.questions.{q}");
                if !seen_ids.insert(question.id.as_str()) {
                    errors.push(FieldError::new(
                        format!("{path}.id"),
                        format!("duplicate question id: {}", question.id),
                    ));
                }
                if !question.points.is_finite() || question.points < 0.0 {
                    errors.push(FieldError::new(
                        format!("{path}.points"),
                        "points must be a non-negative number",
                    ));
                }
                if question.is_scored() && question.answer.is_none() {
                    errors.push(FieldError::new(
                        format!("{path}.answer"),
                        "scored question has no expected answer",
                    ));
                }
            }
        }
    }

    errors
}

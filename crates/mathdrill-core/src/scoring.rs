//! Exam scoring engine.
//!
//! Compares submitted answers against expected answers and aggregates
//! earned/possible points bottom-up (question → exercise → part → subject).
//! Scoring is pure: the same subject and answers always produce the same
//! report, and neither input is modified.

use serde::{Deserialize, Serialize};

use crate::exam::{AnswerSet, ExamSubject, ExpectedAnswer};
use crate::report::{ExerciseScore, PartScore, QuestionScore, ScoreReport};

/// Tolerance when two answers both parse as numbers.
const NUMERIC_TOLERANCE: f64 = 1e-9;

/// How raw points are turned into a mark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Target scale of the mark (e.g. 20).
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Points reserved for what is not machine-evaluated; reported next to
    /// the mark, never added to earned or possible.
    #[serde(default)]
    pub non_evaluated_points: f64,
    /// Decimal places kept in the mark.
    #[serde(default = "default_precision")]
    pub precision: u32,
}

fn default_scale() -> f64 {
    20.0
}

fn default_precision() -> u32 {
    1
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            non_evaluated_points: 0.0,
            precision: default_precision(),
        }
    }
}

/// Normalize a free-text answer: trim, lower-case, comma decimal separators
/// become periods. Internal whitespace is kept.
pub fn normalize_answer(raw: &str) -> String {
    raw.trim().to_lowercase().replace(',', ".")
}

/// Whether `submitted` matches one expected value.
///
/// Values match when their normalized text is equal, or when both parse as
/// numbers that are equal (so `"6,0"` matches `6`).
pub fn answers_match(submitted: &str, expected: &str) -> bool {
    let submitted = normalize_answer(submitted);
    let expected = normalize_answer(expected);
    if submitted == expected {
        return true;
    }
    match (submitted.parse::<f64>(), expected.parse::<f64>()) {
        (Ok(a), Ok(b)) if a.is_finite() && b.is_finite() => (a - b).abs() <= NUMERIC_TOLERANCE,
        _ => false,
    }
}

/// Whether `submitted` matches the expected answer or any of its alternatives.
pub fn is_correct(submitted: &str, expected: &ExpectedAnswer) -> bool {
    if submitted.trim().is_empty() {
        return false;
    }
    expected
        .alternatives()
        .iter()
        .any(|alt| answers_match(submitted, alt))
}

/// Rescale `earned / possible` onto `scale`, rounded to `precision` decimals.
pub fn rescale(earned: f64, possible: f64, scale: f64, precision: u32) -> f64 {
    if possible <= 0.0 {
        return 0.0;
    }
    let factor = 10f64.powi(precision as i32);
    (earned / possible * scale * factor).round() / factor
}

/// Score a subject against a set of answers.
pub fn score_subject(subject: &ExamSubject, answers: &AnswerSet, config: &ScoringConfig) -> ScoreReport {
    let parts: Vec<PartScore> = subject
        .parts
        .iter()
        .map(|part| {
            let exercises: Vec<ExerciseScore> = part
                .exercises
                .iter()
                .map(|exercise| {
                    let questions: Vec<QuestionScore> = exercise
                        .questions
                        .iter()
                        .map(|question| {
                            let submitted = answers.get(&question.id);
                            let scored = question.is_scored();
                            let correct = scored
                                && match (submitted, &question.answer) {
                                    (Some(value), Some(expected)) => is_correct(value, expected),
                                    _ => false,
                                };
                            let possible = if scored { question.points } else { 0.0 };
                            QuestionScore {
                                id: question.id.clone(),
                                scored,
                                correct,
                                earned: if correct { possible } else { 0.0 },
                                possible,
                                submitted: submitted.map(str::to_string),
                            }
                        })
                        .collect();
                    ExerciseScore {
                        id: exercise.id.clone(),
                        title: exercise.title.clone(),
                        earned: questions.iter().map(|q| q.earned).sum(),
                        possible: questions.iter().map(|q| q.possible).sum(),
                        questions,
                    }
                })
                .collect();
            PartScore {
                id: part.id.clone(),
                title: part.title.clone(),
                earned: exercises.iter().map(|e| e.earned).sum(),
                possible: exercises.iter().map(|e| e.possible).sum(),
                exercises,
            }
        })
        .collect();

    let earned: f64 = parts.iter().map(|p| p.earned).sum();
    let possible: f64 = parts.iter().map(|p| p.possible).sum();
    let mark = rescale(earned, possible, config.scale, config.precision);

    tracing::debug!(subject = %subject.id, earned, possible, mark, "scored subject");

    ScoreReport {
        subject_id: subject.id.clone(),
        subject_title: subject.title.clone(),
        parts,
        earned,
        possible,
        mark,
        scale: config.scale,
        non_evaluated_points: subject
            .non_evaluated_points
            .unwrap_or(config.non_evaluated_points),
    }
}

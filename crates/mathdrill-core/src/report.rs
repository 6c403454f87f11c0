//! Score report types with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hierarchical scoring result for one exam session.
///
/// Derived on demand from a subject and an answer set; contains no
/// timestamps so identical inputs serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub subject_id: String,
    pub subject_title: String,
    pub parts: Vec<PartScore>,
    /// Points earned over all scored questions.
    pub earned: f64,
    /// Points available over all scored questions.
    pub possible: f64,
    /// `earned / possible` rescaled onto `scale`.
    pub mark: f64,
    pub scale: f64,
    /// Points reserved for non-evaluated criteria, reported alongside the
    /// mark and excluded from `earned`/`possible`.
    pub non_evaluated_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartScore {
    pub id: String,
    pub title: String,
    pub earned: f64,
    pub possible: f64,
    pub exercises: Vec<ExerciseScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseScore {
    pub id: String,
    pub title: String,
    pub earned: f64,
    pub possible: f64,
    pub questions: Vec<QuestionScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionScore {
    pub id: String,
    /// `false` for informational questions.
    pub scored: bool,
    pub correct: bool,
    pub earned: f64,
    pub possible: f64,
    pub submitted: Option<String>,
}

impl PartScore {
    /// Share of the part's points earned, in `[0, 1]`.
    pub fn ratio(&self) -> f64 {
        if self.possible > 0.0 {
            self.earned / self.possible
        } else {
            0.0
        }
    }
}

impl ScoreReport {
    /// Number of scored questions answered correctly.
    pub fn correct_count(&self) -> usize {
        self.questions().filter(|q| q.correct).count()
    }

    /// Number of scored questions.
    pub fn scored_count(&self) -> usize {
        self.questions().filter(|q| q.scored).count()
    }

    /// Every question result in document order.
    pub fn questions(&self) -> impl Iterator<Item = &QuestionScore> {
        self.parts
            .iter()
            .flat_map(|p| p.exercises.iter())
            .flat_map(|e| e.questions.iter())
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ScoreReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

/// The record handed to a [`crate::traits::ResultStore`] when an exam is
/// completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub subject_id: String,
    pub subject_title: String,
    pub mark: f64,
    pub scale: f64,
    pub earned: f64,
    pub possible: f64,
}

impl ExamRecord {
    /// Build a record from a finished report.
    pub fn from_report(report: &ScoreReport, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at,
            subject_id: report.subject_id.clone(),
            subject_title: report.subject_title.clone(),
            mark: report.mark,
            scale: report.scale,
            earned: report.earned,
            possible: report.possible,
        }
    }
}

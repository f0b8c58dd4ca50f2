// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sqlx::FromRow;

use crate::error::AppError;

/// Represents the 'attempts' table in the database.
///
/// An attempt is Open while `submitted_at` is null and Closed once it is set.
/// `score` and `answers` are written in the same statement as `submitted_at`
/// and never change afterwards.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub exam_id: i64,
    pub user_id: i64,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub score: Option<f64>,

    /// Raw submitted payload, kept verbatim for audit.
    pub answers: Option<String>,
}

impl Attempt {
    pub fn is_closed(&self) -> bool {
        self.submitted_at.is_some()
    }
}

/// Attempt joined with its owner, one row per CSV line in the export.
#[derive(Debug, Clone, FromRow)]
pub struct AttemptExportRow {
    pub id: i64,
    pub user_name: String,
    pub user_email: String,
    pub score: Option<f64>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub answers: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartAttemptResponse {
    #[serde(rename = "attemptId")]
    pub attempt_id: i64,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for submitting answers against an open attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(rename = "attemptId")]
    pub attempt_id: i64,

    /// Left unparsed so the exact bytes received can be stored.
    pub answers: Box<RawValue>,
}

/// One answer in the keyed submission form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyedAnswer {
    pub question_id: i64,
    #[serde(default)]
    pub answer_index: Option<i64>,
}

/// The two accepted submission shapes.
///
/// `Positional` is tried first, so an empty array is positional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Submission {
    /// `answers[i]` is the chosen index for the i-th question in id order.
    Positional(Vec<Option<i64>>),
    /// Each entry names the question it answers.
    Keyed(Vec<KeyedAnswer>),
}

impl Submission {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw).map_err(|_| {
            AppError::BadRequest(
                "answers must be an array of option indexes or of {questionId, answerIndex} objects"
                    .to_string(),
            )
        })
    }
}

/// Result of grading one submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreCard {
    pub score: f64,
    pub correct: usize,
    pub total: usize,
}

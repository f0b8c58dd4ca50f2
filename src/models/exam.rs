// src/models/exam.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'exams' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,
    pub title: String,
    pub duration_minutes: i64,

    /// Only published exams are visible to students. Never reverts to false.
    pub published: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Listing view of an exam, as served on `GET /api/exams`.
#[derive(Debug, Clone, Serialize)]
pub struct ExamSummary {
    pub id: i64,
    pub title: String,
    pub duration_minutes: i64,
    pub published: bool,
}

impl From<Exam> for ExamSummary {
    fn from(exam: Exam) -> Self {
        Self {
            id: exam.id,
            title: exam.title,
            duration_minutes: exam.duration_minutes,
            published: exam.published,
        }
    }
}

/// DTO for creating a new exam.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "title required"),
        custom(function = validate_title_length)
    )]
    pub title: String,
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub duration_minutes: Option<i64>,
}

fn validate_title_length(title: &str) -> Result<(), validator::ValidationError> {
    if title.chars().count() > 200 {
        return Err(validator::ValidationError::new("title_too_long")
            .with_message("title must be at most 200 characters".into()));
    }
    Ok(())
}

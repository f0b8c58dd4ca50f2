// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub exam_id: i64,

    /// The text content of the question.
    pub text: String,

    /// Ordered list of options (e.g., ["3", "4", "5"]).
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// 0-based index of the correct option. Confidential to students.
    pub answer_index: i64,
}

/// DTO for sending question to students (excludes answer_index).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub options: Vec<String>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            text: q.text,
            options: q.options.0,
        }
    }
}

/// The scoring path's view of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerKey {
    pub question_id: i64,
    pub answer_index: i64,
}

impl From<&Question> for AnswerKey {
    fn from(q: &Question) -> Self {
        Self {
            question_id: q.id,
            answer_index: q.answer_index,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = validate_answer_in_bounds, skip_on_field_errors = true))]
pub struct CreateQuestionRequest {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "text required"),
        custom(function = validate_text_length)
    )]
    pub text: String,
    #[serde(default)]
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(required(message = "answer_index must be a number"))]
    pub answer_index: Option<i64>,
}

fn validate_text_length(text: &str) -> Result<(), validator::ValidationError> {
    if text.chars().count() > 1000 {
        return Err(validator::ValidationError::new("text_too_long")
            .with_message("text must be at most 1000 characters".into()));
    }
    Ok(())
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() < 2 {
        return Err(validator::ValidationError::new("options_need_at_least_two")
            .with_message("options must list at least two choices".into()));
    }
    for opt in options {
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long")
                .with_message("each option must be at most 500 characters".into()));
        }
    }
    Ok(())
}

fn validate_answer_in_bounds(
    req: &CreateQuestionRequest,
) -> Result<(), validator::ValidationError> {
    match req.answer_index {
        Some(idx) if idx >= 0 && (idx as usize) < req.options.len() => Ok(()),
        _ => Err(validator::ValidationError::new("answer_index_out_of_bounds")
            .with_message("answer_index must point into options".into())),
    }
}

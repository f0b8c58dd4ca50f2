// src/handlers/exam.rs

use axum::{
    Extension, Json,
    body::Bytes,
    extract::State,
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    handlers::AppPath,
    models::attempt::{StartAttemptResponse, SubmitRequest},
    services::{catalog::ExamCatalog, ledger::AttemptLedger, scoring::ScoringEngine},
    utils::jwt::Claims,
};

/// Lists published exams.
pub async fn list_exams(State(catalog): State<ExamCatalog>) -> Result<impl IntoResponse, AppError> {
    let exams = catalog.list_published_exams().await?;
    Ok(Json(json!({ "exams": exams })))
}

/// Lists an exam's questions without answer keys.
pub async fn list_questions(
    State(catalog): State<ExamCatalog>,
    Extension(claims): Extension<Claims>,
    AppPath(exam_id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let questions = catalog.list_questions_for_exam(&claims, exam_id).await?;
    Ok(Json(json!({ "questions": questions })))
}

/// Opens a new attempt for the caller.
pub async fn start_attempt(
    State(ledger): State<AttemptLedger>,
    Extension(claims): Extension<Claims>,
    AppPath(exam_id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = ledger.start_attempt(&claims, exam_id).await?;
    Ok(Json(StartAttemptResponse {
        attempt_id: attempt.id,
        started_at: attempt.started_at,
    }))
}

/// Grades the submitted answers and closes the attempt.
///
/// `answers` is either `[index | null, ...]` in question id order or
/// `[{questionId, answerIndex}, ...]`. The body is parsed straight from
/// bytes so `answers` keeps its exact original text.
pub async fn submit_attempt(
    State(scoring): State<ScoringEngine>,
    Extension(claims): Extension<Claims>,
    AppPath(exam_id): AppPath<i64>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let req: SubmitRequest = serde_json::from_slice(&body)?;
    let card = scoring.submit(&claims, exam_id, req).await?;
    Ok(Json(card))
}

/// Reads back an attempt. Owner or admin.
pub async fn get_attempt(
    State(ledger): State<AttemptLedger>,
    Extension(claims): Extension<Claims>,
    AppPath(attempt_id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = ledger.get_attempt(&claims, attempt_id).await?;
    Ok(Json(json!({ "attempt": attempt })))
}

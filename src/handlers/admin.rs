// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    handlers::{AppJson, AppPath},
    models::{exam::CreateExamRequest, question::CreateQuestionRequest},
    services::{catalog::ExamCatalog, ledger::AttemptLedger},
    utils::{export::attempts_to_csv, jwt::Claims},
};

/// Lists every exam, published or not.
/// Admin only.
pub async fn list_exams(
    State(catalog): State<ExamCatalog>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let exams = catalog.list_exams(&claims).await?;
    Ok(Json(json!({ "exams": exams })))
}

/// Creates a new exam. `duration_minutes` defaults to 30.
/// Admin only.
pub async fn create_exam(
    State(catalog): State<ExamCatalog>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let exam = catalog.create_exam(&claims, payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "exam": exam }))))
}

/// Deletes an exam with its questions and attempts.
/// Admin only.
pub async fn delete_exam(
    State(catalog): State<ExamCatalog>,
    Extension(claims): Extension<Claims>,
    AppPath(exam_id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    catalog.delete_exam(&claims, exam_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lists questions with their answer keys.
/// Admin only.
pub async fn list_questions(
    State(catalog): State<ExamCatalog>,
    Extension(claims): Extension<Claims>,
    AppPath(exam_id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let questions = catalog.admin_questions(&claims, exam_id).await?;
    Ok(Json(json!({ "questions": questions })))
}

/// Adds a question to an exam.
/// Admin only.
pub async fn add_question(
    State(catalog): State<ExamCatalog>,
    Extension(claims): Extension<Claims>,
    AppPath(exam_id): AppPath<i64>,
    AppJson(payload): AppJson<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = catalog.add_question(&claims, exam_id, payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "question": question }))))
}

/// Makes an exam visible to students.
/// Admin only.
pub async fn publish_exam(
    State(catalog): State<ExamCatalog>,
    Extension(claims): Extension<Claims>,
    AppPath(exam_id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    catalog.publish_exam(&claims, exam_id).await?;
    Ok(Json(json!({ "ok": true })))
}

/// Downloads all attempts of an exam as CSV.
/// Admin only.
pub async fn export_attempts(
    State(ledger): State<AttemptLedger>,
    Extension(claims): Extension<Claims>,
    AppPath(exam_id): AppPath<i64>,
) -> Result<impl IntoResponse, AppError> {
    let rows = ledger.attempts_for_exam(&claims, exam_id).await?;
    let csv = attempts_to_csv(&rows).await?;

    let disposition = format!("attachment; filename=\"export_exam_{}.csv\"", exam_id);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

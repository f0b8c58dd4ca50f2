// src/utils/export.rs

use serde::Serialize;

use crate::{error::AppError, models::attempt::AttemptExportRow};

const HEADER: &str = "ID,User,Email,Score,Started At,Submitted At,Answers";

#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    #[serde(rename = "ID")]
    id: i64,
    #[serde(rename = "User")]
    user: &'a str,
    #[serde(rename = "Email")]
    email: &'a str,
    #[serde(rename = "Score")]
    score: Option<f64>,
    #[serde(rename = "Started At")]
    started_at: String,
    #[serde(rename = "Submitted At")]
    submitted_at: Option<String>,
    #[serde(rename = "Answers")]
    answers: Option<&'a str>,
}

/// Renders attempts as CSV with a header row. Open attempts leave
/// score, submission time and answers empty.
pub async fn attempts_to_csv(rows: &[AttemptExportRow]) -> Result<Vec<u8>, AppError> {
    // The serializer derives the header from the first record.
    if rows.is_empty() {
        return Ok(format!("{}\n", HEADER).into_bytes());
    }

    let mut serializer = csv_async::AsyncSerializer::from_writer(Vec::new());

    for row in rows {
        let record = CsvRecord {
            id: row.id,
            user: &row.user_name,
            email: &row.user_email,
            score: row.score,
            started_at: row.started_at.to_rfc3339(),
            submitted_at: row.submitted_at.map(|t| t.to_rfc3339()),
            answers: row.answers.as_deref(),
        };
        serializer
            .serialize(&record)
            .await
            .map_err(|e| AppError::InternalServerError(format!("Export failed: {}", e)))?;
    }

    serializer
        .into_inner()
        .await
        .map_err(|e| AppError::InternalServerError(format!("Export failed: {}", e)))
}

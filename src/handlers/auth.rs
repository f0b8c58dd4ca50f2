// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    error::AppError,
    handlers::AppJson,
    models::user::{LoginRequest, RegisterRequest},
    services::credentials::CredentialStore,
};

/// Registers a new student account.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with the user object (excluding password) and a token.
pub async fn register(
    State(credentials): State<CredentialStore>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = credentials.register(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Authenticates a user and returns a JWT token.
pub async fn login(
    State(credentials): State<CredentialStore>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = credentials.login(payload).await?;
    Ok(Json(response))
}

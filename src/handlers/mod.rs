// src/handlers/mod.rs

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

pub mod admin;
pub mod auth;
pub mod exam;

/// `Json` extractor whose rejections render as `AppError` (400 + `{error}`).
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Path` extractor whose rejections render as `AppError` (400 + `{error}`).
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

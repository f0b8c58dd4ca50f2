// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::AppError,
    handlers::{admin, auth, exam},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Auth routes are public.
/// * Student routes require a valid token.
/// * Admin routes require a valid token carrying the admin role.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let student_routes = Router::new()
        .route("/exams", get(exam::list_exams))
        .route("/exams/{exam_id}/questions", get(exam::list_questions))
        .route("/exams/{exam_id}/start", post(exam::start_attempt))
        .route("/exams/{exam_id}/submit", post(exam::submit_attempt))
        .route("/attempts/{attempt_id}", get(exam::get_attempt))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/exams", get(admin::list_exams).post(admin::create_exam))
        .route("/exams/{exam_id}", delete(admin::delete_exam))
        .route(
            "/exams/{exam_id}/questions",
            get(admin::list_questions).post(admin::add_question),
        )
        .route("/exams/{exam_id}/publish", post(admin::publish_exam))
        .route("/export/{exam_id}", get(admin::export_attempts))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth_routes)
                .merge(student_routes)
                .nest("/admin", admin_routes),
        )
        .fallback(|| async { AppError::NotFound("Route not found".to_string()) })
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

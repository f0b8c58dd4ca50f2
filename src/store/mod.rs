// src/store/mod.rs

//! Persistence capability consumed by every component.
//!
//! Components receive an `Arc<dyn Store>` at construction instead of reaching
//! for a process-wide pool, so tests can run them over an in-memory database.

pub mod sqlite;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, AttemptExportRow},
        exam::Exam,
        question::Question,
        user::{Role, User},
    },
};

pub use sqlite::SqliteStore;

/// Insert payload for the 'users' table. `password` is already hashed.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Fails with `AppError::Conflict` when the email is taken.
    async fn insert_user(&self, user: NewUser<'_>) -> Result<User, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn any_admin(&self) -> Result<bool, AppError>;

    async fn insert_exam(&self, title: &str, duration_minutes: i64) -> Result<Exam, AppError>;
    async fn find_exam(&self, id: i64) -> Result<Option<Exam>, AppError>;
    async fn list_exams(&self) -> Result<Vec<Exam>, AppError>;
    async fn list_published_exams(&self) -> Result<Vec<Exam>, AppError>;
    /// Returns false when no exam has this id.
    async fn publish_exam(&self, id: i64) -> Result<bool, AppError>;
    /// Returns false when no exam has this id.
    async fn delete_exam(&self, id: i64) -> Result<bool, AppError>;

    async fn insert_question(
        &self,
        exam_id: i64,
        text: &str,
        options: &[String],
        answer_index: i64,
    ) -> Result<Question, AppError>;
    /// Questions of one exam, ordered by id.
    async fn list_questions(&self, exam_id: i64) -> Result<Vec<Question>, AppError>;

    async fn insert_attempt(&self, exam_id: i64, user_id: i64) -> Result<Attempt, AppError>;
    async fn find_attempt(&self, id: i64) -> Result<Option<Attempt>, AppError>;
    /// Sets answers, submitted_at and score in one statement, only if the
    /// attempt is still open. Returns whether a row changed.
    async fn close_attempt(&self, id: i64, answers: &str, score: f64) -> Result<bool, AppError>;
    /// Attempts of one exam joined with their owner, ordered by id.
    async fn list_attempts_for_exam(&self, exam_id: i64)
    -> Result<Vec<AttemptExportRow>, AppError>;
}

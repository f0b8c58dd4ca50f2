// src/store/sqlite.rs

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

use super::{NewUser, Store};
use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, AttemptExportRow},
        exam::Exam,
        question::Question,
        user::User,
    },
};

const CONNECT_RETRIES: u32 = 5;

/// `Store` backed by a sqlx SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects with a bounded retry and applies migrations.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let mut retry_count = 0;
        let pool = loop {
            match SqlitePoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(3))
                .connect(database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) => {
                    retry_count += 1;
                    if retry_count > CONNECT_RETRIES {
                        return Err(AppError::InternalServerError(format!(
                            "Failed to connect to database after {} retries: {}",
                            CONNECT_RETRIES, e
                        )));
                    }
                    tracing::warn!(
                        "Database not ready, retrying in 2s... (Attempt {})",
                        retry_count
                    );
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        };

        tracing::info!("Database connected...");
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database. A single never-recycled connection keeps
    /// the data alive for the lifetime of the pool.
    pub async fn in_memory() -> Result<Self, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        tracing::info!("Running migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::InternalServerError(format!("Migration failed: {}", e)))?;
        tracing::info!("Migrations applied successfully.");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_user(&self, user: NewUser<'_>) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password, role, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, email, password, role, created_at
            "#,
        )
        .bind(user.name)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.role.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let unique = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if unique {
                AppError::Conflict("Email already registered".to_string())
            } else {
                tracing::error!("Failed to insert user: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password, role, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn any_admin(&self) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE role = 'admin')",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_exam(&self, title: &str, duration_minutes: i64) -> Result<Exam, AppError> {
        let exam = sqlx::query_as::<_, Exam>(
            r#"
            INSERT INTO exams (title, duration_minutes, published, created_at)
            VALUES (?, ?, FALSE, ?)
            RETURNING id, title, duration_minutes, published, created_at
            "#,
        )
        .bind(title)
        .bind(duration_minutes)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(exam)
    }

    async fn find_exam(&self, id: i64) -> Result<Option<Exam>, AppError> {
        let exam = sqlx::query_as::<_, Exam>(
            "SELECT id, title, duration_minutes, published, created_at FROM exams WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(exam)
    }

    async fn list_exams(&self) -> Result<Vec<Exam>, AppError> {
        let exams = sqlx::query_as::<_, Exam>(
            "SELECT id, title, duration_minutes, published, created_at FROM exams ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(exams)
    }

    async fn list_published_exams(&self) -> Result<Vec<Exam>, AppError> {
        let exams = sqlx::query_as::<_, Exam>(
            r#"
            SELECT id, title, duration_minutes, published, created_at
            FROM exams
            WHERE published = TRUE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(exams)
    }

    async fn publish_exam(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE exams SET published = TRUE WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_exam(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM exams WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_question(
        &self,
        exam_id: i64,
        text: &str,
        options: &[String],
        answer_index: i64,
    ) -> Result<Question, AppError> {
        let options_json = serde_json::to_string(options)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        let question = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (exam_id, text, options, answer_index)
            VALUES (?, ?, ?, ?)
            RETURNING id, exam_id, text, options, answer_index
            "#,
        )
        .bind(exam_id)
        .bind(text)
        .bind(options_json)
        .bind(answer_index)
        .fetch_one(&self.pool)
        .await?;
        Ok(question)
    }

    async fn list_questions(&self, exam_id: i64) -> Result<Vec<Question>, AppError> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, exam_id, text, options, answer_index
            FROM questions
            WHERE exam_id = ?
            ORDER BY id
            "#,
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    async fn insert_attempt(&self, exam_id: i64, user_id: i64) -> Result<Attempt, AppError> {
        let attempt = sqlx::query_as::<_, Attempt>(
            r#"
            INSERT INTO attempts (exam_id, user_id, started_at)
            VALUES (?, ?, ?)
            RETURNING id, exam_id, user_id, started_at, submitted_at, score, answers
            "#,
        )
        .bind(exam_id)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(attempt)
    }

    async fn find_attempt(&self, id: i64) -> Result<Option<Attempt>, AppError> {
        let attempt = sqlx::query_as::<_, Attempt>(
            r#"
            SELECT id, exam_id, user_id, started_at, submitted_at, score, answers
            FROM attempts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempt)
    }

    async fn close_attempt(&self, id: i64, answers: &str, score: f64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE attempts
            SET answers = ?, submitted_at = ?, score = ?
            WHERE id = ? AND submitted_at IS NULL
            "#,
        )
        .bind(answers)
        .bind(Utc::now())
        .bind(score)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_attempts_for_exam(
        &self,
        exam_id: i64,
    ) -> Result<Vec<AttemptExportRow>, AppError> {
        let rows = sqlx::query_as::<_, AttemptExportRow>(
            r#"
            SELECT
                a.id,
                u.name AS user_name,
                u.email AS user_email,
                a.score,
                a.started_at,
                a.submitted_at,
                a.answers
            FROM attempts a
            JOIN users u ON u.id = a.user_id
            WHERE a.exam_id = ?
            ORDER BY a.id
            "#,
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

// src/services/ledger.rs

use std::sync::Arc;

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, AttemptExportRow},
        user::Role,
    },
    services::catalog::ExamCatalog,
    store::Store,
    utils::{jwt::Claims, policy},
};

/// Attempt lifecycle: Open on start, Closed exactly once on submit.
#[derive(Clone)]
pub struct AttemptLedger {
    store: Arc<dyn Store>,
    catalog: ExamCatalog,
}

impl AttemptLedger {
    pub fn new(store: Arc<dyn Store>, catalog: ExamCatalog) -> Self {
        Self { store, catalog }
    }

    /// Opens a new attempt for the caller. Every call creates a fresh row.
    pub async fn start_attempt(&self, claims: &Claims, exam_id: i64) -> Result<Attempt, AppError> {
        self.catalog.visible_exam(claims, exam_id).await?;

        let attempt = self.store.insert_attempt(exam_id, claims.id).await?;
        tracing::info!(
            attempt_id = attempt.id,
            exam_id,
            user_id = claims.id,
            "Attempt started"
        );
        Ok(attempt)
    }

    /// Loads an attempt the caller may read.
    pub async fn get_attempt(&self, claims: &Claims, attempt_id: i64) -> Result<Attempt, AppError> {
        let attempt = self.find(attempt_id).await?;
        policy::require_owner(claims, attempt.user_id)?;
        Ok(attempt)
    }

    /// Loads an attempt the caller may submit against `exam_id`.
    pub async fn open_attempt(
        &self,
        claims: &Claims,
        exam_id: i64,
        attempt_id: i64,
    ) -> Result<Attempt, AppError> {
        let attempt = self.find(attempt_id).await?;
        if attempt.user_id != claims.id {
            return Err(AppError::Forbidden("Not your attempt".to_string()));
        }
        if attempt.exam_id != exam_id {
            return Err(AppError::NotFound("Attempt not found for this exam".to_string()));
        }
        if attempt.is_closed() {
            tracing::warn!(attempt_id, "Rejected resubmission of closed attempt");
            return Err(AppError::Conflict("Attempt already submitted".to_string()));
        }
        Ok(attempt)
    }

    /// Closes the attempt: answers, submitted_at and score land in one write.
    ///
    /// Losing a race against another submit yields `Conflict`; the winner's
    /// values stay in place.
    pub async fn record_submission(
        &self,
        attempt_id: i64,
        raw_answers: &str,
        score: f64,
    ) -> Result<Attempt, AppError> {
        if !self.store.close_attempt(attempt_id, raw_answers, score).await? {
            tracing::warn!(attempt_id, "Attempt was not open at write time");
            return Err(AppError::Conflict("Attempt already submitted".to_string()));
        }
        self.find(attempt_id).await
    }

    pub async fn attempts_for_exam(
        &self,
        claims: &Claims,
        exam_id: i64,
    ) -> Result<Vec<AttemptExportRow>, AppError> {
        policy::require_role(claims, Role::Admin)?;
        self.catalog.get_exam(exam_id).await?;
        self.store.list_attempts_for_exam(exam_id).await
    }

    async fn find(&self, attempt_id: i64) -> Result<Attempt, AppError> {
        self.store
            .find_attempt(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))
    }
}

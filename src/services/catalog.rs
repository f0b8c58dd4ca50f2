// src/services/catalog.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    config::DEFAULT_EXAM_DURATION_MINUTES,
    error::AppError,
    models::{
        exam::{CreateExamRequest, Exam, ExamSummary},
        question::{AnswerKey, CreateQuestionRequest, PublicQuestion, Question},
        user::Role,
    },
    store::Store,
    utils::{jwt::Claims, policy},
};

/// Exam and question definitions. Writes are admin-only; the scoring path
/// only reads answer keys.
#[derive(Clone)]
pub struct ExamCatalog {
    store: Arc<dyn Store>,
}

impl ExamCatalog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create_exam(
        &self,
        claims: &Claims,
        req: CreateExamRequest,
    ) -> Result<Exam, AppError> {
        policy::require_role(claims, Role::Admin)?;
        req.validate()?;

        let title = req.title.trim();
        if title.is_empty() {
            return Err(AppError::BadRequest("title required".to_string()));
        }
        let duration = req.duration_minutes.unwrap_or(DEFAULT_EXAM_DURATION_MINUTES);

        let exam = self.store.insert_exam(title, duration).await?;
        tracing::info!(exam_id = exam.id, "Exam created");
        Ok(exam)
    }

    pub async fn add_question(
        &self,
        claims: &Claims,
        exam_id: i64,
        req: CreateQuestionRequest,
    ) -> Result<Question, AppError> {
        policy::require_role(claims, Role::Admin)?;
        req.validate()?;
        self.get_exam(exam_id).await?;

        let answer_index = req
            .answer_index
            .ok_or_else(|| AppError::BadRequest("answer_index must be a number".to_string()))?;

        self.store
            .insert_question(exam_id, &req.text, &req.options, answer_index)
            .await
    }

    /// Idempotent. The flag never goes back to false.
    pub async fn publish_exam(&self, claims: &Claims, exam_id: i64) -> Result<(), AppError> {
        policy::require_role(claims, Role::Admin)?;
        if !self.store.publish_exam(exam_id).await? {
            return Err(AppError::NotFound("Exam not found".to_string()));
        }
        tracing::info!(exam_id, "Exam published");
        Ok(())
    }

    /// Removes the exam together with its questions and attempts.
    pub async fn delete_exam(&self, claims: &Claims, exam_id: i64) -> Result<(), AppError> {
        policy::require_role(claims, Role::Admin)?;
        if !self.store.delete_exam(exam_id).await? {
            return Err(AppError::NotFound("Exam not found".to_string()));
        }
        tracing::info!(exam_id, "Exam deleted");
        Ok(())
    }

    pub async fn get_exam(&self, exam_id: i64) -> Result<Exam, AppError> {
        self.store
            .find_exam(exam_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))
    }

    /// Same as `get_exam`, but unpublished exams only exist for admins.
    pub async fn visible_exam(&self, claims: &Claims, exam_id: i64) -> Result<Exam, AppError> {
        let exam = self.get_exam(exam_id).await?;
        if !exam.published && claims.role != Role::Admin {
            return Err(AppError::NotFound("Exam not found".to_string()));
        }
        Ok(exam)
    }

    pub async fn list_exams(&self, claims: &Claims) -> Result<Vec<Exam>, AppError> {
        policy::require_role(claims, Role::Admin)?;
        self.store.list_exams().await
    }

    pub async fn list_published_exams(&self) -> Result<Vec<ExamSummary>, AppError> {
        let exams = self.store.list_published_exams().await?;
        Ok(exams.into_iter().map(ExamSummary::from).collect())
    }

    /// Student-facing view: answer keys are stripped.
    pub async fn list_questions_for_exam(
        &self,
        claims: &Claims,
        exam_id: i64,
    ) -> Result<Vec<PublicQuestion>, AppError> {
        self.visible_exam(claims, exam_id).await?;
        let questions = self.store.list_questions(exam_id).await?;
        Ok(questions.into_iter().map(PublicQuestion::from).collect())
    }

    /// Full questions, answer keys included.
    pub async fn admin_questions(
        &self,
        claims: &Claims,
        exam_id: i64,
    ) -> Result<Vec<Question>, AppError> {
        policy::require_role(claims, Role::Admin)?;
        self.get_exam(exam_id).await?;
        self.store.list_questions(exam_id).await
    }

    /// Answer keys in question id order, the order positional submissions follow.
    pub async fn answer_keys(&self, exam_id: i64) -> Result<Vec<AnswerKey>, AppError> {
        let questions = self.store.list_questions(exam_id).await?;
        Ok(questions.iter().map(AnswerKey::from).collect())
    }
}

// src/services/scoring.rs

use std::collections::{HashMap, HashSet};

use crate::{
    error::AppError,
    models::{
        attempt::{ScoreCard, SubmitRequest, Submission},
        question::AnswerKey,
    },
    services::{catalog::ExamCatalog, ledger::AttemptLedger},
    utils::jwt::Claims,
};

/// Grades a submission against the exam's answer keys.
///
/// `keys` must be in question id order; positional answers are matched
/// against that order. Each question is credited at most once, so
/// `correct <= total` and `score` stays within `[0, 100]`.
pub fn score(keys: &[AnswerKey], submission: &Submission) -> ScoreCard {
    let total = keys.len();

    let correct = match submission {
        Submission::Keyed(answers) => {
            let lookup: HashMap<i64, i64> = keys
                .iter()
                .map(|k| (k.question_id, k.answer_index))
                .collect();
            let mut graded = HashSet::new();

            answers
                .iter()
                // first answer for a question id is the one graded
                .filter(|a| lookup.contains_key(&a.question_id) && graded.insert(a.question_id))
                .filter(|a| a.answer_index == lookup.get(&a.question_id).copied())
                .count()
        }
        Submission::Positional(answers) => keys
            .iter()
            .zip(answers.iter())
            .filter(|(key, chosen)| **chosen == Some(key.answer_index))
            .count(),
    };

    let score = if total > 0 {
        (correct as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    ScoreCard {
        score,
        correct,
        total,
    }
}

/// Runs the submit flow: validate, read keys, grade, close the attempt.
#[derive(Clone)]
pub struct ScoringEngine {
    catalog: ExamCatalog,
    ledger: AttemptLedger,
}

impl ScoringEngine {
    pub fn new(catalog: ExamCatalog, ledger: AttemptLedger) -> Self {
        Self { catalog, ledger }
    }

    pub async fn submit(
        &self,
        claims: &Claims,
        exam_id: i64,
        req: SubmitRequest,
    ) -> Result<ScoreCard, AppError> {
        let raw_answers = req.answers.get();
        let submission = Submission::parse(raw_answers)?;

        let attempt = self.ledger.open_attempt(claims, exam_id, req.attempt_id).await?;
        let keys = self.catalog.answer_keys(exam_id).await?;
        let card = score(&keys, &submission);

        self.ledger
            .record_submission(attempt.id, raw_answers, card.score)
            .await?;

        tracing::info!(
            attempt_id = attempt.id,
            exam_id,
            user_id = claims.id,
            correct = card.correct,
            total = card.total,
            "Attempt submitted"
        );
        Ok(card)
    }
}

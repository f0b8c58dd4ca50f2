// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    services::{
        catalog::ExamCatalog, credentials::CredentialStore, ledger::AttemptLedger,
        scoring::ScoringEngine,
    },
    store::Store,
};

/// Components wired over one shared store.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub credentials: CredentialStore,
    pub catalog: ExamCatalog,
    pub ledger: AttemptLedger,
    pub scoring: ScoringEngine,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let credentials =
            CredentialStore::new(store.clone(), &config.jwt_secret, config.jwt_expiration);
        let catalog = ExamCatalog::new(store.clone());
        let ledger = AttemptLedger::new(store, catalog.clone());
        let scoring = ScoringEngine::new(catalog.clone(), ledger.clone());

        Self {
            config,
            credentials,
            catalog,
            ledger,
            scoring,
        }
    }
}

impl FromRef<AppState> for CredentialStore {
    fn from_ref(state: &AppState) -> Self {
        state.credentials.clone()
    }
}

impl FromRef<AppState> for ExamCatalog {
    fn from_ref(state: &AppState) -> Self {
        state.catalog.clone()
    }
}

impl FromRef<AppState> for AttemptLedger {
    fn from_ref(state: &AppState) -> Self {
        state.ledger.clone()
    }
}

impl FromRef<AppState> for ScoringEngine {
    fn from_ref(state: &AppState) -> Self {
        state.scoring.clone()
    }
}

// src/services/mod.rs

pub mod catalog;
pub mod credentials;
pub mod ledger;
pub mod scoring;

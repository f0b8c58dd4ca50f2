// src/utils/mod.rs

pub mod export;
pub mod hash;
pub mod jwt;
pub mod policy;

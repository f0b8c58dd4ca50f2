// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Token lifetime: 8 hours.
pub const DEFAULT_JWT_EXPIRATION: u64 = 8 * 60 * 60;

/// Exam duration used when an admin does not supply one.
pub const DEFAULT_EXAM_DURATION_MINUTES: i64 = 30;

/// Local development signing key. Never use outside a dev machine.
pub const DEV_JWT_SECRET: &str = "verysecret_dev_key";

/// Bootstrap admin password used when `ADMIN_PASSWORD` is unset.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub port: u16,
    pub rust_log: String,
    pub admin_name: String,
    pub admin_email: String,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://cbt.sqlite?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string());

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_JWT_EXPIRATION);

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let admin_name = env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin".to_string());
        let admin_email =
            env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
        let admin_password = env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            port,
            rust_log,
            admin_name,
            admin_email,
            admin_password,
        }
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

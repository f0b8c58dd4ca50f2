// src/services/credentials.rs

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::AppError,
    models::user::{AuthResponse, LoginRequest, RegisterRequest, Role, User},
    store::{NewUser, Store},
    utils::{
        hash::{hash_password_async, verify_password_async},
        jwt::{Claims, sign_jwt, verify_jwt},
    },
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Verifies and issues identity claims.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn Store>,
    secret: Arc<str>,
    expiration_seconds: u64,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn Store>, secret: &str, expiration_seconds: u64) -> Self {
        Self {
            store,
            secret: Arc::from(secret),
            expiration_seconds,
        }
    }

    /// Registers a new student.
    ///
    /// The password is hashed before the row is written; the token is only
    /// issued once the insert has committed.
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, AppError> {
        req.validate()?;

        let email = normalize_email(&req.email);
        let name = req.name.as_deref().map(str::trim).unwrap_or_default();
        let password_hash = hash_password_async(req.password).await?;

        let user = self
            .store
            .insert_user(NewUser {
                name,
                email: &email,
                password_hash: &password_hash,
                role: Role::Student,
            })
            .await?;

        tracing::info!(user_id = user.id, "Registered new user");
        self.respond(user)
    }

    /// Authenticates by email and password.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, AppError> {
        req.validate()?;

        let email = normalize_email(&req.email);
        let Some(user) = self.store.find_user_by_email(&email).await? else {
            return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
        };

        let is_valid = verify_password_async(req.password, user.password.clone()).await?;
        if !is_valid {
            return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
        }

        self.respond(user)
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        sign_jwt(user, &self.secret, self.expiration_seconds)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        if token.is_empty() {
            return Err(AppError::AuthError("No token".to_string()));
        }
        verify_jwt(token, &self.secret)
    }

    /// Creates an administrator when none exists. Returns whether one was created.
    ///
    /// Falls back to `default_password` when `password` is `None`; that
    /// credential is publicly known and must be rotated on first login.
    pub async fn bootstrap_admin(
        &self,
        name: &str,
        email: &str,
        password: Option<&str>,
        default_password: &str,
    ) -> Result<bool, AppError> {
        if self.store.any_admin().await? {
            return Ok(false);
        }

        let email = normalize_email(email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            tracing::error!(
                "Cannot seed admin: {} is already registered to a non-admin account. \
                 Set ADMIN_EMAIL to an unused address.",
                email
            );
            return Err(AppError::Conflict(format!(
                "ADMIN_EMAIL {} already belongs to a non-admin account",
                email
            )));
        }

        let password = match password {
            Some(p) => p,
            None => {
                tracing::warn!(
                    "ADMIN_PASSWORD not set: seeding admin {} with the built-in default password. \
                     Rotate it immediately.",
                    email
                );
                default_password
            }
        };

        let password_hash = hash_password_async(password.to_string()).await?;
        let user = self
            .store
            .insert_user(NewUser {
                name,
                email: &email,
                password_hash: &password_hash,
                role: Role::Admin,
            })
            .await?;

        tracing::info!(user_id = user.id, "Admin user created: {}", user.email);
        Ok(true)
    }

    fn respond(&self, user: User) -> Result<AuthResponse, AppError> {
        let token = self.issue_token(&user)?;
        Ok(AuthResponse { user, token })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::user::{Role, User},
    services::credentials::CredentialStore,
    utils::policy,
};

/// JWT Claims structure.
///
/// The sole source of identity for authorization decisions; handlers never
/// re-read the user row to learn a role.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Claims {
    /// User ID.
    pub id: i64,
    pub role: Role,
    pub email: String,
    /// Issued-at as Unix timestamp.
    pub iat: usize,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

fn now_secs() -> Result<usize, AppError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize)
}

/// Signs a new JWT for the user, valid for `expiration_seconds`.
pub fn sign_jwt(user: &User, secret: &str, expiration_seconds: u64) -> Result<String, AppError> {
    let issued_at = now_secs()?;

    let claims = Claims {
        id: user.id,
        role: user.role,
        email: user.email.clone(),
        iat: issued_at,
        exp: issued_at + expiration_seconds as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
/// Expiry is exact: no leeway past `exp`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: Option<&str>) -> Result<&str, AppError> {
    match header_value {
        Some(value) => value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::AuthError("Invalid token".to_string())),
        None => Err(AppError::AuthError("No token".to_string())),
    }
}

/// Axum Middleware: Authentication.
///
/// Intercepts requests, validates the 'Authorization: Bearer <token>' header.
/// If valid, injects `Claims` into the request extensions for handlers to use.
/// If invalid, returns 401 Unauthorized.
pub async fn auth_middleware(
    State(credentials): State<CredentialStore>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = bearer_token(auth_header)?;
    let claims = credentials.verify_token(token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Axum Middleware: Admin Authorization.
///
/// Must be used AFTER `auth_middleware`. Checks if the injected `Claims` has 'admin' role.
/// If not, returns 403 Forbidden.
pub async fn admin_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let claims = policy::require_authenticated(req.extensions().get::<Claims>())?;
    policy::require_role(claims, Role::Admin)?;

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: 42,
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            password: String::new(),
            role,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn sign_then_verify_carries_identity() {
        let token = sign_jwt(&user(Role::Admin), "secret", 60).unwrap();
        let claims = verify_jwt(&token, "secret").unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.email, "ann@example.com");
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = sign_jwt(&user(Role::Student), "secret", 60).unwrap();
        assert!(matches!(verify_jwt(&token, "other"), Err(AppError::AuthError(_))));
    }

    fn token_expiring_at(exp: usize) -> String {
        let claims = Claims {
            id: 1,
            role: Role::Student,
            email: "old@example.com".to_string(),
            iat: exp - 8 * 3600,
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap()
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = token_expiring_at(now_secs().unwrap() - 2 * 3600);
        assert!(matches!(verify_jwt(&token, "secret"), Err(AppError::AuthError(_))));
    }

    #[test]
    fn token_just_past_expiry_is_rejected() {
        let token = token_expiring_at(now_secs().unwrap() - 5);
        assert!(matches!(verify_jwt(&token, "secret"), Err(AppError::AuthError(_))));
    }

    #[test]
    fn token_before_expiry_is_accepted() {
        let token = token_expiring_at(now_secs().unwrap() + 30);
        assert!(verify_jwt(&token, "secret").is_ok());
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(verify_jwt("not.a.jwt", "secret").is_err());
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert!(bearer_token(Some("Basic abc")).is_err());
        assert!(bearer_token(Some("Bearer ")).is_err());
        assert!(bearer_token(None).is_err());
    }
}

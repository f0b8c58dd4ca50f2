// src/utils/policy.rs

//! Role and ownership predicates shared by every protected operation.

use crate::{error::AppError, models::user::Role, utils::jwt::Claims};

pub fn require_authenticated(claims: Option<&Claims>) -> Result<&Claims, AppError> {
    claims.ok_or_else(|| AppError::AuthError("No token".to_string()))
}

pub fn require_role(claims: &Claims, role: Role) -> Result<(), AppError> {
    if claims.role != role {
        return Err(AppError::Forbidden(format!("{} only", capitalize(role.as_str()))));
    }
    Ok(())
}

/// Admins pass for any owner.
pub fn require_owner(claims: &Claims, owner_id: i64) -> Result<(), AppError> {
    if claims.role == Role::Admin || claims.id == owner_id {
        return Ok(());
    }
    Err(AppError::Forbidden("Not your attempt".to_string()))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

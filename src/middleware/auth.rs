// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::models::{Role, UserId};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use std::sync::Arc;

/// Cookie carrying the access token for browser clients.
pub const TOKEN_COOKIE: &str = "typing_token";

/// Authenticated caller extracted from a verified access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub login_id: String,
    pub role: Role,
    pub is_guest: bool,
}

impl AuthUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.role.has_permission(permission)
    }

    /// Fail with `Forbidden` unless the caller holds `permission`.
    pub fn require_permission(&self, permission: &str) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("{} is required", permission)))
        }
    }
}

/// Middleware that requires a valid access token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) => token.trim().to_string(),
            None => return Err(AppError::Unauthorized),
        }
    };

    let claims = state
        .token_service
        .validate(&token, Utc::now())
        .inspect_err(|e| tracing::warn!(reason = ?e, "Rejected token"))?;

    if !claims.is_access() {
        tracing::warn!(subject = %claims.subject, "Refresh token used as access token");
        return Err(AppError::Unauthorized);
    }

    let role = Role::from_code(&claims.role).ok_or_else(|| {
        tracing::warn!(subject = %claims.subject, role = %claims.role, "Unknown role in token");
        AppError::Unauthorized
    })?;

    request.extensions_mut().insert(AuthUser {
        user_id: claims.subject,
        login_id: claims.login_id,
        role,
        is_guest: claims.is_guest,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_user(role: Role) -> AuthUser {
        AuthUser {
            user_id: UserId::generate(),
            login_id: "someone".to_string(),
            role,
            is_guest: role == Role::Guest,
        }
    }

    #[test]
    fn test_require_permission() {
        assert!(auth_user(Role::User)
            .require_permission("WRITE_STUDY_TEXT")
            .is_ok());
        assert!(matches!(
            auth_user(Role::Guest).require_permission("WRITE_STUDY_TEXT"),
            Err(AppError::Forbidden(_))
        ));
        assert!(auth_user(Role::Guest)
            .require_permission("READ_STUDY_TEXT")
            .is_ok());
    }
}

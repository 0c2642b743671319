// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and token routes: registration, login, guest access, refresh, logout.

use axum::{extract::State, http::StatusCode, routing::post, Extension, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::Config;
use crate::db::{RefreshTokenRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::auth::{AuthUser, TOKEN_COOKIE};
use crate::models::{LoginId, Role, StoredRefreshToken, User, UserId};
use crate::routes::api::UserResponse;
use crate::services::{hash_password, verify_password, IssuedToken};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/guest", post(guest))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

/// Auth routes that need an access token. Mounted behind `require_auth`.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/logout-all", post(logout_all))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Login id is required"))]
    pub login_id: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Login id is required"))]
    pub login_id: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Tokens handed to the client after login, refresh or guest access.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_expires_at: Option<String>,
    pub user: UserResponse,
}

impl TokenResponse {
    fn new(access: IssuedToken, refresh: Option<IssuedToken>, user: UserResponse) -> Self {
        Self {
            access_token: access.token,
            token_type: "Bearer".to_string(),
            expires_at: format_utc_rfc3339(access.expires_at),
            refresh_expires_at: refresh.as_ref().map(|r| format_utc_rfc3339(r.expires_at)),
            refresh_token: refresh.map(|r| r.token),
            user,
        }
    }
}

// ─── Cookies ─────────────────────────────────────────────────

fn secure_cookies(config: &Config) -> bool {
    config.frontend_url.starts_with("https://")
}

/// HttpOnly cookie carrying the access token until `expires_at`.
fn token_cookie(config: &Config, token: &IssuedToken, now: DateTime<Utc>) -> Cookie<'static> {
    let max_age = (token.expires_at - now).max(Duration::zero());
    Cookie::build((TOKEN_COOKIE, token.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure_cookies(config))
        .max_age(time::Duration::seconds(max_age.num_seconds()))
        .build()
}

/// Removal must repeat the attributes the cookie was set with.
fn removal_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure_cookies(config))
        .max_age(time::Duration::ZERO)
        .build()
}

// ─── Handlers ────────────────────────────────────────────────

/// Argon2 is CPU bound, so hashing runs on the blocking pool.
async fn hash_blocking(password: String) -> Result<String> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    Ok(hash)
}

async fn verify_blocking(password: String, hash: String) -> Result<()> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    Ok(())
}

/// Issue an access/refresh pair for `user` and remember the refresh token.
fn issue_token_pair(
    state: &AppState,
    user: &User,
    now: DateTime<Utc>,
) -> Result<(IssuedToken, IssuedToken)> {
    let access = state.token_service.generate_access_token(user, now)?;
    let refresh = state.token_service.generate_refresh_token(user, now)?;

    state.db.save_refresh_token(StoredRefreshToken {
        token: refresh.token.clone(),
        user_id: user.id(),
        expires_at: refresh.expires_at,
        created_at: now,
        revoked: false,
    })?;

    Ok((access, refresh))
}

/// Create an account with the `USER` role.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    payload.validate()?;
    let login_id = LoginId::parse(&payload.login_id)?;

    if state.db.login_id_exists(login_id.as_str())? {
        return Err(AppError::Conflict(format!(
            "Login id {} is already taken",
            login_id
        )));
    }

    let password_hash = hash_blocking(payload.password).await?;
    let user = User::create(
        UserId::generate(),
        login_id,
        password_hash,
        Role::User,
        Utc::now(),
    );
    let user = state.db.create_user(user)?;

    tracing::info!(user_id = %user.id(), login_id = %user.login_id(), "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Verify credentials, record today's login and issue tokens.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<TokenResponse>)> {
    payload.validate()?;

    let Some(user) = state.db.find_user_by_login_id(payload.login_id.trim())? else {
        tracing::warn!("Login attempt for unknown login id");
        return Err(AppError::InvalidCredentials);
    };

    verify_blocking(payload.password, user.password_hash().to_string())
        .await
        .inspect_err(|_| tracing::warn!(user_id = %user.id(), "Login with wrong password"))?;

    let now = Utc::now();
    let user = user.record_login(now.date_naive(), now)?;
    let user = state.db.save_user(user)?;

    let (access, refresh) = issue_token_pair(&state, &user, now)?;

    tracing::info!(
        user_id = %user.id(),
        consecutive_days = user.login_statistics().consecutive_days(),
        "User logged in"
    );

    let jar = jar.add(token_cookie(&state.config, &access, now));
    Ok((
        jar,
        Json(TokenResponse::new(access, Some(refresh), UserResponse::from(&user))),
    ))
}

/// Issue a short-lived access token for a throwaway guest identity.
async fn guest(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<TokenResponse>)> {
    let now = Utc::now();
    let user_id = UserId::generate();
    let login_id = format!("guest-{}", &user_id.as_uuid().simple().to_string()[..8]);

    let access = state
        .token_service
        .generate_guest_token(user_id, &login_id, now)?;

    tracing::info!(user_id = %user_id, "Guest session issued");

    let user = UserResponse::guest(user_id, login_id);
    let jar = jar.add(token_cookie(&state.config, &access, now));
    Ok((jar, Json(TokenResponse::new(access, None, user))))
}

/// Exchange a stored refresh token for a new pair. The old one is revoked.
async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<RefreshRequest>,
) -> Result<(CookieJar, Json<TokenResponse>)> {
    payload.validate()?;
    let now = Utc::now();

    let claims = state
        .token_service
        .validate(&payload.refresh_token, now)
        .inspect_err(|e| tracing::warn!(reason = ?e, "Rejected refresh token"))?;
    if !claims.is_refresh() {
        tracing::warn!(subject = %claims.subject, "Access token presented for refresh");
        return Err(AppError::Unauthorized);
    }

    let stored = state.db.find_refresh_token(&payload.refresh_token)?;
    if !stored.is_some_and(|t| t.is_valid(now) && t.user_id == claims.subject) {
        tracing::warn!(subject = %claims.subject, "Refresh token unknown or revoked");
        return Err(AppError::Unauthorized);
    }

    let user = state
        .db
        .find_user(&claims.subject)?
        .ok_or(AppError::Unauthorized)?;

    // Only the request that flips the token to revoked may redeem it.
    if !state.db.revoke_refresh_token(&payload.refresh_token)? {
        tracing::warn!(subject = %claims.subject, "Refresh token already redeemed");
        return Err(AppError::Unauthorized);
    }
    let (access, refresh) = issue_token_pair(&state, &user, now)?;

    tracing::info!(user_id = %user.id(), "Tokens refreshed");

    let jar = jar.add(token_cookie(&state.config, &access, now));
    Ok((
        jar,
        Json(TokenResponse::new(access, Some(refresh), UserResponse::from(&user))),
    ))
}

/// Revoke the presented refresh token and clear the access cookie.
///
/// Unknown tokens are ignored so logout is idempotent.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<RefreshRequest>,
) -> Result<(CookieJar, StatusCode)> {
    if state.db.revoke_refresh_token(&payload.refresh_token)? {
        tracing::info!("Refresh token revoked on logout");
    }

    let jar = jar.add(removal_cookie(&state.config));
    Ok((jar, StatusCode::NO_CONTENT))
}

/// Revoke every refresh token of the caller and clear the access cookie.
///
/// Access tokens already handed out stay valid until they expire.
async fn logout_all(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode)> {
    let revoked = state.db.revoke_refresh_tokens_for_user(&user.user_id)?;

    tracing::info!(user_id = %user.user_id, revoked, "Logged out everywhere");

    let jar = jar.add(removal_cookie(&state.config));
    Ok((jar, StatusCode::NO_CONTENT))
}

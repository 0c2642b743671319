// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users: profile and typing statistics.

use crate::db::{SessionRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{LoginStatistics, Role, TypingStatistics, User, UserId};
use crate::time_utils::{format_date, parse_utc_rfc3339};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/stats/typing", get(get_typing_stats))
}

// ─── User Profile ────────────────────────────────────────────

/// Login streak as shown to the user.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LoginStatisticsResponse {
    pub last_login_date: Option<String>,
    pub consecutive_days: u32,
    pub max_consecutive_days: u32,
    pub total_days: u32,
}

impl From<&LoginStatistics> for LoginStatisticsResponse {
    fn from(stats: &LoginStatistics) -> Self {
        Self {
            last_login_date: stats.last_login_date().map(format_date),
            consecutive_days: stats.consecutive_days(),
            max_consecutive_days: stats.max_consecutive_days(),
            total_days: stats.total_days(),
        }
    }
}

/// Current user response.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub user_id: String,
    pub login_id: String,
    pub role: String,
    pub is_guest: bool,
    /// Absent for guests, who are never stored.
    pub login_statistics: Option<LoginStatisticsResponse>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id().to_string(),
            login_id: user.login_id().to_string(),
            role: user.role().code().to_string(),
            is_guest: false,
            login_statistics: Some(user.login_statistics().into()),
        }
    }
}

impl UserResponse {
    pub fn guest(user_id: UserId, login_id: String) -> Self {
        Self {
            user_id: user_id.to_string(),
            login_id,
            role: Role::Guest.code().to_string(),
            is_guest: true,
            login_statistics: None,
        }
    }
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    if user.is_guest {
        return Ok(Json(UserResponse::guest(user.user_id, user.login_id)));
    }

    let profile = state
        .db
        .find_user(&user.user_id)?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(UserResponse::from(&profile)))
}

// ─── Typing Statistics ───────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    /// Inclusive lower bound on completion time (RFC3339)
    pub from: Option<String>,
    /// Inclusive upper bound on completion time (RFC3339)
    pub to: Option<String>,
}

/// Aggregate typing performance.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TypingStatsResponse {
    pub total_sessions: u32,
    pub average_accuracy: f64,
    pub max_accuracy: f64,
    pub min_accuracy: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_characters: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub total_correct_characters: u64,
}

impl From<TypingStatistics> for TypingStatsResponse {
    fn from(stats: TypingStatistics) -> Self {
        Self {
            total_sessions: stats.total_sessions,
            average_accuracy: round2(stats.average_accuracy),
            max_accuracy: stats.max_accuracy,
            min_accuracy: stats.min_accuracy,
            total_characters: stats.total_characters,
            total_correct_characters: stats.total_correct_characters,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn parse_bound(name: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    raw.map(|raw| {
        parse_utc_rfc3339(raw).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Invalid '{}' parameter: must be RFC3339 datetime",
                name
            ))
        })
    })
    .transpose()
}

/// Parse the optional `[from, to]` window, rejecting inverted ranges.
fn parse_window(query: &StatsQuery) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    let from = parse_bound("from", query.from.as_deref())?;
    let to = parse_bound("to", query.to.as_deref())?;

    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Err(AppError::BadRequest(
                "'from' must not be later than 'to'".to_string(),
            ));
        }
    }
    Ok((from, to))
}

/// Get typing statistics over completed sessions.
async fn get_typing_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<TypingStatsResponse>> {
    let (from, to) = parse_window(&query)?;

    let sessions = state.db.find_sessions_by_user(&user.user_id)?;
    let stats = TypingStatistics::from_sessions(&sessions, from, to);

    tracing::debug!(
        user_id = %user.user_id,
        total_sessions = stats.total_sessions,
        "Computed typing statistics"
    );

    Ok(Json(stats.into()))
}

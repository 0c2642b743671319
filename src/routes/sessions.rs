// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typing session routes: start, inspect and complete a practice attempt.

use crate::db::{SessionRepository, StudyTextRepository};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{SessionId, StudyTextId, TypingResult, TypingSession, READ_STUDY_TEXT};
use crate::routes::texts::load_owned_text;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sessions", post(start_session))
        .route("/api/sessions/{id}", get(get_session))
        .route("/api/sessions/{id}/complete", post(complete_session))
}

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub study_text_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteSessionRequest {
    #[validate(length(max = 10000, message = "Typed text is too long"))]
    pub typed_text: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TypingResultResponse {
    pub total_chars: u32,
    pub correct_chars: u32,
    pub incorrect_chars: u32,
    pub accuracy_percent: f64,
    pub error_rate: f64,
    pub words_per_minute: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub elapsed_ms: u64,
    pub meets_quality_standards: bool,
}

impl From<&TypingResult> for TypingResultResponse {
    fn from(result: &TypingResult) -> Self {
        Self {
            total_chars: result.total_chars(),
            correct_chars: result.correct_chars(),
            incorrect_chars: result.incorrect_chars(),
            accuracy_percent: result.accuracy_percent(),
            error_rate: result.error_rate(),
            words_per_minute: result.words_per_minute(),
            elapsed_ms: result.elapsed().as_millis(),
            meets_quality_standards: result.meets_quality_standards(),
        }
    }
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub id: String,
    pub study_text_id: String,
    /// "active" or "completed"
    pub status: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    /// Running time while active, final time once completed
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub duration_ms: u64,
    pub abandoned: bool,
    pub result: Option<TypingResultResponse>,
}

impl SessionResponse {
    /// Snapshot of `session` as seen at `now`.
    fn at(session: &TypingSession, now: DateTime<Utc>) -> Self {
        Self {
            id: session.id().to_string(),
            study_text_id: session.study_text_id().to_string(),
            status: if session.is_completed() {
                "completed"
            } else {
                "active"
            }
            .to_string(),
            started_at: format_utc_rfc3339(session.started_at()),
            completed_at: session.completed_at().map(format_utc_rfc3339),
            duration_ms: session.current_duration(now).as_millis(),
            abandoned: session.is_abandoned_default(now),
            result: session.result().map(Into::into),
        }
    }
}

/// Load a session owned by `user`. Sessions of other users are reported as missing.
fn load_owned_session(state: &AppState, user: &AuthUser, id: &SessionId) -> Result<TypingSession> {
    state
        .db
        .find_session(id)?
        .filter(|s| s.belongs_to_user(&user.user_id))
        .ok_or_else(|| AppError::NotFound(format!("Typing session {} not found", id)))
}

async fn start_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    user.require_permission(READ_STUDY_TEXT)?;
    let text_id = StudyTextId::parse(&payload.study_text_id)?;
    let text = load_owned_text(&state, &user, &text_id)?;

    let now = Utc::now();
    let session = TypingSession::start(SessionId::generate(), user.user_id, text.id, now);
    let session = state.db.save_session(session)?;

    tracing::info!(
        user_id = %user.user_id,
        session_id = %session.id(),
        text_id = %text.id,
        "Typing session started"
    );

    Ok((StatusCode::CREATED, Json(SessionResponse::at(&session, now))))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>> {
    user.require_permission(READ_STUDY_TEXT)?;
    let id = SessionId::parse(&id)?;

    let session = load_owned_session(&state, &user, &id)?;
    Ok(Json(SessionResponse::at(&session, Utc::now())))
}

/// Score the typed text against the session's study text and complete it.
async fn complete_session(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<CompleteSessionRequest>,
) -> Result<Json<SessionResponse>> {
    user.require_permission(READ_STUDY_TEXT)?;
    payload.validate()?;
    let id = SessionId::parse(&id)?;

    let mut session = load_owned_session(&state, &user, &id)?;
    let text = state
        .db
        .find_study_text(&session.study_text_id())?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Study text {} for session {} no longer exists",
                session.study_text_id(),
                id
            ))
        })?;

    let now = Utc::now();
    let result = session
        .complete(&payload.typed_text, &text.content, now)
        .inspect_err(|_| tracing::warn!(session_id = %id, "Session already completed"))?;
    let session = state.db.save_session(session)?;

    tracing::info!(
        user_id = %user.user_id,
        session_id = %id,
        accuracy = result.accuracy_percent(),
        wpm = result.words_per_minute(),
        "Typing session completed"
    );

    Ok(Json(SessionResponse::at(&session, now)))
}

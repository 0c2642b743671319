// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Study text library routes.

use crate::db::StudyTextRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{StudyText, StudyTextId, READ_STUDY_TEXT, WRITE_STUDY_TEXT};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_PAGE_SIZE: usize = 20;
const DEFAULT_RANDOM_LIMIT: usize = 10;
const MAX_BATCH: usize = 100;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/texts", get(list_texts).post(create_text))
        .route("/api/texts/random", get(random_texts))
        .route("/api/texts/languages", get(list_languages))
        .route(
            "/api/texts/{id}",
            get(get_text).put(update_text).delete(delete_text),
        )
}

/// Body of both create and update.
#[derive(Debug, Deserialize, Validate)]
pub struct StudyTextRequest {
    #[validate(length(min = 1, max = 50, message = "Language must be 1 to 50 characters"))]
    pub language: String,

    #[validate(length(min = 1, max = 10000, message = "Content must be 1 to 10000 characters"))]
    pub content: String,

    #[validate(length(max = 10000))]
    #[serde(default)]
    pub explanation: Option<String>,
}

impl StudyTextRequest {
    fn language(&self) -> String {
        self.language.trim().to_string()
    }

    /// Blank explanations are stored as none.
    fn explanation(&self) -> Option<String> {
        self.explanation
            .as_ref()
            .filter(|e| !e.trim().is_empty())
            .cloned()
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListTextsQuery {
    pub language: Option<String>,
    /// 0-based page number
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 100, message = "Page size must be 1 to 100"))]
    pub size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RandomTextsQuery {
    pub language: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StudyTextResponse {
    pub id: String,
    pub language: String,
    pub content: String,
    pub explanation: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<StudyText> for StudyTextResponse {
    fn from(text: StudyText) -> Self {
        Self {
            id: text.id.to_string(),
            language: text.language,
            content: text.content,
            explanation: text.explanation,
            created_at: format_utc_rfc3339(text.created_at),
            updated_at: format_utc_rfc3339(text.updated_at),
        }
    }
}

/// One page of a user's library.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StudyTextPage {
    pub content: Vec<StudyTextResponse>,
    pub page: usize,
    pub size: usize,
    pub total_elements: usize,
    pub total_pages: usize,
    pub first: bool,
    pub last: bool,
}

impl StudyTextPage {
    /// Slice `texts` into page `page` of `size` entries. `size` must be non-zero.
    fn of(texts: Vec<StudyText>, page: usize, size: usize) -> Self {
        let total_elements = texts.len();
        let total_pages = total_elements.div_ceil(size);
        let content = texts
            .into_iter()
            .skip(page.saturating_mul(size))
            .take(size)
            .map(Into::into)
            .collect();

        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
            first: page == 0,
            last: page.saturating_add(1) >= total_pages,
        }
    }
}

/// Load a text owned by `user`. Texts of other users are reported as missing.
pub(crate) fn load_owned_text(
    state: &AppState,
    user: &AuthUser,
    id: &StudyTextId,
) -> Result<StudyText> {
    state
        .db
        .find_study_text(id)?
        .filter(|t| t.user_id == user.user_id)
        .ok_or_else(|| AppError::NotFound(format!("Study text {} not found", id)))
}

/// The caller's texts, oldest first, optionally restricted to one language.
fn load_library(
    state: &AppState,
    user: &AuthUser,
    language: Option<&str>,
) -> Result<Vec<StudyText>> {
    let texts = state.db.find_study_texts_by_user(&user.user_id)?;
    Ok(match language.filter(|l| !l.trim().is_empty()) {
        Some(language) => texts.into_iter().filter(|t| t.has_language(language)).collect(),
        None => texts,
    })
}

/// Up to `limit` distinct texts in random order.
fn pick_random(texts: &[StudyText], limit: usize) -> Vec<StudyText> {
    let mut rng = rand::thread_rng();
    texts.choose_multiple(&mut rng, limit).cloned().collect()
}

async fn list_texts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListTextsQuery>,
) -> Result<Json<StudyTextPage>> {
    user.require_permission(READ_STUDY_TEXT)?;
    query.validate()?;

    let texts = load_library(&state, &user, query.language.as_deref())?;
    let page = StudyTextPage::of(
        texts,
        query.page.unwrap_or(0),
        query.size.unwrap_or(DEFAULT_PAGE_SIZE),
    );
    Ok(Json(page))
}

async fn random_texts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RandomTextsQuery>,
) -> Result<Json<Vec<StudyTextResponse>>> {
    user.require_permission(READ_STUDY_TEXT)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RANDOM_LIMIT)
        .clamp(1, MAX_BATCH);

    let texts = load_library(&state, &user, query.language.as_deref())?;
    let picked = pick_random(&texts, limit);

    tracing::debug!(user_id = %user.user_id, limit, picked = picked.len(), "Random texts");

    Ok(Json(picked.into_iter().map(Into::into).collect()))
}

async fn list_languages(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<String>>> {
    user.require_permission(READ_STUDY_TEXT)?;

    let languages: BTreeSet<String> = state
        .db
        .find_study_texts_by_user(&user.user_id)?
        .into_iter()
        .map(|t| t.language)
        .collect();
    Ok(Json(languages.into_iter().collect()))
}

async fn create_text(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<StudyTextRequest>,
) -> Result<(StatusCode, Json<StudyTextResponse>)> {
    user.require_permission(WRITE_STUDY_TEXT)?;
    payload.validate()?;

    let text = state.db.save_study_text(StudyText::new(
        StudyTextId::generate(),
        user.user_id,
        payload.language(),
        payload.content.clone(),
        payload.explanation(),
        Utc::now(),
    ))?;

    tracing::info!(user_id = %user.user_id, text_id = %text.id, "Study text created");

    Ok((StatusCode::CREATED, Json(text.into())))
}

async fn get_text(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<StudyTextResponse>> {
    user.require_permission(READ_STUDY_TEXT)?;
    let id = StudyTextId::parse(&id)?;

    Ok(Json(load_owned_text(&state, &user, &id)?.into()))
}

async fn update_text(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<StudyTextRequest>,
) -> Result<Json<StudyTextResponse>> {
    user.require_permission(WRITE_STUDY_TEXT)?;
    let id = StudyTextId::parse(&id)?;
    payload.validate()?;

    let text = load_owned_text(&state, &user, &id)?.update(
        payload.language(),
        payload.content.clone(),
        payload.explanation(),
        Utc::now(),
    );
    let text = state.db.save_study_text(text)?;

    tracing::info!(user_id = %user.user_id, text_id = %id, "Study text updated");

    Ok(Json(text.into()))
}

async fn delete_text(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    user.require_permission(WRITE_STUDY_TEXT)?;
    let id = StudyTextId::parse(&id)?;

    load_owned_text(&state, &user, &id)?;
    state.db.delete_study_text(&id)?;

    tracing::info!(user_id = %user.user_id, text_id = %id, "Study text deleted");

    Ok(StatusCode::NO_CONTENT)
}

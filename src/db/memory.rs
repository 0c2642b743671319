// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process storage backed by concurrent hash maps.
//!
//! Each collection is a `DashMap`, so concurrent requests only contend on the
//! shard holding the record they touch. Clones share the same maps.

use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;

use super::{RefreshTokenRepository, SessionRepository, StudyTextRepository, UserRepository};
use crate::error::AppError;
use crate::models::{
    SessionId, StoredRefreshToken, StudyText, StudyTextId, TypingSession, User, UserId,
};

/// Shared in-memory database.
#[derive(Clone, Default)]
pub struct MemoryDb {
    users: Arc<DashMap<UserId, User>>,
    /// login id -> user id, for uniqueness and lookup
    login_index: Arc<DashMap<String, UserId>>,
    sessions: Arc<DashMap<SessionId, TypingSession>>,
    study_texts: Arc<DashMap<StudyTextId, StudyText>>,
    refresh_tokens: Arc<DashMap<String, StoredRefreshToken>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

// ─── Users ───────────────────────────────────────────────────

impl UserRepository for MemoryDb {
    fn create_user(&self, user: User) -> Result<User, AppError> {
        match self.login_index.entry(user.login_id().as_str().to_string()) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "Login id {} is already taken",
                user.login_id()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.id());
                self.users.insert(user.id(), user.clone());
                Ok(user)
            }
        }
    }

    fn save_user(&self, user: User) -> Result<User, AppError> {
        self.login_index
            .insert(user.login_id().as_str().to_string(), user.id());
        self.users.insert(user.id(), user.clone());
        Ok(user)
    }

    fn find_user(&self, id: &UserId) -> Result<Option<User>, AppError> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    fn find_user_by_login_id(&self, login_id: &str) -> Result<Option<User>, AppError> {
        let Some(user_id) = self.login_index.get(login_id).map(|id| *id) else {
            return Ok(None);
        };
        self.find_user(&user_id)
    }

    fn login_id_exists(&self, login_id: &str) -> Result<bool, AppError> {
        Ok(self.login_index.contains_key(login_id))
    }
}

// ─── Typing Sessions ─────────────────────────────────────────

impl SessionRepository for MemoryDb {
    fn save_session(&self, session: TypingSession) -> Result<TypingSession, AppError> {
        self.sessions.insert(session.id(), session.clone());
        Ok(session)
    }

    fn find_session(&self, id: &SessionId) -> Result<Option<TypingSession>, AppError> {
        Ok(self.sessions.get(id).map(|s| s.clone()))
    }

    fn find_sessions_by_user(&self, user_id: &UserId) -> Result<Vec<TypingSession>, AppError> {
        let mut sessions: Vec<TypingSession> = self
            .sessions
            .iter()
            .filter(|s| s.belongs_to_user(user_id))
            .map(|s| s.clone())
            .collect();
        sessions.sort_by_key(|s| s.started_at());
        Ok(sessions)
    }
}

// ─── Study Texts ─────────────────────────────────────────────

impl StudyTextRepository for MemoryDb {
    fn save_study_text(&self, text: StudyText) -> Result<StudyText, AppError> {
        self.study_texts.insert(text.id, text.clone());
        Ok(text)
    }

    fn find_study_text(&self, id: &StudyTextId) -> Result<Option<StudyText>, AppError> {
        Ok(self.study_texts.get(id).map(|t| t.clone()))
    }

    fn find_study_texts_by_user(&self, user_id: &UserId) -> Result<Vec<StudyText>, AppError> {
        let mut texts: Vec<StudyText> = self
            .study_texts
            .iter()
            .filter(|t| t.user_id == *user_id)
            .map(|t| t.clone())
            .collect();
        texts.sort_by_key(|t| t.created_at);
        Ok(texts)
    }

    fn delete_study_text(&self, id: &StudyTextId) -> Result<bool, AppError> {
        Ok(self.study_texts.remove(id).is_some())
    }
}

// ─── Refresh Tokens ──────────────────────────────────────────

impl RefreshTokenRepository for MemoryDb {
    fn save_refresh_token(&self, token: StoredRefreshToken) -> Result<(), AppError> {
        let now = token.created_at;
        self.refresh_tokens.retain(|_, stored| stored.is_valid(now));
        self.refresh_tokens.insert(token.token.clone(), token);
        Ok(())
    }

    fn find_refresh_token(&self, token: &str) -> Result<Option<StoredRefreshToken>, AppError> {
        Ok(self.refresh_tokens.get(token).map(|t| t.clone()))
    }

    fn revoke_refresh_token(&self, token: &str) -> Result<bool, AppError> {
        Ok(match self.refresh_tokens.get_mut(token) {
            Some(mut stored) if !stored.revoked => {
                stored.revoked = true;
                true
            }
            _ => false,
        })
    }

    fn revoke_refresh_tokens_for_user(&self, user_id: &UserId) -> Result<usize, AppError> {
        let mut revoked = 0;
        for mut entry in self.refresh_tokens.iter_mut() {
            if entry.user_id == *user_id && !entry.revoked {
                entry.revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }
}

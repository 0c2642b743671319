// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typing session lifecycle.
//!
//! A session starts Active and moves to Completed exactly once. Sessions that
//! stay Active past a threshold are *reported* as abandoned by
//! [`TypingSession::is_abandoned`]; nothing ever transitions them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::duration::ElapsedTime;
use super::ids::{SessionId, StudyTextId, UserId};
use super::typing::{score, TypingResult};

/// Active sessions older than this are reported as abandoned.
pub const DEFAULT_ABANDON_THRESHOLD: ElapsedTime = ElapsedTime::from_millis(60 * 60 * 1000);

/// Session state transition errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Typing session {0} is already completed")]
    AlreadyCompleted(SessionId),
}

/// Lifecycle state. Result and completion time exist only together.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Completed {
        completed_at: DateTime<Utc>,
        result: TypingResult,
    },
}

/// One user's timed attempt at one study text.
#[derive(Debug, Clone, PartialEq)]
pub struct TypingSession {
    id: SessionId,
    user_id: UserId,
    study_text_id: StudyTextId,
    started_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    state: SessionState,
}

impl TypingSession {
    /// Start a new Active session.
    pub fn start(
        id: SessionId,
        user_id: UserId,
        study_text_id: StudyTextId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            study_text_id,
            started_at: now,
            created_at: now,
            state: SessionState::Active,
        }
    }

    /// Rebuild a session from storage.
    pub fn reconstruct(
        id: SessionId,
        user_id: UserId,
        study_text_id: StudyTextId,
        started_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
        state: SessionState,
    ) -> Self {
        Self {
            id,
            user_id,
            study_text_id,
            started_at,
            created_at,
            state,
        }
    }

    /// Score `typed` against `target` and complete the session.
    pub fn complete(
        &mut self,
        typed: &str,
        target: &str,
        now: DateTime<Utc>,
    ) -> Result<TypingResult, SessionError> {
        self.ensure_active()?;
        let result = score(typed, target, ElapsedTime::between(self.started_at, now));
        self.finish(result, now);
        Ok(result)
    }

    /// Complete the session with a result scored elsewhere.
    pub fn complete_with_result(
        &mut self,
        result: TypingResult,
        now: DateTime<Utc>,
    ) -> Result<TypingResult, SessionError> {
        self.ensure_active()?;
        self.finish(result, now);
        Ok(result)
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Active => Ok(()),
            SessionState::Completed { .. } => Err(SessionError::AlreadyCompleted(self.id)),
        }
    }

    fn finish(&mut self, result: TypingResult, now: DateTime<Utc>) {
        self.state = SessionState::Completed {
            completed_at: now,
            result,
        };
    }

    /// True while Active and running longer than `threshold`.
    pub fn is_abandoned(&self, now: DateTime<Utc>, threshold: ElapsedTime) -> bool {
        !self.is_completed() && ElapsedTime::between(self.started_at, now) > threshold
    }

    pub fn is_abandoned_default(&self, now: DateTime<Utc>) -> bool {
        self.is_abandoned(now, DEFAULT_ABANDON_THRESHOLD)
    }

    /// Final duration once Completed, running duration while Active.
    pub fn current_duration(&self, now: DateTime<Utc>) -> ElapsedTime {
        let end = self.completed_at().unwrap_or(now);
        ElapsedTime::between(self.started_at, end)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, SessionState::Completed { .. })
    }

    pub fn result(&self) -> Option<&TypingResult> {
        match &self.state {
            SessionState::Completed { result, .. } => Some(result),
            SessionState::Active => None,
        }
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            SessionState::Completed { completed_at, .. } => Some(*completed_at),
            SessionState::Active => None,
        }
    }

    pub fn belongs_to_user(&self, user_id: &UserId) -> bool {
        self.user_id == *user_id
    }

    pub fn is_for_study_text(&self, study_text_id: &StudyTextId) -> bool {
        self.study_text_id == *study_text_id
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn study_text_id(&self) -> StudyTextId {
        self.study_text_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }
}

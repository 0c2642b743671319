// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Domain models: identifiers, scoring, sessions, statistics and users.

pub mod duration;
pub mod ids;
pub mod session;
pub mod stats;
pub mod study_text;
pub mod typing;
pub mod user;

pub use duration::ElapsedTime;
pub use ids::{IdError, SessionId, StudyTextId, UserId};
pub use session::{SessionError, SessionState, TypingSession, DEFAULT_ABANDON_THRESHOLD};
pub use stats::{LoginStatistics, StatsError, TypingStatistics};
pub use study_text::StudyText;
pub use typing::{score, ScoreError, TypingResult};
pub use user::{
    LoginId, LoginIdError, Role, StoredRefreshToken, User, READ_STUDY_TEXT, WRITE_STUDY_TEXT,
};

//! Persistence layer.
//!
//! The domain never queries storage itself; handlers load an aggregate through
//! these traits, apply a domain operation, and save the result back.

pub mod memory;

pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{
    SessionId, StoredRefreshToken, StudyText, StudyTextId, TypingSession, User, UserId,
};

/// Storage for users and their login statistics.
pub trait UserRepository {
    /// Insert a new user. Fails with `Conflict` if the login id is taken.
    fn create_user(&self, user: User) -> Result<User, AppError>;
    /// Replace an existing user.
    fn save_user(&self, user: User) -> Result<User, AppError>;
    fn find_user(&self, id: &UserId) -> Result<Option<User>, AppError>;
    fn find_user_by_login_id(&self, login_id: &str) -> Result<Option<User>, AppError>;
    fn login_id_exists(&self, login_id: &str) -> Result<bool, AppError>;
}

/// Storage for typing sessions.
pub trait SessionRepository {
    fn save_session(&self, session: TypingSession) -> Result<TypingSession, AppError>;
    fn find_session(&self, id: &SessionId) -> Result<Option<TypingSession>, AppError>;
    /// All sessions of a user, oldest first.
    fn find_sessions_by_user(&self, user_id: &UserId) -> Result<Vec<TypingSession>, AppError>;
}

/// Storage for practice texts.
pub trait StudyTextRepository {
    fn save_study_text(&self, text: StudyText) -> Result<StudyText, AppError>;
    fn find_study_text(&self, id: &StudyTextId) -> Result<Option<StudyText>, AppError>;
    /// All texts owned by a user, oldest first.
    fn find_study_texts_by_user(&self, user_id: &UserId) -> Result<Vec<StudyText>, AppError>;
    /// Returns `true` if a text was removed.
    fn delete_study_text(&self, id: &StudyTextId) -> Result<bool, AppError>;
}

/// Storage for issued refresh tokens.
pub trait RefreshTokenRepository {
    fn save_refresh_token(&self, token: StoredRefreshToken) -> Result<(), AppError>;
    fn find_refresh_token(&self, token: &str) -> Result<Option<StoredRefreshToken>, AppError>;
    /// Returns `true` if the token was known and not already revoked.
    fn revoke_refresh_token(&self, token: &str) -> Result<bool, AppError>;
    /// Returns the number of tokens newly revoked.
    fn revoke_refresh_tokens_for_user(&self, user_id: &UserId) -> Result<usize, AppError>;
}

//! User model: identity, role and login statistics.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::UserId;
use super::stats::{LoginStatistics, StatsError};

const LOGIN_ID_MIN_LEN: usize = 3;
const LOGIN_ID_MAX_LEN: usize = 50;

/// Permission to read study texts and practice on them.
pub const READ_STUDY_TEXT: &str = "READ_STUDY_TEXT";
/// Permission to create and delete study texts.
pub const WRITE_STUDY_TEXT: &str = "WRITE_STUDY_TEXT";

/// Login id validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginIdError {
    #[error("Login id must be at least 3 characters long")]
    TooShort,
    #[error("Login id cannot exceed 50 characters")]
    TooLong,
    #[error("Login id can only contain letters, numbers, underscores, and hyphens")]
    InvalidCharacters,
}

/// User-chosen login name. Trimmed, 3-50 chars of `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LoginId(String);

impl LoginId {
    pub fn parse(value: &str) -> Result<Self, LoginIdError> {
        let trimmed = value.trim();
        let len = trimmed.chars().count();
        if len < LOGIN_ID_MIN_LEN {
            return Err(LoginIdError::TooShort);
        }
        if len > LOGIN_ID_MAX_LEN {
            return Err(LoginIdError::TooLong);
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(LoginIdError::InvalidCharacters);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LoginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Access level of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    User,
    Guest,
}

impl Role {
    pub fn code(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
            Role::Guest => "GUEST",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Role::Admin),
            "USER" => Some(Role::User),
            "GUEST" => Some(Role::Guest),
            _ => None,
        }
    }

    /// Admins may do anything, users anything but `ADMIN_*`, guests only `READ_*`.
    pub fn has_permission(&self, permission: &str) -> bool {
        match self {
            Role::Admin => true,
            Role::User => !permission.starts_with("ADMIN_"),
            Role::Guest => permission.starts_with("READ_"),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Registered user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    login_id: LoginId,
    /// Argon2 PHC string
    password_hash: String,
    role: Role,
    login_statistics: LoginStatistics,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    pub fn create(
        id: UserId,
        login_id: LoginId,
        password_hash: String,
        role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            login_id,
            password_hash,
            role,
            login_statistics: LoginStatistics::initial(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a user from storage.
    pub fn reconstruct(
        id: UserId,
        login_id: LoginId,
        password_hash: String,
        role: Role,
        login_statistics: LoginStatistics,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            login_id,
            password_hash,
            role,
            login_statistics,
            created_at,
            updated_at,
        }
    }

    /// Return a copy of this user with a login on `login_date` applied.
    pub fn record_login(
        &self,
        login_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Self, StatsError> {
        let login_statistics = self.login_statistics.update_for_login(login_date)?;
        Ok(Self {
            login_statistics,
            updated_at: now,
            ..self.clone()
        })
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.role.has_permission(permission)
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn login_id(&self) -> &LoginId {
        &self.login_id
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn login_statistics(&self) -> &LoginStatistics {
        &self.login_statistics
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Refresh token issued to a user, tracked so it can be revoked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRefreshToken {
    pub token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub revoked: bool,
}

impl StoredRefreshToken {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && now < self.expires_at
    }
}

//! Practice text model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ids::{StudyTextId, UserId};

/// A practice text in a user's library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyText {
    pub id: StudyTextId,
    /// Owner
    pub user_id: UserId,
    /// Programming or natural language of the content (e.g. "rust", "english")
    pub language: String,
    /// Text the user types
    pub content: String,
    /// Optional notes shown after the attempt
    pub explanation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudyText {
    pub fn new(
        id: StudyTextId,
        user_id: UserId,
        language: String,
        content: String,
        explanation: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            language,
            content,
            explanation,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the editable fields. Identity, owner and creation time stay.
    pub fn update(
        self,
        language: String,
        content: String,
        explanation: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            language,
            content,
            explanation,
            updated_at: now,
            ..self
        }
    }

    /// Case-insensitive language match.
    pub fn has_language(&self, language: &str) -> bool {
        self.language.to_lowercase() == language.trim().to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_update_keeps_identity() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let text = StudyText::new(
            StudyTextId::generate(),
            UserId::generate(),
            "rust".to_string(),
            "fn main() {}".to_string(),
            Some("entry point".to_string()),
            t0,
        );
        let later = t0 + Duration::hours(1);

        let updated = text
            .clone()
            .update("Go".to_string(), "func main() {}".to_string(), None, later);

        assert_eq!(updated.id, text.id);
        assert_eq!(updated.user_id, text.user_id);
        assert_eq!(updated.created_at, t0);
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.content, "func main() {}");
        assert!(updated.explanation.is_none());
        assert!(updated.has_language("go"));
        assert!(updated.has_language(" GO "));
        assert!(!updated.has_language("rust"));
    }
}

//! User statistics: login streaks and typing performance aggregates.
//!
//! `LoginStatistics` is updated once per login event and stored with the user.
//! `TypingStatistics` is computed on demand from completed sessions.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::TypingSession;

/// Login statistics errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatsError {
    #[error("Login date {login_date} is before last login date {last_login_date}")]
    NonMonotonicLoginDate {
        login_date: NaiveDate,
        last_login_date: NaiveDate,
    },

    #[error("Invalid login statistics: {0}")]
    InvalidStatistics(&'static str),
}

/// Per-user login streak tracking.
///
/// Invariants: `max_consecutive_days >= consecutive_days`, and `total_days`
/// never decreases across updates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LoginStatistics {
    last_login_date: Option<NaiveDate>,
    consecutive_days: u32,
    max_consecutive_days: u32,
    total_days: u32,
}

impl LoginStatistics {
    /// Statistics of a user who never logged in.
    pub fn initial() -> Self {
        Self::default()
    }

    /// Rebuild statistics from storage, checking invariants.
    pub fn reconstruct(
        last_login_date: Option<NaiveDate>,
        consecutive_days: u32,
        max_consecutive_days: u32,
        total_days: u32,
    ) -> Result<Self, StatsError> {
        if max_consecutive_days < consecutive_days {
            return Err(StatsError::InvalidStatistics(
                "max_consecutive_days cannot be less than consecutive_days",
            ));
        }
        let has_counts = consecutive_days > 0 || max_consecutive_days > 0 || total_days > 0;
        if last_login_date.is_none() && has_counts {
            return Err(StatsError::InvalidStatistics(
                "counters must be zero without a last login date",
            ));
        }
        Ok(Self {
            last_login_date,
            consecutive_days,
            max_consecutive_days,
            total_days,
        })
    }

    /// Apply a login on `login_date`.
    ///
    /// Same-day logins are a no-op. Consecutive days extend the streak, any
    /// gap restarts it at one. Dates must be passed in non-decreasing order.
    pub fn update_for_login(&self, login_date: NaiveDate) -> Result<Self, StatsError> {
        let Some(last) = self.last_login_date else {
            return Ok(Self {
                last_login_date: Some(login_date),
                consecutive_days: 1,
                max_consecutive_days: 1,
                total_days: 1,
            });
        };

        if login_date == last {
            return Ok(self.clone());
        }
        if login_date < last {
            return Err(StatsError::NonMonotonicLoginDate {
                login_date,
                last_login_date: last,
            });
        }

        let consecutive_days = if last.succ_opt() == Some(login_date) {
            self.consecutive_days + 1
        } else {
            1
        };

        Ok(Self {
            last_login_date: Some(login_date),
            consecutive_days,
            max_consecutive_days: self.max_consecutive_days.max(consecutive_days),
            total_days: self.total_days + 1,
        })
    }

    pub fn has_logged_in_on(&self, date: NaiveDate) -> bool {
        self.last_login_date == Some(date)
    }

    pub fn last_login_date(&self) -> Option<NaiveDate> {
        self.last_login_date
    }

    pub fn consecutive_days(&self) -> u32 {
        self.consecutive_days
    }

    pub fn max_consecutive_days(&self) -> u32 {
        self.max_consecutive_days
    }

    pub fn total_days(&self) -> u32 {
        self.total_days
    }
}

/// Typing performance over a set of completed sessions.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TypingStatistics {
    pub total_sessions: u32,
    pub average_accuracy: f64,
    pub max_accuracy: f64,
    pub min_accuracy: f64,
    pub total_characters: u64,
    pub total_correct_characters: u64,
}

impl TypingStatistics {
    /// Aggregate completed sessions whose completion time falls in `[from, to]`.
    ///
    /// Active sessions are ignored. Open bounds are unbounded.
    pub fn from_sessions<'a>(
        sessions: impl IntoIterator<Item = &'a TypingSession>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        let mut stats = Self::default();
        let mut accuracy_sum = 0.0;

        for session in sessions {
            let (Some(result), Some(completed_at)) = (session.result(), session.completed_at())
            else {
                continue;
            };
            if from.is_some_and(|f| completed_at < f) || to.is_some_and(|t| completed_at > t) {
                continue;
            }

            let accuracy = result.accuracy_percent();
            if stats.total_sessions == 0 {
                stats.max_accuracy = accuracy;
                stats.min_accuracy = accuracy;
            } else {
                stats.max_accuracy = stats.max_accuracy.max(accuracy);
                stats.min_accuracy = stats.min_accuracy.min(accuracy);
            }
            stats.total_sessions += 1;
            accuracy_sum += accuracy;
            stats.total_characters += u64::from(result.total_chars());
            stats.total_correct_characters += u64::from(result.correct_chars());
        }

        if stats.total_sessions > 0 {
            stats.average_accuracy = accuracy_sum / f64::from(stats.total_sessions);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SessionId, StudyTextId, UserId};
    use chrono::{Duration, TimeZone};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_login() {
        let stats = LoginStatistics::initial()
            .update_for_login(day(2024, 1, 1))
            .unwrap();

        assert_eq!(stats.last_login_date(), Some(day(2024, 1, 1)));
        assert_eq!(stats.consecutive_days(), 1);
        assert_eq!(stats.max_consecutive_days(), 1);
        assert_eq!(stats.total_days(), 1);
    }

    #[test]
    fn test_same_day_login_is_idempotent() {
        let once = LoginStatistics::initial()
            .update_for_login(day(2024, 1, 1))
            .unwrap();
        let twice = once.update_for_login(day(2024, 1, 1)).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_earlier_date_is_rejected() {
        let stats = LoginStatistics::initial()
            .update_for_login(day(2024, 1, 5))
            .unwrap();

        let err = stats.update_for_login(day(2024, 1, 4)).unwrap_err();
        assert_eq!(
            err,
            StatsError::NonMonotonicLoginDate {
                login_date: day(2024, 1, 4),
                last_login_date: day(2024, 1, 5),
            }
        );
    }

    #[test]
    fn test_streak_then_gap() {
        let mut stats = LoginStatistics::initial();
        for d in [1, 2, 3] {
            stats = stats.update_for_login(day(2024, 1, d)).unwrap();
        }
        assert_eq!(stats.consecutive_days(), 3);
        assert_eq!(stats.max_consecutive_days(), 3);
        assert_eq!(stats.total_days(), 3);

        // Skip the 4th
        stats = stats.update_for_login(day(2024, 1, 5)).unwrap();
        assert_eq!(stats.consecutive_days(), 1);
        assert_eq!(stats.max_consecutive_days(), 3);
        assert_eq!(stats.total_days(), 4);
        assert_eq!(stats.last_login_date(), Some(day(2024, 1, 5)));
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let stats = LoginStatistics::initial()
            .update_for_login(day(2024, 2, 29))
            .and_then(|s| s.update_for_login(day(2024, 3, 1)))
            .unwrap();
        assert_eq!(stats.consecutive_days(), 2);
    }

    #[test]
    fn test_new_streak_can_exceed_old_max() {
        let mut stats = LoginStatistics::initial();
        for d in [1, 2, 5, 6, 7] {
            stats = stats.update_for_login(day(2024, 1, d)).unwrap();
        }
        assert_eq!(stats.consecutive_days(), 3);
        assert_eq!(stats.max_consecutive_days(), 3);
        assert_eq!(stats.total_days(), 5);
    }

    #[test]
    fn test_monotonic_over_sequence() {
        let dates = [1, 1, 2, 4, 4, 5, 6, 10, 11, 20];
        let mut stats = LoginStatistics::initial();
        for d in dates {
            let next = stats.update_for_login(day(2024, 1, d)).unwrap();
            assert!(next.total_days() >= stats.total_days());
            assert!(next.max_consecutive_days() >= stats.max_consecutive_days());
            assert!(next.max_consecutive_days() >= next.consecutive_days());
            stats = next;
        }
        assert_eq!(stats.total_days(), 8);
    }

    #[test]
    fn test_reconstruct_validates_invariants() {
        assert!(LoginStatistics::reconstruct(Some(day(2024, 1, 1)), 3, 2, 5).is_err());
        assert!(LoginStatistics::reconstruct(None, 1, 1, 1).is_err());
        let ok = LoginStatistics::reconstruct(Some(day(2024, 1, 1)), 2, 4, 9).unwrap();
        assert_eq!(ok.total_days(), 9);
        assert!(ok.has_logged_in_on(day(2024, 1, 1)));
    }

    #[test]
    fn test_typing_statistics_aggregates_completed_sessions() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let user = UserId::generate();
        let text = StudyTextId::generate();

        let mut perfect = TypingSession::start(SessionId::generate(), user, text, t0);
        perfect.complete("abcd", "abcd", t0 + Duration::seconds(10)).unwrap();

        let mut half = TypingSession::start(SessionId::generate(), user, text, t0);
        half.complete("abxx", "abcd", t0 + Duration::seconds(20)).unwrap();

        let active = TypingSession::start(SessionId::generate(), user, text, t0);

        let sessions = vec![perfect, half, active];
        let stats = TypingStatistics::from_sessions(&sessions, None, None);

        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.average_accuracy, 75.0);
        assert_eq!(stats.max_accuracy, 100.0);
        assert_eq!(stats.min_accuracy, 50.0);
        assert_eq!(stats.total_characters, 8);
        assert_eq!(stats.total_correct_characters, 6);
    }

    #[test]
    fn test_typing_statistics_respects_window() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
        let user = UserId::generate();
        let text = StudyTextId::generate();

        let mut early = TypingSession::start(SessionId::generate(), user, text, t0);
        early.complete("a", "a", t0 + Duration::minutes(1)).unwrap();
        let mut late = TypingSession::start(SessionId::generate(), user, text, t0);
        late.complete("b", "a", t0 + Duration::days(2)).unwrap();

        let sessions = vec![early, late];
        let stats =
            TypingStatistics::from_sessions(&sessions, Some(t0 + Duration::days(1)), None);

        assert_eq!(stats.total_sessions, 1);
        assert_eq!(stats.average_accuracy, 0.0);
    }

    #[test]
    fn test_typing_statistics_empty() {
        let stats = TypingStatistics::from_sessions(&[], None, None);
        assert_eq!(stats, TypingStatistics::default());
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typing result scoring.
//!
//! Scoring is positional: the character typed at index `i` is compared with
//! the target character at index `i`. The target text always defines the
//! denominator, so typing too little or too much is still scored against the
//! intended text.

use serde::Serialize;

use super::duration::ElapsedTime;

/// Minimum accuracy (percent) for a result to count as a quality attempt.
const QUALITY_ACCURACY_PERCENT: f64 = 80.0;

/// Errors building a precomputed result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("Correct characters ({correct}) cannot exceed total characters ({total})")]
    InvalidCharacterCounts { total: u32, correct: u32 },
}

/// Scored outcome of one typing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TypingResult {
    total_chars: u32,
    correct_chars: u32,
    accuracy_percent: f64,
    elapsed: ElapsedTime,
}

impl TypingResult {
    /// Build a result from counts computed elsewhere.
    pub fn new(
        total_chars: u32,
        correct_chars: u32,
        elapsed: ElapsedTime,
    ) -> Result<Self, ScoreError> {
        if correct_chars > total_chars {
            return Err(ScoreError::InvalidCharacterCounts {
                total: total_chars,
                correct: correct_chars,
            });
        }
        Ok(Self {
            total_chars,
            correct_chars,
            accuracy_percent: accuracy_percent(total_chars, correct_chars),
            elapsed,
        })
    }

    pub fn total_chars(&self) -> u32 {
        self.total_chars
    }

    pub fn correct_chars(&self) -> u32 {
        self.correct_chars
    }

    pub fn incorrect_chars(&self) -> u32 {
        self.total_chars - self.correct_chars
    }

    pub fn accuracy_percent(&self) -> f64 {
        self.accuracy_percent
    }

    pub fn error_rate(&self) -> f64 {
        100.0 - self.accuracy_percent
    }

    pub fn elapsed(&self) -> ElapsedTime {
        self.elapsed
    }

    pub fn words_per_minute(&self) -> f64 {
        self.elapsed.words_per_minute(self.correct_chars)
    }

    /// At least 80% accurate and finished in a reasonable time.
    pub fn meets_quality_standards(&self) -> bool {
        self.accuracy_percent >= QUALITY_ACCURACY_PERCENT && self.elapsed.is_reasonable()
    }
}

/// Score `typed` against `target`.
pub fn score(typed: &str, target: &str, elapsed: ElapsedTime) -> TypingResult {
    let total = target.chars().count();
    let correct = typed
        .chars()
        .zip(target.chars())
        .filter(|(t, r)| t == r)
        .count();

    let total_chars = u32::try_from(total).unwrap_or(u32::MAX);
    let correct_chars = u32::try_from(correct).unwrap_or(u32::MAX).min(total_chars);

    TypingResult {
        total_chars,
        correct_chars,
        accuracy_percent: accuracy_percent(total_chars, correct_chars),
        elapsed,
    }
}

/// Percentage rounded to two decimals, zero for an empty target.
fn accuracy_percent(total: u32, correct: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = f64::from(correct) / f64::from(total) * 100.0;
    ((raw * 100.0).round() / 100.0).clamp(0.0, 100.0)
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Elapsed time of a typing attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60_000;
/// Sessions shorter than this are too quick to be meaningful.
const REASONABLE_MIN_MILLIS: u64 = MILLIS_PER_SECOND;
/// Sessions longer than this are too slow to be meaningful.
const REASONABLE_MAX_MILLIS: u64 = 60 * MILLIS_PER_MINUTE;

/// Non-negative elapsed time with millisecond resolution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ElapsedTime(u64);

impl ElapsedTime {
    pub const ZERO: ElapsedTime = ElapsedTime(0);

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(MILLIS_PER_SECOND))
    }

    /// Time from `start` to `end`. Saturates at zero if `end` precedes `start`.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let millis = (end - start).num_milliseconds();
        Self(u64::try_from(millis).unwrap_or(0))
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / MILLIS_PER_SECOND as f64
    }

    pub fn as_minutes_f64(&self) -> f64 {
        self.0 as f64 / MILLIS_PER_MINUTE as f64
    }

    /// Between one second and one hour, inclusive.
    pub fn is_reasonable(&self) -> bool {
        (REASONABLE_MIN_MILLIS..=REASONABLE_MAX_MILLIS).contains(&self.0)
    }

    /// Standard words-per-minute: five characters make a word.
    pub fn words_per_minute(&self, chars: u32) -> f64 {
        if self.0 == 0 {
            return 0.0;
        }
        (f64::from(chars) / 5.0) / self.as_minutes_f64()
    }
}

impl From<std::time::Duration> for ElapsedTime {
    fn from(d: std::time::Duration) -> Self {
        Self(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}s", self.as_secs_f64())
    }
}

//! Streak State Machine
//!
//! A streak is a per-conversation daily-interaction counter that decays on
//! inactivity. The display state is a pure function of the conversation's
//! last-interaction timestamp and the current time, recomputed on every
//! render or poll rather than driven by events.
//!
//! Time windows, measured from the last interaction:
//!
//! - up to 18h: active
//! - over 18h and under 24h: active, in danger of expiring
//! - 24h to 72h: expired but recoverable; the count at expiry is kept for display
//! - 72h and beyond: fully lapsed, the counter restarts on the next interaction
//!
//! Recovery is server-authoritative: a `recover_streak` API call returns the
//! refreshed conversation, which replaces local state. Nothing here mutates
//! the counter locally.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Hours of inactivity after which the streak expires
const EXPIRY_HOURS: i64 = 24;

/// Hours of inactivity after which an active streak is flagged as in danger
const RISK_AFTER_HOURS: i64 = 18;

/// Hours of inactivity after which an expired streak can no longer be recovered
const RECOVERY_UNTIL_HOURS: i64 = 72;

/// Streak counter state as served by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StreakData {
    /// Consecutive-day counter
    #[serde(default)]
    pub current_count: u32,
    /// Counter value at the time of the last expiry
    #[serde(default)]
    pub last_streak_count: u32,
    /// Timestamp of the last qualifying interaction
    pub last_interaction_at: DateTime<Utc>,
}

/// Derived streak display state; never persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakState {
    pub current_count: u32,
    pub last_streak_count: u32,
    pub is_active: bool,
    pub is_danger: bool,
    pub can_recover: bool,
}

/// The phase a streak is in, by elapsed time since the last interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakPhase {
    Active,
    AtRisk,
    Recoverable,
    Lapsed,
}

impl StreakState {
    /// The phase this state belongs to
    pub fn phase(&self) -> StreakPhase {
        match (self.is_active, self.is_danger, self.can_recover) {
            (true, false, _) => StreakPhase::Active,
            (true, true, _) => StreakPhase::AtRisk,
            (false, _, true) => StreakPhase::Recoverable,
            (false, _, false) => StreakPhase::Lapsed,
        }
    }
}

/// Derive the display state for a streak at a given instant.
///
/// A future `last_interaction_at` (clock skew between client and server) is
/// treated as "just now".
pub fn derive_streak(streak: &StreakData, now: DateTime<Utc>) -> StreakState {
    let elapsed = (now - streak.last_interaction_at).max(Duration::zero());
    // The count at expiry may still live in either server field depending on
    // whether the backend has rolled it over yet.
    let count_at_expiry = streak.current_count.max(streak.last_streak_count);

    if elapsed < Duration::hours(EXPIRY_HOURS) {
        StreakState {
            current_count: streak.current_count,
            last_streak_count: streak.last_streak_count,
            is_active: true,
            is_danger: elapsed > Duration::hours(RISK_AFTER_HOURS),
            can_recover: false,
        }
    } else if elapsed < Duration::hours(RECOVERY_UNTIL_HOURS) {
        StreakState {
            current_count: 0,
            last_streak_count: count_at_expiry,
            is_active: false,
            is_danger: false,
            can_recover: true,
        }
    } else {
        StreakState {
            current_count: 0,
            last_streak_count: count_at_expiry,
            is_active: false,
            is_danger: false,
            can_recover: false,
        }
    }
}

/// Memoizes [`derive_streak`] on the `(last_interaction_at, minute of now)`
/// pair, so per-frame recomputation at high render frequency is a cache hit.
/// Minute granularity is coarse enough to absorb render churn and fine
/// enough that window edges surface within a minute of crossing.
#[derive(Debug, Default)]
pub struct StreakCache {
    key: Option<(DateTime<Utc>, i64)>,
    state: Option<StreakState>,
}

impl StreakCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive or reuse the streak state for the given instant
    pub fn get(&mut self, streak: &StreakData, now: DateTime<Utc>) -> StreakState {
        let bucket = now.timestamp().div_euclid(60);
        let key = (streak.last_interaction_at, bucket);
        if self.key == Some(key) {
            if let Some(state) = self.state {
                return state;
            }
        }
        let state = derive_streak(streak, now);
        self.key = Some(key);
        self.state = Some(state);
        state
    }
}

//! Reconnection backoff policy
//!
//! Bounded exponential backoff: the delay before reconnect attempt `n`
//! (1-based) is `min(1s * 2^n, 30s)`, and after [`MAX_ATTEMPTS`] failed
//! attempts reconnection stops until an explicit `connect()`. Unbounded
//! retry without backoff risks a thundering-herd against the server after
//! an outage.

use std::time::Duration;

/// Base delay unit for the exponential schedule
pub const BASE_DELAY_MS: u64 = 1_000;

/// Ceiling on any single delay
pub const MAX_DELAY_MS: u64 = 30_000;

/// Reconnect attempts before giving up
pub const MAX_ATTEMPTS: u32 = 5;

/// Delay before reconnect attempt `attempt` (1-based).
///
/// Returns `None` once the attempt ceiling is exceeded; the caller must
/// stop retrying and wait for an explicit reconnect request.
pub fn reconnect_delay(attempt: u32) -> Option<Duration> {
    if attempt == 0 || attempt > MAX_ATTEMPTS {
        return None;
    }
    let ms = BASE_DELAY_MS
        .saturating_mul(2u64.saturating_pow(attempt))
        .min(MAX_DELAY_MS);
    Some(Duration::from_millis(ms))
}

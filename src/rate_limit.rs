//! Fixed-window rate limiting per caller identity.
//!
//! [`FixedWindowRateLimiter`] keeps one counter per key in a [`DashMap`], so
//! concurrent callers only contend on their own key. [`RequestAdmission`]
//! pairs a per-minute and a per-day limiter; the minute window is checked
//! first.

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::config::RateLimitConfig;
use crate::error::{GatewayError, Result};

const MINUTE_MS: i64 = 60_000;
const DAY_MS: i64 = 24 * 60 * MINUTE_MS;

/// Outcome of one [`FixedWindowRateLimiter::consume_at`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Epoch milliseconds at which the current window ends.
    pub reset_at_ms: i64,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at_ms: i64,
}

/// Counts events per key in non-sliding windows.
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    windows: DashMap<String, Window>,
    max_tracked: usize,
}

impl FixedWindowRateLimiter {
    pub fn new(max_tracked: usize) -> Self {
        Self {
            windows: DashMap::new(),
            max_tracked: max_tracked.max(1),
        }
    }

    /// Record one event for `key` at `now_ms`.
    ///
    /// The first event of a window, or any event at or after the stored
    /// reset instant, starts a new window with a count of 1.
    pub fn consume_at(
        &self,
        key: &str,
        limit: u32,
        window_ms: i64,
        now_ms: i64,
    ) -> RateLimitDecision {
        if !self.windows.contains_key(key) && self.windows.len() >= self.max_tracked {
            self.make_room(now_ms);
        }

        let mut entry = self.windows.entry(key.to_owned()).or_insert(Window {
            count: 0,
            reset_at_ms: now_ms,
        });
        let window = entry.value_mut();
        if window.reset_at_ms <= now_ms {
            window.count = 1;
            window.reset_at_ms = now_ms + window_ms;
        } else {
            window.count = window.count.saturating_add(1);
        }

        RateLimitDecision {
            allowed: window.count <= limit,
            remaining: limit.saturating_sub(window.count),
            reset_at_ms: window.reset_at_ms,
        }
    }

    /// Number of keys currently tracked, expired or not.
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.windows.len()
    }

    /// Drop expired windows; if none expired, drop the one closest to reset.
    fn make_room(&self, now_ms: i64) {
        self.windows.retain(|_, w| w.reset_at_ms > now_ms);
        if self.windows.len() < self.max_tracked {
            return;
        }
        let oldest = self
            .windows
            .iter()
            .min_by_key(|e| e.value().reset_at_ms)
            .map(|e| e.key().clone());
        if let Some(key) = oldest {
            self.windows.remove(&key);
        }
    }
}

/// Per-minute then per-day admission for caller identities.
#[derive(Debug)]
pub struct RequestAdmission {
    per_minute: FixedWindowRateLimiter,
    per_day: FixedWindowRateLimiter,
    minute_limit: u32,
    day_limit: u32,
}

impl RequestAdmission {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            per_minute: FixedWindowRateLimiter::new(config.max_tracked_identities),
            per_day: FixedWindowRateLimiter::new(config.max_tracked_identities),
            minute_limit: config.per_minute,
            day_limit: config.per_day,
        }
    }

    /// Admit one request from `identity` now.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RateLimited`] when either window is exhausted.
    pub fn admit(&self, identity: &str) -> Result<()> {
        self.admit_at(identity, chrono::Utc::now().timestamp_millis())
    }

    /// Admit one request from `identity` at `now_ms`.
    ///
    /// A request rejected by the minute window is not counted against the
    /// day window.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::RateLimited`] when either window is exhausted.
    pub fn admit_at(&self, identity: &str, now_ms: i64) -> Result<()> {
        let minute = self.per_minute.consume_at(
            &format!("m:{identity}"),
            self.minute_limit,
            MINUTE_MS,
            now_ms,
        );
        if !minute.allowed {
            return Err(rejected(identity, "minute", minute.reset_at_ms));
        }

        let day = self
            .per_day
            .consume_at(&format!("d:{identity}"), self.day_limit, DAY_MS, now_ms);
        if !day.allowed {
            return Err(rejected(identity, "day", day.reset_at_ms));
        }
        Ok(())
    }
}

fn rejected(identity: &str, scope: &'static str, reset_at_ms: i64) -> GatewayError {
    info!(
        identity = %identity_tag(identity),
        scope,
        reset_at_ms,
        "request rate limited"
    );
    GatewayError::RateLimited { scope, reset_at_ms }
}

/// Short stable digest of an identity, safe to log.
pub fn identity_tag(identity: &str) -> String {
    let digest = Sha256::digest(identity.as_bytes());
    let hex = format!("{digest:x}");
    hex[..12].to_owned()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let limiter = FixedWindowRateLimiter::new(100);
        for n in 1..=3u32 {
            let d = limiter.consume_at("k", 3, 1_000, 10);
            assert!(d.allowed, "call {n} should pass");
            assert_eq!(d.remaining, 3 - n);
            assert_eq!(d.reset_at_ms, 1_010);
        }
        let d = limiter.consume_at("k", 3, 1_000, 20);
        assert!(!d.allowed);
        assert_eq!(d.remaining, 0);
    }

    #[test]
    fn window_resets_after_reset_instant() {
        let limiter = FixedWindowRateLimiter::new(100);
        limiter.consume_at("k", 1, 1_000, 0);
        assert!(!limiter.consume_at("k", 1, 1_000, 999).allowed);

        let d = limiter.consume_at("k", 1, 1_000, 1_000);
        assert!(d.allowed);
        assert_eq!(d.remaining, 0);
        assert_eq!(d.reset_at_ms, 2_000);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = FixedWindowRateLimiter::new(100);
        assert!(limiter.consume_at("a", 1, 1_000, 0).allowed);
        assert!(!limiter.consume_at("a", 1, 1_000, 1).allowed);
        assert!(limiter.consume_at("b", 1, 1_000, 1).allowed);
    }

    #[test]
    fn tracked_keys_are_bounded() {
        let limiter = FixedWindowRateLimiter::new(3);
        for i in 0..3 {
            limiter.consume_at(&format!("k{i}"), 10, 1_000, i);
        }
        // All live: the window closest to reset goes.
        limiter.consume_at("k3", 10, 1_000, 5);
        assert_eq!(limiter.tracked(), 3);

        // All expired: pruned wholesale.
        limiter.consume_at("k4", 10, 1_000, 10_000);
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn admission_checks_minute_before_day() {
        let admission = RequestAdmission::new(&RateLimitConfig {
            per_minute: 2,
            per_day: 3,
            max_tracked_identities: 100,
        });

        admission.admit_at("alice", 0).expect("1");
        admission.admit_at("alice", 1).expect("2");
        match admission.admit_at("alice", 2) {
            Err(GatewayError::RateLimited { scope, reset_at_ms }) => {
                assert_eq!(scope, "minute");
                assert_eq!(reset_at_ms, MINUTE_MS);
            }
            other => unreachable!("expected minute limit, got {other:?}"),
        }

        // Next minute: the rejected call above never reached the day window.
        admission.admit_at("alice", MINUTE_MS).expect("3");
        match admission.admit_at("alice", MINUTE_MS + 1) {
            Err(GatewayError::RateLimited { scope, reset_at_ms }) => {
                assert_eq!(scope, "day");
                assert_eq!(reset_at_ms, DAY_MS);
            }
            other => unreachable!("expected day limit, got {other:?}"),
        }

        admission.admit_at("bob", MINUTE_MS + 1).expect("other identity");
    }

    #[test]
    fn identity_tag_is_short_and_stable() {
        assert_eq!(identity_tag("token-123"), identity_tag("token-123"));
        assert_ne!(identity_tag("token-123"), identity_tag("token-124"));
        assert_eq!(identity_tag("x").len(), 12);
    }
}

//! Fixed-window request counter for a single (endpoint, caller) pair.

use super::quota::RateLimitConfig;

/// Requests observed for one (endpoint, caller) pair in the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    /// Requests admitted in the current window
    pub count: u32,
    /// When the current window began, in ms since the epoch
    pub window_start: u64,
}

impl RateLimitRecord {
    /// Start an empty window at `now`.
    pub fn new(now: u64) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    /// Whether the window has run past `quota.window_ms` as of `now`.
    ///
    /// A window that has lasted exactly `window_ms` is still open. A clock
    /// that moved backwards counts as no time elapsed.
    pub fn is_expired(&self, quota: &RateLimitConfig, now: u64) -> bool {
        now.saturating_sub(self.window_start) > quota.window_ms
    }

    /// Start a fresh window at `now` if the current one has expired.
    ///
    /// Returns `true` if the window was reset.
    pub fn roll_window(&mut self, quota: &RateLimitConfig, now: u64) -> bool {
        if self.is_expired(quota, now) {
            self.count = 0;
            self.window_start = now;
            true
        } else {
            false
        }
    }

    /// Whether the window has no room for another request.
    pub fn is_exhausted(&self, quota: &RateLimitConfig) -> bool {
        self.count >= quota.limit
    }

    /// Requests still allowed in this window.
    pub fn remaining(&self, quota: &RateLimitConfig) -> u32 {
        quota.limit.saturating_sub(self.count)
    }

    /// End of the current window in ms since the epoch.
    pub fn window_end_millis(&self, quota: &RateLimitConfig) -> u64 {
        self.window_start.saturating_add(quota.window_ms)
    }

    /// End of the current window in whole Unix seconds, rounded down.
    pub fn reset_at_secs(&self, quota: &RateLimitConfig) -> u64 {
        self.window_end_millis(quota) / 1000
    }

    /// Seconds until the window ends, rounded up.
    pub fn seconds_to_reset(&self, quota: &RateLimitConfig, now: u64) -> u64 {
        self.window_end_millis(quota)
            .saturating_sub(now)
            .div_ceil(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUOTA: RateLimitConfig = RateLimitConfig::new(3, 60_000);

    #[test]
    fn test_new_record_is_empty() {
        let record = RateLimitRecord::new(5_000);
        assert_eq!(record.count, 0);
        assert_eq!(record.window_start, 5_000);
        assert_eq!(record.remaining(&QUOTA), 3);
        assert!(!record.is_exhausted(&QUOTA));
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let mut record = RateLimitRecord::new(0);
        record.count = 2;

        // Exactly window_ms elapsed: still the same window
        assert!(!record.roll_window(&QUOTA, 60_000));
        assert_eq!(record.count, 2);

        // One millisecond past: reset
        assert!(record.roll_window(&QUOTA, 60_001));
        assert_eq!(record.count, 0);
        assert_eq!(record.window_start, 60_001);
    }

    #[test]
    fn test_backwards_clock_does_not_reset() {
        let mut record = RateLimitRecord::new(10_000);
        record.count = 1;

        assert!(!record.roll_window(&QUOTA, 0));
        assert_eq!(record.count, 1);
    }

    #[test]
    fn test_reset_times() {
        let record = RateLimitRecord::new(1_700_000_000_500);

        assert_eq!(record.window_end_millis(&QUOTA), 1_700_000_060_500);
        assert_eq!(record.reset_at_secs(&QUOTA), 1_700_000_060);
        assert_eq!(record.seconds_to_reset(&QUOTA, 1_700_000_000_500), 60);
        assert_eq!(record.seconds_to_reset(&QUOTA, 1_700_000_059_600), 1);
        assert_eq!(record.seconds_to_reset(&QUOTA, 1_700_000_060_500), 0);
    }

    #[test]
    fn test_exhaustion() {
        let mut record = RateLimitRecord::new(0);
        record.count = 3;

        assert!(record.is_exhausted(&QUOTA));
        assert_eq!(record.remaining(&QUOTA), 0);
    }
}

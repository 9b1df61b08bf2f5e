//! Core rate limiter implementation.

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, trace};

use super::clock::{Clock, SystemClock};
use super::decision::{QuotaSnapshot, RateLimitDecision};
use super::key::{RecordKey, ANONYMOUS_CALLER};
use super::quota::{QuotaTable, RateLimitConfig};
use super::record::RateLimitRecord;

/// Whether the limiter enforces quotas at all.
///
/// `Disabled` is meant for local development: every check succeeds and no
/// state is touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enforcement {
    #[default]
    Enabled,
    Disabled,
}

/// Fixed-window rate limiter keyed by endpoint and caller.
///
/// This struct is thread-safe and can be shared across multiple tasks. The
/// check-and-increment for a key runs under that key's map entry lock, so
/// concurrent checks on one key never admit more than the quota.
pub struct RateLimiter {
    /// Records indexed by (endpoint, caller)
    records: DashMap<RecordKey, RateLimitRecord>,
    /// Quotas by endpoint
    quotas: RwLock<QuotaTable>,
    enforcement: Enforcement,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a rate limiter driven by the system clock.
    pub fn new(quotas: QuotaTable, enforcement: Enforcement) -> Self {
        Self::with_clock(quotas, enforcement, Arc::new(SystemClock))
    }

    /// Create a rate limiter driven by `clock`.
    pub fn with_clock(quotas: QuotaTable, enforcement: Enforcement, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            quotas: RwLock::new(quotas),
            enforcement,
            clock,
        }
    }

    pub fn enforcement(&self) -> Enforcement {
        self.enforcement
    }

    /// Check the shared anonymous bucket for `endpoint`.
    pub fn check_anonymous(&self, endpoint: &str) -> RateLimitDecision {
        self.check_rate_limit(endpoint, ANONYMOUS_CALLER)
    }

    /// Decide whether `caller_id` may make one more request to `endpoint`.
    ///
    /// An allowed decision consumes one unit of quota, so call this exactly
    /// once per attempted request.
    pub fn check_rate_limit(&self, endpoint: &str, caller_id: &str) -> RateLimitDecision {
        if self.enforcement == Enforcement::Disabled {
            trace!(endpoint, caller_id, "Rate limiting disabled, allowing request");
            return RateLimitDecision::bypassed();
        }

        let quota = self.quota_for(endpoint);
        let now = self.clock.now_millis();

        trace!(
            endpoint,
            caller_id,
            limit = quota.limit,
            window_ms = quota.window_ms,
            "Checking rate limit"
        );

        let mut record = self
            .records
            .entry(RecordKey::new(endpoint, caller_id))
            .or_insert_with(|| {
                debug!(endpoint, caller_id, "Creating new rate limit record");
                RateLimitRecord::new(now)
            });

        if record.roll_window(&quota, now) {
            trace!(endpoint, caller_id, "Rate limit window reset");
        }

        let reset = record.reset_at_secs(&quota);

        if record.is_exhausted(&quota) {
            let seconds_to_reset = record.seconds_to_reset(&quota, now);
            drop(record);

            debug!(
                endpoint,
                caller_id,
                limit = quota.limit,
                seconds_to_reset,
                "Rate limit exceeded"
            );

            return RateLimitDecision::denied(
                QuotaSnapshot {
                    limit: quota.limit,
                    remaining: 0,
                    reset,
                },
                seconds_to_reset,
            );
        }

        record.count += 1;

        RateLimitDecision::allowed(QuotaSnapshot {
            limit: quota.limit,
            remaining: record.remaining(&quota),
            reset,
        })
    }

    /// The quota currently applied to `endpoint`.
    pub fn quota_for(&self, endpoint: &str) -> RateLimitConfig {
        self.quotas.read().get(endpoint)
    }

    /// A copy of the current quota table.
    pub fn quotas(&self) -> QuotaTable {
        self.quotas.read().clone()
    }

    /// Replace the quota table.
    ///
    /// Existing records keep their counts and are judged against the new
    /// quotas from the next check on.
    pub fn set_quotas(&self, quotas: QuotaTable) {
        *self.quotas.write() = quotas;
        info!("Rate limit quotas updated");
    }

    /// Remove every record whose window has expired.
    ///
    /// An expired record would be reset by its next check anyway, so removing
    /// it never changes a decision. Returns the number of records removed.
    pub fn sweep_expired(&self) -> usize {
        let quotas = self.quotas();
        let now = self.clock.now_millis();
        let mut removed = 0;

        self.records.retain(|key, record| {
            let expired = record.is_expired(&quotas.get(&key.endpoint), now);
            if expired {
                removed += 1;
            }
            !expired
        });

        removed
    }

    /// A snapshot of the record for (endpoint, caller), without touching it.
    pub fn record(&self, endpoint: &str, caller_id: &str) -> Option<RateLimitRecord> {
        self.records
            .get(&RecordKey::new(endpoint, caller_id))
            .map(|record| *record)
    }

    /// Get the number of live records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Clear all records.
    pub fn clear(&self) {
        self.records.clear();
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(QuotaTable::default(), Enforcement::Enabled)
    }
}

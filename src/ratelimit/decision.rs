//! The value returned by a rate limit check.

use serde::{Deserialize, Serialize};

/// Quota state reported alongside a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    /// Requests allowed per window
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// Unix seconds at which the current window ends
    pub reset: u64,
}

/// Outcome of a rate limit check.
///
/// A denial is an ordinary outcome, not an error: `success` is `false` and
/// `error` carries a message with the number of seconds to wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<QuotaSnapshot>,
}

impl RateLimitDecision {
    /// The request may proceed.
    pub fn allowed(snapshot: QuotaSnapshot) -> Self {
        Self {
            success: true,
            error: None,
            rate_limit: Some(snapshot),
        }
    }

    /// The request may proceed and no quota was consulted.
    pub fn bypassed() -> Self {
        Self {
            success: true,
            error: None,
            rate_limit: None,
        }
    }

    /// The request must not proceed for another `seconds_to_reset` seconds.
    pub fn denied(snapshot: QuotaSnapshot, seconds_to_reset: u64) -> Self {
        Self {
            success: false,
            error: Some(format!(
                "Rate limit exceeded. Please try again in {} seconds.",
                seconds_to_reset
            )),
            rate_limit: Some(snapshot),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: QuotaSnapshot = QuotaSnapshot {
        limit: 10,
        remaining: 0,
        reset: 1_700_000_060,
    };

    #[test]
    fn test_denied_message_includes_seconds() {
        let decision = RateLimitDecision::denied(SNAPSHOT, 42);
        assert!(!decision.is_allowed());
        assert_eq!(
            decision.error.as_deref(),
            Some("Rate limit exceeded. Please try again in 42 seconds.")
        );
    }

    #[test]
    fn test_serialized_shape() {
        let denied = serde_json::to_value(RateLimitDecision::denied(SNAPSHOT, 42)).unwrap();
        assert_eq!(
            denied,
            serde_json::json!({
                "success": false,
                "error": "Rate limit exceeded. Please try again in 42 seconds.",
                "rateLimit": { "limit": 10, "remaining": 0, "reset": 1_700_000_060u64 }
            })
        );

        let bypassed = serde_json::to_value(RateLimitDecision::bypassed()).unwrap();
        assert_eq!(bypassed, serde_json::json!({ "success": true }));
    }
}

//! Per-endpoint quota configuration and lookup.
//!
//! Every endpoint has a [`RateLimitConfig`]. Endpoints without an explicit
//! entry fall back to the table's default, which is a deliberate permissive
//! choice rather than a validation failure.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, TextgateError};

/// Endpoint name for text summarization.
pub const SUMMARIZE: &str = "summarize";
/// Endpoint name for text rewriting.
pub const REWRITE: &str = "rewrite";
/// Endpoint name for language detection.
pub const LANGUAGE_DETECT: &str = "language-detect";

/// One minute, the window every built-in quota uses.
const DEFAULT_WINDOW_MS: u64 = 60 * 1000;
/// Limit applied to endpoints with no entry in the table.
const DEFAULT_LIMIT: u32 = 100;

/// Quota for a single endpoint: at most `limit` requests per `window_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum permitted requests per window
    pub limit: u32,
    /// Window duration in milliseconds
    pub window_ms: u64,
}

impl RateLimitConfig {
    pub const fn new(limit: u32, window_ms: u64) -> Self {
        Self { limit, window_ms }
    }

    /// Reject quotas that could never admit a request or never expire.
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.limit == 0 {
            return Err(TextgateError::Config(format!(
                "quota for '{}' must have a positive limit",
                name
            )));
        }
        if self.window_ms == 0 {
            return Err(TextgateError::Config(format!(
                "quota for '{}' must have a positive window_ms",
                name
            )));
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, DEFAULT_WINDOW_MS)
    }
}

/// Lookup table from endpoint name to quota, with a default for the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaTable {
    endpoints: HashMap<String, RateLimitConfig>,
    default: RateLimitConfig,
}

impl QuotaTable {
    /// An empty table where every endpoint gets `default`.
    pub fn with_default(default: RateLimitConfig) -> Self {
        Self {
            endpoints: HashMap::new(),
            default,
        }
    }

    /// Merge configured quotas over the built-in table.
    ///
    /// `default` replaces the fallback quota when present. Fails on the first
    /// entry with a zero limit or window.
    pub fn with_overrides(
        default: Option<RateLimitConfig>,
        overrides: &HashMap<String, RateLimitConfig>,
    ) -> Result<Self> {
        let mut table = Self::default();

        if let Some(default) = default {
            default.validate("default")?;
            table.default = default;
        }

        for (endpoint, quota) in overrides {
            quota.validate(endpoint)?;
            table.insert(endpoint.clone(), *quota);
        }

        Ok(table)
    }

    /// Add or replace the quota for an endpoint.
    pub fn insert(&mut self, endpoint: impl Into<String>, quota: RateLimitConfig) {
        self.endpoints.insert(endpoint.into(), quota);
    }

    /// The quota that applies to `endpoint`.
    pub fn get(&self, endpoint: &str) -> RateLimitConfig {
        self.endpoints
            .get(endpoint)
            .copied()
            .unwrap_or(self.default)
    }

    /// The quota for endpoints without an entry.
    pub fn default_quota(&self) -> RateLimitConfig {
        self.default
    }

    /// Explicit entries in name order.
    pub fn entries(&self) -> BTreeMap<&str, RateLimitConfig> {
        self.endpoints
            .iter()
            .map(|(name, quota)| (name.as_str(), *quota))
            .collect()
    }
}

impl Default for QuotaTable {
    /// The built-in table: summarize 10/min, rewrite 20/min,
    /// language-detect 30/min, everything else 100/min.
    fn default() -> Self {
        let mut table = Self::with_default(RateLimitConfig::default());
        table.insert(SUMMARIZE, RateLimitConfig::new(10, DEFAULT_WINDOW_MS));
        table.insert(REWRITE, RateLimitConfig::new(20, DEFAULT_WINDOW_MS));
        table.insert(LANGUAGE_DETECT, RateLimitConfig::new(30, DEFAULT_WINDOW_MS));
        table
    }
}

//! Store keys for rate limit records.

/// Caller identity used when none is supplied.
pub const ANONYMOUS_CALLER: &str = "anonymous";

/// Identifies one record in the store: an endpoint and a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    /// The endpoint whose quota applies
    pub endpoint: String,
    /// The caller being counted
    pub caller_id: String,
}

impl RecordKey {
    pub fn new(endpoint: &str, caller_id: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            caller_id: caller_id.to_string(),
        }
    }

    /// Key for the shared anonymous bucket of `endpoint`.
    pub fn anonymous(endpoint: &str) -> Self {
        Self::new(endpoint, ANONYMOUS_CALLER)
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.endpoint, self.caller_id)
    }
}

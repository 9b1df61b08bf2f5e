//! Rate limit service implementation.

use std::sync::Arc;
use tonic::metadata::MetadataValue;
use tonic::{Request, Response, Status};
use tracing::{debug, instrument};

use super::proto::textgate::ratelimit::v1::{
    rate_limit_service_server::RateLimitService, CheckRateLimitRequest, CheckRateLimitResponse,
    Quota,
};

use crate::ratelimit::{QuotaSnapshot, RateLimitDecision, RateLimiter, ANONYMOUS_CALLER};

/// Response metadata carrying the quota snapshot, named after the upstream
/// API's rate limit headers.
pub const LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Implementation of the RateLimitService gRPC interface.
pub struct RateLimitServiceImpl {
    /// The rate limiter instance
    rate_limiter: Arc<RateLimiter>,
}

impl RateLimitServiceImpl {
    pub fn new(rate_limiter: Arc<RateLimiter>) -> Self {
        Self { rate_limiter }
    }
}

impl From<QuotaSnapshot> for Quota {
    fn from(snapshot: QuotaSnapshot) -> Self {
        Quota {
            limit: snapshot.limit,
            remaining: snapshot.remaining,
            reset: snapshot.reset,
        }
    }
}

impl From<RateLimitDecision> for CheckRateLimitResponse {
    fn from(decision: RateLimitDecision) -> Self {
        CheckRateLimitResponse {
            success: decision.success,
            error: decision.error,
            rate_limit: decision.rate_limit.map(Quota::from),
        }
    }
}

#[tonic::async_trait]
impl RateLimitService for RateLimitServiceImpl {
    /// Decide whether the caller may issue one more upstream request.
    ///
    /// A denial is a successful RPC with `success == false`.
    #[instrument(
        skip(self, request),
        fields(
            endpoint = %request.get_ref().endpoint,
            caller_id = %request.get_ref().caller_id
        )
    )]
    async fn check_rate_limit(
        &self,
        request: Request<CheckRateLimitRequest>,
    ) -> Result<Response<CheckRateLimitResponse>, Status> {
        let req = request.into_inner();

        let caller_id = if req.caller_id.is_empty() {
            ANONYMOUS_CALLER
        } else {
            req.caller_id.as_str()
        };

        let decision = self.rate_limiter.check_rate_limit(&req.endpoint, caller_id);

        debug!(
            endpoint = %req.endpoint,
            caller_id,
            success = decision.success,
            "Rate limit decision made"
        );

        let snapshot = decision.rate_limit;
        let mut response = Response::new(CheckRateLimitResponse::from(decision));

        if let Some(quota) = snapshot {
            let metadata = response.metadata_mut();
            metadata.insert(LIMIT_HEADER, MetadataValue::from(quota.limit));
            metadata.insert(REMAINING_HEADER, MetadataValue::from(quota.remaining));
            metadata.insert(RESET_HEADER, MetadataValue::from(quota.reset));
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::quota::SUMMARIZE;
    use crate::ratelimit::{Enforcement, QuotaTable};

    fn request(endpoint: &str, caller_id: &str) -> Request<CheckRateLimitRequest> {
        Request::new(CheckRateLimitRequest {
            endpoint: endpoint.to_string(),
            caller_id: caller_id.to_string(),
        })
    }

    fn header(response: &Response<CheckRateLimitResponse>, name: &str) -> String {
        response
            .metadata()
            .get(name)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_allowed_request() {
        let rate_limiter = Arc::new(RateLimiter::default());
        let service = RateLimitServiceImpl::new(rate_limiter);

        let response = service
            .check_rate_limit(request(SUMMARIZE, "u1"))
            .await
            .unwrap();

        assert_eq!(header(&response, LIMIT_HEADER), "10");
        assert_eq!(header(&response, REMAINING_HEADER), "9");

        let body = response.into_inner();
        assert!(body.success);
        assert!(body.error.is_none());
        let quota = body.rate_limit.unwrap();
        assert_eq!(quota.limit, 10);
        assert_eq!(quota.remaining, 9);
    }

    #[tokio::test]
    async fn test_denied_request_is_not_a_status_error() {
        let rate_limiter = Arc::new(RateLimiter::default());
        let service = RateLimitServiceImpl::new(rate_limiter);

        for _ in 0..10 {
            service.check_rate_limit(request(SUMMARIZE, "u1")).await.unwrap();
        }

        let response = service
            .check_rate_limit(request(SUMMARIZE, "u1"))
            .await
            .unwrap();

        assert_eq!(header(&response, REMAINING_HEADER), "0");
        let reset = header(&response, RESET_HEADER);

        let body = response.into_inner();
        assert!(!body.success);
        assert!(body.error.unwrap().starts_with("Rate limit exceeded."));
        assert_eq!(body.rate_limit.unwrap().reset.to_string(), reset);
    }

    #[tokio::test]
    async fn test_empty_caller_is_anonymous() {
        let rate_limiter = Arc::new(RateLimiter::default());
        let service = RateLimitServiceImpl::new(rate_limiter.clone());

        service.check_rate_limit(request(SUMMARIZE, "")).await.unwrap();

        assert_eq!(
            rate_limiter.record(SUMMARIZE, ANONYMOUS_CALLER).unwrap().count,
            1
        );
    }

    #[tokio::test]
    async fn test_bypass_has_no_quota_metadata() {
        let rate_limiter = Arc::new(RateLimiter::new(
            QuotaTable::default(),
            Enforcement::Disabled,
        ));
        let service = RateLimitServiceImpl::new(rate_limiter);

        let response = service
            .check_rate_limit(request(SUMMARIZE, "u1"))
            .await
            .unwrap();

        assert!(response.metadata().get(LIMIT_HEADER).is_none());
        let body = response.into_inner();
        assert!(body.success);
        assert!(body.rate_limit.is_none());
    }
}

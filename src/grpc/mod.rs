//! gRPC server module for the rate limit check service.

mod server;
mod service;

pub use server::GrpcServer;
pub use service::RateLimitServiceImpl;

// Include the generated protobuf code
pub mod proto {
    pub mod textgate {
        pub mod ratelimit {
            pub mod v1 {
                tonic::include_proto!("textgate.ratelimit.v1");
            }
        }
    }
}

// Re-export commonly used types
pub use proto::textgate::ratelimit::v1::{
    rate_limit_service_server::RateLimitServiceServer, CheckRateLimitRequest,
    CheckRateLimitResponse, Quota,
};

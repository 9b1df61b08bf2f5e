//! Textgate - per-endpoint rate limiting for text-processing API callers
//!
//! This crate implements a fixed-window rate limiter keyed by endpoint and
//! caller. Callers ask it once per attempted upstream request (summarize,
//! rewrite, language-detect) and abort with the returned message when the
//! quota is used up. The limiter is usable in-process or over gRPC.

pub mod config;
pub mod error;
pub mod grpc;
pub mod ratelimit;

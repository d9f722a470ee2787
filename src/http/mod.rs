//! HTTP transport module
//!
//! One authenticated request per call, JSON in and JSON out.
//!
//! # Features
//!
//! - **Connection contexts**: reusable connection pools that can be shared
//!   across many sequential fetches and are released when dropped
//! - **Rate Limiting**: optional token bucket rate limiter using governor
//! - **Authentication**: `Authorization` header applied from the auth module
//!
//! Requests are never retried. A body that is not JSON is a decode error;
//! a JSON body is returned as-is whatever the status code.

mod client;
mod rate_limit;

pub use client::{ConnectionContext, ContextScope, HttpClient, HttpClientConfig, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

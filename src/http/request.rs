//! Request identification.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) on ingress
//! - Propagate the ID to the response headers
//!
//! # Design Decisions
//! - Request ID added as early as possible so every log line about a
//!   transfer can be correlated with the response the client saw

use axum::http::{HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 request ID for every incoming request.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let value = HeaderValue::from_str(&Uuid::new_v4().to_string()).ok()?;
        Some(RequestId::new(value))
    }
}

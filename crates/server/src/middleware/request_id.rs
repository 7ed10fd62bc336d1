//! Request ID middleware for request tracing and correlation.
//!
//! An `x-request-id` from an upstream proxy is kept when it looks sane;
//! otherwise a UUID v4 is generated. The id is recorded on the current span,
//! tagged on the Sentry scope, stored in the request extensions as
//! [`RequestId`] and echoed in the response headers.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream id accepted as-is.
const MAX_UPSTREAM_LEN: usize = 128;

/// The id of the request being handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

fn upstream_id(request: &Request) -> Option<String> {
    let value = request.headers().get(REQUEST_ID_HEADER)?.to_str().ok()?;
    let valid = !value.is_empty()
        && value.len() <= MAX_UPSTREAM_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
    valid.then(|| value.to_owned())
}

/// Middleware that ensures every request has a unique request ID.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = upstream_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", &request_id);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn with_header(value: &str) -> Request {
        Request::builder()
            .header(REQUEST_ID_HEADER, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_upstream_id_kept() {
        assert_eq!(
            upstream_id(&with_header("cf-abc_123.4")).as_deref(),
            Some("cf-abc_123.4")
        );
    }

    #[test]
    fn test_upstream_id_rejected_when_odd() {
        assert!(upstream_id(&with_header("has space")).is_none());
        assert!(upstream_id(&with_header(&"a".repeat(MAX_UPSTREAM_LEN + 1))).is_none());
        assert!(upstream_id(&Request::new(Body::empty())).is_none());
    }
}

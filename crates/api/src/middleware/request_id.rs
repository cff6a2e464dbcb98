//! Request ID middleware.
//!
//! Reuses an upstream `x-request-id` when it looks like an identifier, or
//! generates a UUID v4. The ID is recorded on the `http_request` span and
//! the Sentry scope, and echoed on the response. Handlers that
//! authenticate later record `user_id` on the same span.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream ID that is passed through unchanged.
const MAX_UPSTREAM_LEN: usize = 128;

/// Upstream IDs end up in logs, Sentry tags and the response header, so
/// only short token-like values are trusted.
fn is_acceptable(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_UPSTREAM_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b':'))
}

pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| is_acceptable(id))
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_ids() {
        assert!(is_acceptable("edge-7f3a"));
        assert!(is_acceptable("cf:8a1b.lagos_01"));
        assert!(is_acceptable(&Uuid::new_v4().to_string()));

        assert!(!is_acceptable(""));
        assert!(!is_acceptable("two words"));
        assert!(!is_acceptable("<script>"));
        assert!(!is_acceptable(&"a".repeat(MAX_UPSTREAM_LEN + 1)));
    }
}

//! Response transformation.
//!
//! # Responsibilities
//! - Turn the upstream response into the client-facing response
//! - Strip hop-by-hop headers from the upstream's connection
//! - Stream the body without buffering
//!
//! # Design Decisions
//! - Status code and end-to-end headers pass through unchanged; the
//!   gateway adds nothing of its own here (the request-id layer stamps
//!   the response on the way out)
//! - The body is wrapped, not collected, so large and streaming
//!   responses flow with constant memory

use axum::body::{Body, Bytes, HttpBody};
use axum::http::Response;
use axum::BoxError;

use crate::http::headers::copy_end_to_end;

/// Convert an upstream response for the client.
pub fn forward_response<B>(upstream: Response<B>) -> Response<Body>
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let (parts, body) = upstream.into_parts();

    let mut response = Response::new(Body::new(body));
    *response.status_mut() = parts.status;
    *response.version_mut() = parts.version;
    copy_end_to_end(&parts.headers, response.headers_mut());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn status_headers_and_body_pass_through() {
        let upstream = Response::builder()
            .status(StatusCode::CREATED)
            .header("content-type", "application/json")
            .header("x-origin", "api")
            .body(Body::from(r#"{"id":42}"#))
            .unwrap();

        let response = forward_response(upstream);

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
        assert_eq!(response.headers().get("x-origin").unwrap(), "api");

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], br#"{"id":42}"#);
    }

    #[test]
    fn upstream_connection_headers_are_dropped() {
        let upstream = Response::builder()
            .header("connection", "keep-alive")
            .header("keep-alive", "timeout=5")
            .header("cache-control", "no-store")
            .body(Body::empty())
            .unwrap();

        let response = forward_response(upstream);

        assert!(!response.headers().contains_key("connection"));
        assert!(!response.headers().contains_key("keep-alive"));
        assert_eq!(
            response.headers().get("cache-control").unwrap(),
            "no-store"
        );
    }
}

//! Request identification and outbound transformation.
//!
//! # Responsibilities
//! - Generate the per-request correlation ID (UUID v4)
//! - Build the upstream-bound request from the inbound one: absolute
//!   URI against the origin, rewritten path, forwarding headers, relay
//!   token attachment
//!
//! # Design Decisions
//! - The request ID is stamped by the outermost layer so every log line
//!   and the upstream both see it
//! - The inbound body is moved, never buffered; transformation touches
//!   the envelope only
//! - The upstream exchange is HTTP/1.1 regardless of the inbound
//!   protocol; hyper re-frames the body either way

use std::net::IpAddr;

use axum::body::Body;
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::request::Parts;
use axum::http::{Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::auth::AccessToken;
use crate::http::headers::copy_end_to_end;
use crate::routing::Origin;

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// UUID v4 request IDs for tower-http's request-id layer.
#[derive(Clone, Copy, Default)]
pub struct MakeGatewayRequestId;

impl MakeRequestId for MakeGatewayRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build the request sent upstream.
///
/// The URI is absolute against `origin` with `target_path` (the rewrite
/// output) and the original query string. End-to-end headers are copied,
/// hop-by-hop headers dropped, Host is set to the origin, and the client
/// address is appended to X-Forwarded-For. When a relay token is given
/// it replaces the inbound Authorization header; otherwise the inbound
/// header, if any, passes through untouched.
pub fn build_outbound(
    parts: &Parts,
    body: Body,
    origin: &Origin,
    target_path: &str,
    relay: Option<&AccessToken>,
    client_ip: IpAddr,
) -> Result<Request<Body>, axum::http::Error> {
    let path_and_query = match parts.uri.query() {
        Some(query) => format!("{target_path}?{query}"),
        None => target_path.to_string(),
    };
    let uri = Uri::builder()
        .scheme(origin.scheme())
        .authority(origin.authority())
        .path_and_query(path_and_query)
        .build()?;

    let mut request = Request::builder()
        .method(parts.method.clone())
        .uri(uri)
        .body(body)?;

    let headers = request.headers_mut();
    copy_end_to_end(&parts.headers, headers);

    headers.remove(header::HOST);
    headers.insert(header::HOST, HeaderValue::from_str(origin.authority())?);

    let forwarded_for = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(existing) => format!("{existing}, {client_ip}"),
        None => client_ip.to_string(),
    };
    headers.insert(X_FORWARDED_FOR, HeaderValue::from_str(&forwarded_for)?);
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));

    if let Some(token) = relay {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.value()))?;
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);
    }

    Ok(request)
}

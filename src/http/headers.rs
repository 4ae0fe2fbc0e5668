//! Header hygiene shared by both proxy directions.
//!
//! Hop-by-hop headers describe a single connection and must not cross
//! the gateway (RFC 9110 §7.6.1). That includes any header the
//! Connection header names. Everything else is end-to-end and copied
//! through, preserving duplicates such as repeated Set-Cookie.

use axum::http::header::{self, HeaderMap, HeaderName};

const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Headers named by the Connection header, lowercased.
fn connection_named(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|token| token.trim().parse::<HeaderName>().ok())
        .collect()
}

/// Copy every end-to-end header from `src` into `dst`.
pub fn copy_end_to_end(src: &HeaderMap, dst: &mut HeaderMap) {
    let named = connection_named(src);
    for (name, value) in src {
        if is_hop_by_hop(name) || named.contains(name) {
            continue;
        }
        dst.append(name.clone(), value.clone());
    }
}

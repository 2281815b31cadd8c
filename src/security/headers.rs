//! Outbound header sanitization.
//!
//! # Responsibilities
//! - Drop the client's User-Agent
//! - Drop any client-supplied X-Forwarded-For (no client chain is relayed upstream)
//! - Strip hop-by-hop headers, including those named by `Connection`

use axum::http::{header, HeaderMap, HeaderName};

/// Hop-by-hop headers that never cross the proxy.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Remove everything the upstream must not see.
pub fn sanitize_request_headers(headers: &mut HeaderMap) {
    let named_by_connection: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in named_by_connection {
        headers.remove(name);
    }

    for name in HOP_BY_HOP {
        headers.remove(name);
    }

    headers.remove(header::USER_AGENT);
    headers.remove(X_FORWARDED_FOR);
}

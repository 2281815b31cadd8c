//! Request handling and transformation.
//!
//! # Responsibilities
//! - Expose the request ID assigned by the server layer
//! - Recognize uptime-monitor probes
//! - Rewrite an inbound request into its upstream form

use axum::body::Body;
use axum::http::{
    uri::{InvalidUriParts, PathAndQuery},
    HeaderMap, Request, Uri, Version,
};
use thiserror::Error;

use crate::routing::{RouteClass, UpstreamRoutes};
use crate::security::sanitize_request_headers;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Header set by the uptime monitor on its probes.
pub const UPTIME_PROBE_HEADER: &str = "x-betteruptime-probe";

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("cannot build upstream URI: {0}")]
    Uri(#[from] InvalidUriParts),
}

/// The request ID, or "unknown" outside the server stack.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// True when the uptime probe header is present and non-empty.
pub fn is_uptime_probe(headers: &HeaderMap) -> bool {
    headers
        .get(UPTIME_PROBE_HEADER)
        .is_some_and(|v| !v.is_empty())
}

/// Point `request` at the upstream for `class`.
///
/// Scheme and authority are replaced, path and query are kept, the
/// protocol is pinned to HTTP/1.1 and client-identifying headers are
/// removed. The Host header is left to the dispatcher.
pub fn rewrite_for_upstream(
    request: Request<Body>,
    class: RouteClass,
    routes: &UpstreamRoutes,
) -> Result<Request<Body>, RewriteError> {
    let (mut parts, body) = request.into_parts();

    let mut uri_parts = parts.uri.into_parts();
    uri_parts.scheme = Some(routes.scheme().clone());
    uri_parts.authority = Some(routes.authority(class).clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = Uri::from_parts(uri_parts)?;
    parts.version = Version::HTTP_11;

    sanitize_request_headers(&mut parts.headers);

    Ok(Request::from_parts(parts, body))
}

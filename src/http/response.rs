//! Responses generated by the proxy itself.
//!
//! Upstream responses are never touched; only short-circuits and dispatch
//! failures are produced here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::load_balancer::DispatchError;

/// Body of health check and probe answers.
pub const OK_BODY: &str = "Ok";

/// 200 with the fixed body.
pub fn ok() -> Response {
    (StatusCode::OK, OK_BODY).into_response()
}

/// Map a dispatch failure to the response the client sees.
///
/// - Cancelled while waiting for a token → 504 Gateway Timeout
/// - Transport failure → 502 Bad Gateway
pub fn dispatch_error(err: &DispatchError) -> Response {
    match err {
        DispatchError::Cancelled { .. } => (
            StatusCode::GATEWAY_TIMEOUT,
            "Timed out waiting for an outbound slot",
        )
            .into_response(),
        DispatchError::Upstream(_) => {
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::RouteClass;

    #[test]
    fn status_mapping() {
        let cancelled = DispatchError::Cancelled {
            class: RouteClass::Www,
            channel: 0,
        };
        assert_eq!(dispatch_error(&cancelled).status(), StatusCode::GATEWAY_TIMEOUT);

        let upstream = DispatchError::Upstream("refused".into());
        assert_eq!(dispatch_error(&upstream).status(), StatusCode::BAD_GATEWAY);

        assert_eq!(ok().status(), StatusCode::OK);
    }
}

//! API key hook.
//!
//! Clients present their key in `x-api-key`. By default the key is only
//! observed (a match is logged when verbose); with enforcement on, a missing
//! or wrong key is rejected before the request reaches the dispatcher.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::config::SecurityConfig;

pub const X_API_KEY: &str = "x-api-key";

/// State required for the API key hook.
#[derive(Clone, Debug)]
pub struct ApiKeyPolicy {
    pub expected: Option<Arc<str>>,
    pub enforce: bool,
    pub verbose: bool,
}

impl ApiKeyPolicy {
    pub fn from_config(config: &SecurityConfig, verbose: bool) -> Self {
        Self {
            expected: config.api_key.as_deref().map(Arc::from),
            enforce: config.enforce_api_key,
            verbose,
        }
    }

    /// Observe-only policy with no key configured.
    pub fn disabled() -> Self {
        Self {
            expected: None,
            enforce: false,
            verbose: false,
        }
    }

    fn matches(&self, presented: Option<&str>) -> bool {
        match (self.expected.as_deref(), presented) {
            (Some(expected), Some(presented)) => expected == presented,
            _ => false,
        }
    }
}

pub async fn api_key_middleware(
    State(policy): State<ApiKeyPolicy>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let presented = req.headers().get(X_API_KEY).and_then(|v| v.to_str().ok());
    let matched = policy.matches(presented);

    if matched && policy.verbose {
        tracing::info!(path = %req.uri().path(), "Client presented the configured API key");
    }

    if policy.enforce && !matched {
        tracing::warn!(
            path = %req.uri().path(),
            key_present = presented.is_some(),
            "Rejected request without a valid API key"
        );
        return (StatusCode::UNAUTHORIZED, "Missing or invalid x-api-key").into_response();
    }

    next.run(req).await
}

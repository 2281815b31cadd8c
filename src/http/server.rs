//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router: health check, probe short-circuit, proxy fallback
//! - Wire up middleware (request ID, tracing, API key hook)
//! - Classify each request once, rewrite it, and hand it to the dispatcher
//! - Stream upstream responses back unmodified
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::{request, response};
use crate::lifecycle::{startup, ShutdownSignal, StartupError};
use crate::load_balancer::Dispatcher;
use crate::observability::metrics;
use crate::security::{api_key_middleware, ApiKeyPolicy};

/// Path answered locally for liveness checks.
pub const HEALTHCHECK_PATH: &str = "/healthcheck";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP front of the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    dispatcher: Arc<Dispatcher>,
}

impl HttpServer {
    /// Build the address pool and dispatcher from `config`. Fails fast if
    /// any outbound transport cannot be constructed.
    pub fn new(config: ProxyConfig) -> Result<Self, StartupError> {
        let dispatcher = Arc::new(startup::build_dispatcher(&config)?);
        Ok(Self::with_dispatcher(config, dispatcher))
    }

    /// Serve with an already-built dispatcher.
    pub fn with_dispatcher(config: ProxyConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let policy = ApiKeyPolicy::from_config(&config.security, config.observability.verbose);
        let state = AppState {
            dispatcher: dispatcher.clone(),
        };
        let router = build_router(state, policy);

        Self {
            router,
            config,
            dispatcher,
        }
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            channels = self.dispatcher.pool().len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }
}

/// Assemble routes and middleware.
///
/// The health check sits outside the API key hook. Probes are answered
/// before the hook runs.
pub fn build_router(state: AppState, policy: ApiKeyPolicy) -> Router {
    let proxied: Router<AppState> = Router::new()
        .fallback(proxy_handler)
        .layer(middleware::from_fn_with_state(policy, api_key_middleware))
        .layer(middleware::from_fn(uptime_probe));

    Router::new()
        .route(HEALTHCHECK_PATH, get(healthcheck))
        .merge(proxied)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        request_id = %request::request_id(req),
                        method = %req.method(),
                        path = %req.uri().path(),
                    )
                })),
        )
}

async fn healthcheck() -> Response {
    metrics::record_short_circuit("healthcheck");
    response::ok()
}

/// Uptime monitor probes never reach the dispatcher.
async fn uptime_probe(req: Request<Body>, next: Next) -> Response {
    if request::is_uptime_probe(req.headers()) {
        metrics::record_short_circuit("probe");
        return response::ok();
    }
    next.run(req).await
}

/// Main proxy handler.
/// Classifies, rewrites, dispatches and streams the upstream response back.
async fn proxy_handler(State(state): State<AppState>, req: Request<Body>) -> Response {
    let routes = state.dispatcher.routes();
    let class = routes.classify(req.uri().path());

    tracing::debug!(
        class = %class,
        method = %req.method(),
        path = %req.uri().path(),
        "Proxying request"
    );

    let req = match request::rewrite_for_upstream(req, class, routes) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to rewrite request");
            return (axum::http::StatusCode::BAD_REQUEST, "Invalid request URI").into_response();
        }
    };

    match state.dispatcher.dispatch(class, req).await {
        Ok(upstream) => upstream,
        Err(e) => response::dispatch_error(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitConfig;
    use crate::routing::RouteClass;
    use crate::test_utils::{counting_dispatcher, counting_pool, default_routes, CountingTransport};
    use axum::http::{header, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(dispatcher: Dispatcher, policy: ApiKeyPolicy) -> Router {
        build_router(
            AppState {
                dispatcher: Arc::new(dispatcher),
            },
            policy,
        )
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get_req(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn healthcheck_bypasses_exhausted_limiters() {
        let limits = RateLimitConfig {
            requests_per_second: 0.001,
            burst_size: 1,
        };
        let (dispatcher, transports) = counting_dispatcher(1, &limits);
        let dispatcher = dispatcher.with_wait_deadline(Some(Duration::from_millis(20)));
        let app = app(dispatcher, ApiKeyPolicy::disabled());

        let first = app.clone().oneshot(get_req("/Platform/User/1/")).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let second = app.clone().oneshot(get_req("/Platform/User/1/")).await.unwrap();
        assert_eq!(second.status(), StatusCode::GATEWAY_TIMEOUT);

        let health = app.oneshot(get_req(HEALTHCHECK_PATH)).await.unwrap();
        assert_eq!(health.status(), StatusCode::OK);
        assert_eq!(body_text(health).await, "Ok");
        assert_eq!(transports[0].calls(), 1);
    }

    #[tokio::test]
    async fn probe_is_answered_locally_on_any_path() {
        let (dispatcher, transports) = counting_dispatcher(1, &RateLimitConfig::default());
        let app = app(dispatcher, ApiKeyPolicy::disabled());

        let req = Request::builder()
            .uri("/Platform/Destiny2/Manifest/")
            .header(request::UPTIME_PROBE_HEADER, "1")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_text(res).await, "Ok");
        assert_eq!(transports[0].calls(), 0);
    }

    #[tokio::test]
    async fn requests_are_rewritten_and_sanitized() {
        let (dispatcher, transports) = counting_dispatcher(1, &RateLimitConfig::default());
        let app = app(dispatcher, ApiKeyPolicy::disabled());

        let req = Request::builder()
            .uri("/Destiny2/Stats/PostGameCarnageReport/123")
            .header(header::USER_AGENT, "client/1.0")
            .header("x-forwarded-for", "203.0.113.1")
            .body(Body::empty())
            .unwrap();
        app.clone().oneshot(req).await.unwrap();
        app.oneshot(get_req("/Platform/User/1/")).await.unwrap();

        let seen = transports[0].seen();
        assert_eq!(
            seen[0].uri.to_string(),
            "https://stats.bungie.net/Destiny2/Stats/PostGameCarnageReport/123"
        );
        assert_eq!(seen[0].headers[header::HOST], "stats.bungie.net");
        assert!(seen[0].headers.get(header::USER_AGENT).is_none());
        assert!(seen[0].headers.get("x-forwarded-for").is_none());
        assert!(seen[0].headers.get(request::X_REQUEST_ID).is_some());

        assert_eq!(seen[1].uri.to_string(), "https://www.bungie.net/Platform/User/1/");
        assert_eq!(seen[1].headers[header::HOST], "www.bungie.net");
    }

    #[tokio::test]
    async fn upstream_status_and_body_pass_through() {
        let limits = RateLimitConfig::default();
        let (pool, _) = counting_pool(1, &limits, || {
            CountingTransport::with_status(StatusCode::TOO_MANY_REQUESTS)
        });
        let app = app(Dispatcher::new(pool, default_routes()), ApiKeyPolicy::disabled());

        let res = app.oneshot(get_req("/Platform/User/1/")).await.unwrap();
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body_text(res).await, "upstream");
    }

    #[tokio::test]
    async fn transport_failure_is_bad_gateway() {
        let (pool, transports) =
            counting_pool(1, &RateLimitConfig::default(), CountingTransport::failing);
        let app = app(Dispatcher::new(pool, default_routes()), ApiKeyPolicy::disabled());

        let res = app.oneshot(get_req("/Platform/User/1/")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(transports[0].calls(), 1);
    }

    #[tokio::test]
    async fn enforced_api_key_gates_proxying_but_not_health() {
        let (dispatcher, transports) = counting_dispatcher(1, &RateLimitConfig::default());
        let policy = ApiKeyPolicy {
            expected: Some(Arc::from("secret")),
            enforce: true,
            verbose: false,
        };
        let app = app(dispatcher, policy);

        let denied = app.clone().oneshot(get_req("/Platform/User/1/")).await.unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let allowed = Request::builder()
            .uri("/Platform/User/1/")
            .header("x-api-key", "secret")
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.clone().oneshot(allowed).await.unwrap().status(), StatusCode::OK);

        let health = app.oneshot(get_req(HEALTHCHECK_PATH)).await.unwrap();
        assert_eq!(health.status(), StatusCode::OK);
        assert_eq!(transports[0].calls(), 1);
    }

    #[tokio::test]
    async fn classification_drives_the_counter() {
        let (dispatcher, _) = counting_dispatcher(2, &RateLimitConfig::default());
        let dispatcher = Arc::new(dispatcher);
        let app = build_router(
            AppState {
                dispatcher: dispatcher.clone(),
            },
            ApiKeyPolicy::disabled(),
        );

        for _ in 0..3 {
            app.clone()
                .oneshot(get_req("/Destiny2/Stats/PostGameCarnageReport/1"))
                .await
                .unwrap();
        }
        assert_eq!(dispatcher.counters().for_class(RouteClass::Stats).issued(), 3);
        assert_eq!(dispatcher.counters().for_class(RouteClass::Www).issued(), 0);
    }
}

//! Outbound channel abstraction.
//!
//! # Responsibilities
//! - Represent one outbound network identity (a local source address)
//! - Own the HTTP transport whose sockets are bound to that address
//! - Hold one rate limiter per route class

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ProxyConfig, RateLimitConfig};
use crate::load_balancer::rate_limit::RateLimiter;
use crate::routing::RouteClass;

/// Error type produced by transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to load native root certificates: {0}")]
    NativeRoots(#[source] std::io::Error),
    #[error("failed to configure TLS: {0}")]
    Tls(#[from] rustls::Error),
}

/// Performs one HTTP round trip.
///
/// The request URI is absolute; the response is handed back untouched,
/// whatever its status.
pub trait Transport: Send + Sync + fmt::Debug {
    fn round_trip(&self, request: Request<Body>) -> BoxFuture<'static, Result<Response<Body>, BoxError>>;
}

/// Dial settings shared by every channel.
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub connect_timeout: Duration,
    pub keepalive: Duration,
    pub pool_idle_timeout: Duration,
    pub native_roots: bool,
}

impl TransportSettings {
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(config.timeouts.connect_secs),
            keepalive: Duration::from_secs(config.timeouts.keepalive_secs),
            pool_idle_timeout: Duration::from_secs(config.timeouts.pool_idle_secs),
            native_roots: config.transport.native_roots,
        }
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self::from_config(&ProxyConfig::default())
    }
}

type HttpsClient = Client<HttpsConnector<HttpConnector>, Body>;

/// hyper client whose connections all originate from one local address.
#[derive(Debug, Clone)]
pub struct HyperTransport {
    client: HttpsClient,
    local_address: IpAddr,
}

impl HyperTransport {
    pub fn new(local_address: IpAddr, settings: &TransportSettings) -> Result<Self, TransportError> {
        let mut http = HttpConnector::new();
        http.set_local_address(Some(local_address));
        http.set_connect_timeout(Some(settings.connect_timeout));
        http.set_keepalive(Some(settings.keepalive));
        http.enforce_http(false);

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = HttpsConnectorBuilder::new();
        let builder = if settings.native_roots {
            builder
                .with_provider_and_native_roots(provider)
                .map_err(TransportError::NativeRoots)?
        } else {
            builder.with_provider_and_webpki_roots(provider)?
        };
        let https = builder.https_or_http().enable_http1().wrap_connector(http);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(settings.pool_idle_timeout)
            .build(https);

        Ok(Self {
            client,
            local_address,
        })
    }

    pub fn local_address(&self) -> IpAddr {
        self.local_address
    }
}

impl Transport for HyperTransport {
    fn round_trip(&self, request: Request<Body>) -> BoxFuture<'static, Result<Response<Body>, BoxError>> {
        let client = self.client.clone();
        Box::pin(async move {
            client
                .request(request)
                .await
                .map(|response| response.map(Body::new))
                .map_err(BoxError::from)
        })
    }
}

/// One unit of forwarding capacity.
pub struct OutboundChannel {
    index: usize,
    local_address: IpAddr,
    transport: Arc<dyn Transport>,
    stats_limiter: RateLimiter,
    www_limiter: RateLimiter,
}

impl OutboundChannel {
    pub fn new(
        index: usize,
        local_address: IpAddr,
        transport: Arc<dyn Transport>,
        limits: &RateLimitConfig,
    ) -> Self {
        Self {
            index,
            local_address,
            transport,
            stats_limiter: RateLimiter::new(limits.requests_per_second, limits.burst_size),
            www_limiter: RateLimiter::new(limits.requests_per_second, limits.burst_size),
        }
    }

    /// Position in the pool.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn local_address(&self) -> IpAddr {
        self.local_address
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// The limiter charged for `class` requests sent over this channel.
    pub fn limiter(&self, class: RouteClass) -> &RateLimiter {
        match class {
            RouteClass::Stats => &self.stats_limiter,
            RouteClass::Www => &self.www_limiter,
        }
    }
}

impl fmt::Debug for OutboundChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundChannel")
            .field("index", &self.index)
            .field("local_address", &self.local_address)
            .finish_non_exhaustive()
    }
}

//! Test utilities shared by the unit tests.
//!
//! Provides an in-memory transport that records what would have been sent
//! upstream, and helpers to build pools and dispatchers around it.

use axum::body::Body;
use axum::http::{HeaderMap, Request, Response, StatusCode, Uri};
use futures_util::future::BoxFuture;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::{RateLimitConfig, UpstreamConfig};
use crate::load_balancer::{
    channel::{BoxError, Transport},
    dispatcher::Dispatcher,
    pool::AddressPool,
};
use crate::routing::UpstreamRoutes;

/// What a transport was asked to send.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub uri: Uri,
    pub headers: HeaderMap,
}

/// Transport that never touches the network.
#[derive(Debug)]
pub struct CountingTransport {
    calls: AtomicUsize,
    status: StatusCode,
    fail: bool,
    seen: Mutex<Vec<SeenRequest>>,
}

impl Default for CountingTransport {
    fn default() -> Self {
        Self::with_status(StatusCode::OK)
    }
}

impl CountingTransport {
    /// Answer every request with `status` and body "upstream".
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            status,
            fail: false,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request as if the connection was refused.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for CountingTransport {
    fn round_trip(&self, request: Request<Body>) -> BoxFuture<'static, Result<Response<Body>, BoxError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(SeenRequest {
            uri: request.uri().clone(),
            headers: request.headers().clone(),
        });

        let status = self.status;
        let fail = self.fail;
        Box::pin(async move {
            if fail {
                return Err(BoxError::from("connection refused"));
            }
            let mut response = Response::new(Body::from("upstream"));
            *response.status_mut() = status;
            Ok(response)
        })
    }
}

/// A pool of `count` channels starting at 2001:db8::1, each with its own
/// counting transport (returned in channel order).
pub fn counting_pool(
    count: usize,
    limits: &RateLimitConfig,
    make: impl Fn() -> CountingTransport,
) -> (AddressPool, Vec<Arc<CountingTransport>>) {
    let transports: Vec<Arc<CountingTransport>> =
        (0..count).map(|_| Arc::new(make())).collect();
    let mut next = transports.clone().into_iter();
    let base: IpAddr = "2001:db8::1".parse().unwrap();

    let pool = AddressPool::build(base, count, limits, |_| {
        Ok(next.next().unwrap() as Arc<dyn Transport>)
    })
    .unwrap();
    (pool, transports)
}

/// Production routes (stats.bungie.net / www.bungie.net over https).
pub fn default_routes() -> Arc<UpstreamRoutes> {
    Arc::new(UpstreamRoutes::from_config(&UpstreamConfig::default()).unwrap())
}

/// Dispatcher over `count` counting channels with the given limits.
pub fn counting_dispatcher(
    count: usize,
    limits: &RateLimitConfig,
) -> (Dispatcher, Vec<Arc<CountingTransport>>) {
    let (pool, transports) = counting_pool(count, limits, CountingTransport::default);
    (Dispatcher::new(pool, default_routes()), transports)
}

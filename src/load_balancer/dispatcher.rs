//! Rate-gated dispatch over the channel pool.
//!
//! # Data Flow
//! ```text
//! (RouteClass, request)
//!     → ClassCounters[class].next_index(pool.len())  (lock-free)
//!     → channel = pool[index]
//!     → Host header = upstream authority for class
//!     → channel.limiter(class).acquire()  ← the only wait; bounded by cancellation
//!     → channel.transport().round_trip(request)
//!     → response / error handed back verbatim
//! ```

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response};
use std::future::{self, Future};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::load_balancer::{
    channel::{BoxError, OutboundChannel},
    pool::AddressPool,
    round_robin::ClassCounters,
};
use crate::observability::metrics;
use crate::routing::{RouteClass, UpstreamRoutes};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request was cancelled before its channel admitted it. Nothing was sent.
    #[error("cancelled while waiting for a {class} token on channel {channel}")]
    Cancelled { class: RouteClass, channel: usize },
    /// The transport failed (dial, write or read). Not retried.
    #[error("upstream request failed: {0}")]
    Upstream(#[source] BoxError),
}

/// Selects a channel per request and forwards it once the channel's
/// limiter for the request's class admits it.
#[derive(Debug)]
pub struct Dispatcher {
    pool: AddressPool,
    routes: Arc<UpstreamRoutes>,
    counters: ClassCounters,
    wait_deadline: Option<Duration>,
    verbose: bool,
}

impl Dispatcher {
    pub fn new(pool: AddressPool, routes: Arc<UpstreamRoutes>) -> Self {
        Self {
            pool,
            routes,
            counters: ClassCounters::new(),
            wait_deadline: None,
            verbose: false,
        }
    }

    /// Upper bound on the limiter wait. `None` waits until a token arrives
    /// or the dispatch future is dropped.
    pub fn with_wait_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.wait_deadline = deadline;
        self
    }

    /// Log outbound URL and headers at info instead of debug.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn pool(&self) -> &AddressPool {
        &self.pool
    }

    pub fn routes(&self) -> &UpstreamRoutes {
        &self.routes
    }

    pub fn counters(&self) -> &ClassCounters {
        &self.counters
    }

    /// Advance `class`'s rotation and return the channel it lands on.
    pub fn select(&self, class: RouteClass) -> &OutboundChannel {
        let index = self.counters.for_class(class).next_index(self.pool.len());
        &self.pool.channels()[index]
    }

    /// Forward `request` using the configured wait deadline as the
    /// cancellation signal.
    pub async fn dispatch(
        &self,
        class: RouteClass,
        request: Request<Body>,
    ) -> Result<Response<Body>, DispatchError> {
        match self.wait_deadline {
            Some(deadline) => {
                self.dispatch_until(class, request, tokio::time::sleep(deadline))
                    .await
            }
            None => {
                self.dispatch_until(class, request, future::pending::<()>())
                    .await
            }
        }
    }

    /// Forward `request`, abandoning the limiter wait if `cancelled`
    /// completes first. Once admitted, the round trip itself is not
    /// cancelled by `cancelled`.
    pub async fn dispatch_until<C>(
        &self,
        class: RouteClass,
        mut request: Request<Body>,
        cancelled: C,
    ) -> Result<Response<Body>, DispatchError>
    where
        C: Future<Output = ()>,
    {
        let channel = self.select(class);

        if let Ok(host) = HeaderValue::from_str(self.routes.authority(class).as_str()) {
            request.headers_mut().insert(header::HOST, host);
        }

        let started = Instant::now();
        tokio::select! {
            biased;
            _ = channel.limiter(class).acquire() => {}
            _ = cancelled => {
                tracing::warn!(
                    class = %class,
                    channel = channel.index(),
                    waited_ms = started.elapsed().as_millis() as u64,
                    "Dispatch cancelled while waiting for rate limiter"
                );
                metrics::record_cancelled(class);
                return Err(DispatchError::Cancelled {
                    class,
                    channel: channel.index(),
                });
            }
        }
        metrics::record_limiter_wait(class, started.elapsed());

        if self.verbose {
            tracing::info!(
                class = %class,
                channel = channel.index(),
                local_address = %channel.local_address(),
                url = %request.uri(),
                headers = ?request.headers(),
                "Sending request"
            );
        } else {
            tracing::debug!(
                class = %class,
                channel = channel.index(),
                local_address = %channel.local_address(),
                url = %request.uri(),
                "Sending request"
            );
        }

        metrics::record_dispatch(class, channel.index());
        channel.transport().round_trip(request).await.map_err(|e| {
            tracing::error!(
                class = %class,
                channel = channel.index(),
                local_address = %channel.local_address(),
                error = %e,
                "Upstream error"
            );
            metrics::record_upstream_error(class);
            DispatchError::Upstream(e)
        })
    }
}

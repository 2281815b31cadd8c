//! Startup orchestration.
//!
//! Builds the dispatch layer in dependency order: routes, then the address
//! pool, then the dispatcher. Any error is fatal; no request is served on a
//! partially built pool.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::ProxyConfig;
use crate::load_balancer::{AddressPool, Dispatcher, PoolError};
use crate::observability::metrics;
use crate::routing::{RouteError, UpstreamRoutes};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid upstream routes: {0}")]
    Routes(#[from] RouteError),
    #[error("failed to build address pool: {0}")]
    Pool(#[from] PoolError),
}

/// Construct the dispatcher described by `config`.
///
/// When `pool.print_provisioning` is set, the `ip addr add` command for
/// every pool address is written to stdout.
pub fn build_dispatcher(config: &ProxyConfig) -> Result<Dispatcher, StartupError> {
    let routes = Arc::new(UpstreamRoutes::from_config(&config.upstream)?);
    let pool = AddressPool::from_config(config)?;

    if config.pool.print_provisioning {
        for command in pool.provisioning_commands(&config.pool.interface) {
            println!("{command}");
        }
    }

    metrics::record_pool_size(pool.len());

    Ok(Dispatcher::new(pool, routes)
        .with_wait_deadline(limiter_wait_deadline(config))
        .with_verbose(config.observability.verbose))
}

/// `timeouts.limiter_wait_ms`, with zero meaning no deadline.
pub fn limiter_wait_deadline(config: &ProxyConfig) -> Option<Duration> {
    match config.timeouts.limiter_wait_ms {
        0 => None,
        ms => Some(Duration::from_millis(ms)),
    }
}

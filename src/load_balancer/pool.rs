//! Outbound channel pool.
//!
//! # Responsibilities
//! - Derive N sequential local addresses from the base address
//! - Build one outbound channel (transport + limiters) per address
//! - Fail fast if any transport cannot be built

use std::net::IpAddr;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ProxyConfig, RateLimitConfig};
use crate::load_balancer::{
    address::{self, AddressError},
    channel::{HyperTransport, OutboundChannel, Transport, TransportError, TransportSettings},
};

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("address pool needs at least one channel")]
    Empty,
    #[error("no base address configured")]
    MissingBaseAddress,
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error("failed to build transport for {address}: {source}")]
    Transport {
        address: IpAddr,
        #[source]
        source: TransportError,
    },
}

/// Fixed, ordered set of outbound channels. Never changes after construction.
#[derive(Debug)]
pub struct AddressPool {
    channels: Vec<OutboundChannel>,
}

impl AddressPool {
    /// Build a pool of `count` channels starting at `base`, using
    /// `make_transport` to create each channel's transport.
    pub fn build<F>(
        base: IpAddr,
        count: usize,
        limits: &RateLimitConfig,
        mut make_transport: F,
    ) -> Result<Self, PoolError>
    where
        F: FnMut(IpAddr) -> Result<Arc<dyn Transport>, TransportError>,
    {
        if count == 0 {
            return Err(PoolError::Empty);
        }

        let channels = address::sequential(base, count)?
            .into_iter()
            .enumerate()
            .map(|(index, addr)| {
                let transport = make_transport(addr).map_err(|source| PoolError::Transport {
                    address: addr,
                    source,
                })?;
                Ok(OutboundChannel::new(index, addr, transport, limits))
            })
            .collect::<Result<Vec<_>, PoolError>>()?;

        tracing::info!(
            base = %base,
            channels = channels.len(),
            "Address pool built"
        );

        Ok(Self { channels })
    }

    /// Build the production pool: one hyper transport per address.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, PoolError> {
        let base = config.pool.base_address.ok_or(PoolError::MissingBaseAddress)?;
        let settings = TransportSettings::from_config(config);

        Self::build(base, config.pool.count, &config.rate_limit, |addr| {
            let transport = HyperTransport::new(addr, &settings)?;
            Ok(Arc::new(transport) as Arc<dyn Transport>)
        })
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Always false for a constructed pool.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&OutboundChannel> {
        self.channels.get(index)
    }

    pub fn channels(&self) -> &[OutboundChannel] {
        &self.channels
    }

    pub fn addresses(&self) -> impl Iterator<Item = IpAddr> + '_ {
        self.channels.iter().map(OutboundChannel::local_address)
    }

    /// One `ip addr add` command per pool address.
    pub fn provisioning_commands(&self, interface: &str) -> Vec<String> {
        self.addresses()
            .map(|addr| address::provisioning_command(addr, interface))
            .collect()
    }
}

//! Outbound dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     base address + count
//!     → address.rs (sequential local addresses)
//!     → pool.rs (one channel per address)
//!     → channel.rs (address-bound transport + per-class limiters)
//!
//! Per request:
//!     → dispatcher.rs
//!         - round_robin.rs (per-class rotation over the pool)
//!         - rate_limit.rs (wait for the channel's token)
//!         - channel transport performs the round trip
//! ```
//!
//! # Design Decisions
//! - The pool is immutable after startup; no locking on the read path
//! - Each route class has its own rotation and its own limiter per channel
//! - The limiter wait is the only place a request blocks on shared state
//! - No retries, no circuit breaking: upstream failures go straight back

pub mod address;
pub mod channel;
pub mod dispatcher;
pub mod pool;
pub mod rate_limit;
pub mod round_robin;

pub use channel::{BoxError, HyperTransport, OutboundChannel, Transport, TransportSettings};
pub use dispatcher::{DispatchError, Dispatcher};
pub use pool::{AddressPool, PoolError};
pub use rate_limit::RateLimiter;

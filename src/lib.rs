//! Outbound-multiplexing reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌───────────────────────────────────────────────────────┐
//!                       │                    FANOUT PROXY                        │
//!                       │                                                        │
//!   Client Request      │  ┌─────────┐   ┌──────────┐   ┌────────────────────┐  │
//!   ────────────────────┼─▶│  http   │──▶│ routing  │──▶│   load_balancer    │  │
//!                       │  │ server  │   │ classify │   │ dispatcher         │  │
//!                       │  └─────────┘   └──────────┘   │  round robin/class │  │
//!                       │       │ /healthcheck,         │  rate limit/chan   │  │
//!                       │       │ uptime probe → "Ok"   └─────────┬──────────┘  │
//!                       │       ▼                                 ▼             │
//!   Client Response     │  ┌─────────┐        ┌──────────────────────────────┐  │
//!   ◀───────────────────┼──│ stream  │◀───────│ channel 0..N (local addr i)  │◀─┼── stats.bungie.net
//!                       │  └─────────┘        │ hyper + rustls transport     │  │   www.bungie.net
//!                       │                     └──────────────────────────────┘  │
//!                       │                                                        │
//!                       │  config · observability · security · lifecycle         │
//!                       └───────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod routing;
pub mod security;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration for the fan-out proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Inbound listener (host, port).
    pub listener: ListenerConfig,

    /// Outbound address pool.
    pub pool: PoolConfig,

    /// The two upstream hosts and the path marker that splits them.
    pub upstream: UpstreamConfig,

    /// Per-channel, per-class rate limit.
    pub rate_limit: RateLimitConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Outbound transport settings.
    pub transport: TransportConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Client API key handling.
    pub security: SecurityConfig,
}

impl ProxyConfig {
    /// Socket address the inbound listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listener.host, self.listener.port)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Port to listen on.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
        }
    }
}

/// Outbound address pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// First local address of the pool. Usually supplied by the environment.
    pub base_address: Option<IpAddr>,

    /// Number of sequential addresses (one outbound channel each).
    pub count: usize,

    /// Network interface the addresses live on. Only used for provisioning output.
    pub interface: String,

    /// Print the `ip addr add` command for every pool address at startup.
    pub print_provisioning: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            base_address: None,
            count: 1,
            interface: "enp1s0".to_string(),
            print_provisioning: false,
        }
    }
}

/// Upstream routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Host receiving requests whose path contains `stats_path_marker`.
    pub stats_host: String,

    /// Host receiving every other request.
    pub www_host: String,

    /// Path substring identifying stats requests.
    pub stats_path_marker: String,

    /// Scheme used for outbound requests ("https" or "http").
    pub scheme: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            stats_host: "stats.bungie.net".to_string(),
            www_host: "www.bungie.net".to_string(),
            stats_path_marker: "Destiny2/Stats/PostGameCarnageReport".to_string(),
            scheme: "https".to_string(),
        }
    }
}

/// Rate limiting configuration, applied to every (channel, class) pair.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Sustained refill rate in tokens per second.
    pub requests_per_second: f64,

    /// Burst capacity.
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 40.0,
            burst_size: 90,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Outbound connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// TCP keep-alive interval for outbound connections in seconds.
    pub keepalive_secs: u64,

    /// How long an idle pooled upstream connection is kept, in seconds.
    pub pool_idle_secs: u64,

    /// Deadline for waiting on a rate limiter token, in milliseconds.
    /// Zero means the wait only ends on a token or client disconnect.
    pub limiter_wait_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 30,
            keepalive_secs: 30,
            pool_idle_secs: 90,
            limiter_wait_ms: 30_000,
        }
    }
}

/// Outbound transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TransportConfig {
    /// Trust the operating system's certificate store instead of the bundled webpki roots.
    pub native_roots: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Log every outbound URL and header set.
    pub verbose: bool,

    /// Optional Prometheus scrape address (e.g., "0.0.0.0:9090").
    pub metrics_address: Option<String>,
}

impl ObservabilityConfig {
    /// The configured output format, if `log_format` names one.
    pub fn format(&self) -> Option<LogFormat> {
        LogFormat::from_name(&self.log_format)
    }
}

/// Log output formats accepted in `observability.log_format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Exact, lowercase match.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            verbose: false,
            metrics_address: None,
        }
    }
}

/// Client API key handling.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    /// Expected value of the client's `x-api-key` header.
    pub api_key: Option<String>,

    /// Reject requests whose key is missing or wrong. Off by default: the key is only observed.
    pub enforce_api_key: bool,
}

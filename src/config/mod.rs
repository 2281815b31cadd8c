//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment: IPV6_FILE / IPV6 / BUNGIE_API_KEY (loader.rs)
//!     → CLI flags (main.rs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the address pool is built from it exactly once
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::PoolConfig;
pub use schema::ProxyConfig;
pub use schema::RateLimitConfig;
pub use schema::SecurityConfig;
pub use schema::TimeoutConfig;
pub use schema::TransportConfig;
pub use schema::UpstreamConfig;

//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → access_control.rs (observe or enforce x-api-key)
//!     → [rewrite for upstream]
//!     → headers.rs (drop User-Agent, X-Forwarded-For, hop-by-hop)
//!     → Pass to dispatcher
//! ```
//!
//! # Design Decisions
//! - Nothing identifying the client chain is relayed upstream
//! - Key enforcement is opt-in; health checks are never gated

pub mod access_control;
pub mod headers;

pub use access_control::{api_key_middleware, ApiKeyPolicy};
pub use headers::sanitize_request_headers;

//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → /healthcheck or uptime probe? answer "Ok" locally
//!     → request.rs (classify once, rewrite URI, sanitize headers)
//!     → [dispatcher picks channel, waits for token, forwards]
//!     → response.rs (only for proxy-generated errors)
//!     → upstream response streamed to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RewriteError, UPTIME_PROBE_HEADER, X_REQUEST_ID};
pub use server::{AppState, HttpServer, HEALTHCHECK_PATH};

//! Request routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → matcher.rs (stats marker present? → RouteClass)
//!     → router.rs (RouteClass → upstream authority + scheme)
//!     → class travels with the request into the dispatcher
//! ```
//!
//! # Design Decisions
//! - Classification happens once per request; the class is passed along explicitly
//! - Routes are static for the life of the process

pub mod matcher;
pub mod router;

pub use matcher::{PathMarker, RouteClass};
pub use router::{RouteError, UpstreamRoutes};

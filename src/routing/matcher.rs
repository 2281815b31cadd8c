//! Route class matching.
//!
//! # Design Decisions
//! - A request is either a stats request or a www request; nothing else
//! - The marker test is a plain, case-sensitive substring search on the path
//! - No regex to guarantee O(n) matching

use std::fmt;

/// Which upstream a request belongs to. Each class has its own
/// round-robin rotation and its own limiter in every channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Post-game carnage reports, served by the stats host.
    Stats,
    /// Everything else, served by the base platform host.
    Www,
}

impl RouteClass {
    pub const ALL: [RouteClass; 2] = [RouteClass::Stats, RouteClass::Www];

    /// Stable label for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            RouteClass::Stats => "stats",
            RouteClass::Www => "www",
        }
    }
}

impl fmt::Display for RouteClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matches paths containing a fixed substring.
#[derive(Debug, Clone)]
pub struct PathMarker {
    marker: String,
}

impl PathMarker {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Returns true if `path` contains the marker anywhere.
    pub fn matches(&self, path: &str) -> bool {
        path.contains(&self.marker)
    }

    /// Classify a path: marker present means stats, anything else is www.
    pub fn classify(&self, path: &str) -> RouteClass {
        if self.matches(path) {
            RouteClass::Stats
        } else {
            RouteClass::Www
        }
    }
}

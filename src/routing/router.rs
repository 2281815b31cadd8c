//! Upstream route table.
//!
//! Holds the two upstream authorities and the scheme, parsed once at
//! startup so the request path never re-parses host strings.

use axum::http::uri::{Authority, InvalidUri, Scheme};
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::routing::matcher::{PathMarker, RouteClass};

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid upstream host {host:?}: {source}")]
    InvalidHost {
        host: String,
        #[source]
        source: InvalidUri,
    },
    #[error("invalid upstream scheme {0:?}")]
    InvalidScheme(String),
}

/// Immutable routing table shared by the front handler and the dispatcher.
#[derive(Debug, Clone)]
pub struct UpstreamRoutes {
    marker: PathMarker,
    stats_host: Authority,
    www_host: Authority,
    scheme: Scheme,
}

impl UpstreamRoutes {
    /// Build the table from configuration.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, RouteError> {
        let scheme = match config.scheme.as_str() {
            "https" => Scheme::HTTPS,
            "http" => Scheme::HTTP,
            other => return Err(RouteError::InvalidScheme(other.to_string())),
        };

        Ok(Self {
            marker: PathMarker::new(config.stats_path_marker.clone()),
            stats_host: parse_authority(&config.stats_host)?,
            www_host: parse_authority(&config.www_host)?,
            scheme,
        })
    }

    /// Classify a request path. This is the only place a class is derived.
    pub fn classify(&self, path: &str) -> RouteClass {
        self.marker.classify(path)
    }

    /// Upstream authority serving `class`.
    pub fn authority(&self, class: RouteClass) -> &Authority {
        match class {
            RouteClass::Stats => &self.stats_host,
            RouteClass::Www => &self.www_host,
        }
    }

    /// Scheme for every outbound request.
    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }
}

fn parse_authority(host: &str) -> Result<Authority, RouteError> {
    host.parse().map_err(|source| RouteError::InvalidHost {
        host: host.to_string(),
        source,
    })
}

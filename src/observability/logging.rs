//! Structured logging.
//!
//! `RUST_LOG` wins when set. Otherwise the level comes from config, and
//! `verbose` raises it to debug. Output is pretty for terminals or JSON for
//! log shipping.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::LogFormat;
use crate::config::ObservabilityConfig;

/// Filter used when `RUST_LOG` is not set.
pub fn default_directive(config: &ObservabilityConfig) -> String {
    let level = if config.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    format!("fanout_proxy={level},tower_http={level}")
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(config).into());

    let registry = tracing_subscriber::registry().with(filter);
    // An unknown format is reported by validation; log pretty until then.
    if config.format() == Some(LogFormat::Json) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

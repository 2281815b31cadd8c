use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

use fanout_proxy::config::{loader, ProxyConfig};
use fanout_proxy::lifecycle::{signals, Shutdown};
use fanout_proxy::observability::{logging, metrics};
use fanout_proxy::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "fanout-proxy")]
#[command(about = "Reverse proxy that spreads upstream calls over many local IPv6 addresses", long_about = None)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// IPv6 interface the outbound addresses live on
    #[arg(long)]
    interface: Option<String>,

    /// Number of sequential IPv6 addresses
    #[arg(long = "v6-n")]
    v6_n: Option<usize>,

    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Print the commands that provision every IPv6 address
    #[arg(long)]
    print_addrs: bool,

    /// Log every outbound request
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut ProxyConfig) {
        if let Some(interface) = &self.interface {
            config.pool.interface = interface.clone();
        }
        if let Some(count) = self.v6_n {
            config.pool.count = count;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if self.print_addrs {
            config.pool.print_provisioning = true;
        }
        if self.verbose {
            config.observability.verbose = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => loader::load_config(path)?,
        None => ProxyConfig::default(),
    };
    loader::apply_environment(&mut config, |key| std::env::var(key).ok())?;
    cli.apply(&mut config);

    logging::init_logging(&config.observability);
    tracing::info!("fanout-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let config = loader::finalize(config).inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
    })?;

    tracing::info!(
        base_address = ?config.pool.base_address,
        channels = config.pool.count,
        rate = config.rate_limit.requests_per_second,
        burst = config.rate_limit.burst_size,
        "Configuration loaded"
    );

    if let Some(addr) = &config.observability.metrics_address {
        match addr.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(metrics_address = %addr, error = %e, "Failed to parse metrics address"),
        }
    }

    let server = HttpServer::new(config.clone()).inspect_err(|e| {
        tracing::error!(error = %e, "Failed to build outbound pool");
    })?;

    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Ready");

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_termination().await;
        shutdown.trigger();
    });

    server.run(listener, signal).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

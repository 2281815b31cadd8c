//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use fanout_proxy::config::{loader, ProxyConfig};
use fanout_proxy::lifecycle::Shutdown;
use fanout_proxy::HttpServer;

/// Request head as received by a mock upstream.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Target of the request line, e.g. `/Platform/x?y=1`.
    pub fn target(&self) -> &str {
        self.request_line.split(' ').nth(1).unwrap_or("")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw-TCP upstream that records every request head and answers with a
/// fixed status and body.
pub struct MockUpstream {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockUpstream {
    pub fn authority(&self) -> String {
        self.addr.to_string()
    }

    pub fn received(&self) -> Vec<RecordedRequest> {
        self.received.lock().unwrap().clone()
    }
}

/// Start a mock upstream on an ephemeral loopback port.
pub async fn start_mock_upstream(status: u16, body: &'static str) -> MockUpstream {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = received.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let log = log.clone();
            tokio::spawn(async move {
                handle_connection(socket, status, body, log).await;
            });
        }
    });

    MockUpstream { addr, received }
}

async fn handle_connection(
    mut socket: TcpStream,
    status: u16,
    body: &'static str,
    log: Arc<Mutex<Vec<RecordedRequest>>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let head = String::from_utf8_lossy(&buf).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    log.lock().unwrap().push(RecordedRequest {
        request_line,
        headers,
    });

    let status_text = match status {
        200 => "200 OK",
        404 => "404 Not Found",
        429 => "429 Too Many Requests",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// A loopback port with nothing listening on it.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Proxy config that dials plain HTTP from 127.0.0.1 to the given upstreams.
pub fn loopback_config(stats_host: &str, www_host: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.pool.base_address = Some("127.0.0.1".parse().unwrap());
    config.pool.count = 1;
    config.upstream.scheme = "http".into();
    config.upstream.stats_host = stats_host.into();
    config.upstream.www_host = www_host.into();
    config
}

/// A running proxy. Dropping it leaves the server task to be torn down with
/// the test runtime; call `stop` to exercise graceful shutdown.
pub struct RunningProxy {
    pub addr: SocketAddr,
    shutdown: Shutdown,
    task: tokio::task::JoinHandle<std::io::Result<()>>,
}

impl RunningProxy {
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }

    pub async fn stop(self) -> std::io::Result<()> {
        self.shutdown.trigger();
        self.task.await.unwrap()
    }
}

/// Validate `config`, build the proxy and serve it on an ephemeral port.
pub async fn start_proxy(mut config: ProxyConfig) -> RunningProxy {
    config.listener.host = "127.0.0.1".into();
    let config = loader::finalize(config).unwrap();
    let server = HttpServer::new(config).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    let task = tokio::spawn(server.run(listener, signal));

    RunningProxy {
        addr,
        shutdown,
        task,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

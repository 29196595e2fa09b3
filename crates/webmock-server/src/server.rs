//! HTTP/1 accept loops for the mock plane and the control API.
//!
//! Both listeners share the same loop: accept, spawn one task per
//! connection, and on shutdown stop accepting and give in-flight connections
//! a grace period to finish.

use crate::matcher::{handle_mock_request, Matcher};
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioIo, TokioTimer};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Time allowed for a client to send request headers
pub const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Time in-flight connections get to complete after shutdown is signalled
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Serve HTTP/1 connections from `listener` until `shutdown` fires
pub async fn serve<H, Fut>(
    listener: TcpListener,
    mut shutdown: broadcast::Receiver<()>,
    label: &'static str,
    handler: H,
) -> Result<(), anyhow::Error>
where
    H: Fn(Request<Incoming>) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<Full<Bytes>>, Infallible>> + Send + 'static,
{
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, addr) = match result {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        error!("{} accept error: {}", label, e);
                        continue;
                    }
                };
                let handler = handler.clone();
                let mut conn_shutdown = shutdown.resubscribe();
                connections.spawn(async move {
                    let io = TokioIo::new(stream);
                    let service = service_fn(move |req| handler(req));
                    let mut builder = http1::Builder::new();
                    builder
                        .timer(TokioTimer::new())
                        .header_read_timeout(HEADER_READ_TIMEOUT);
                    let conn = builder.serve_connection(io, service);
                    tokio::pin!(conn);

                    let result = tokio::select! {
                        result = conn.as_mut() => result,
                        _ = conn_shutdown.recv() => {
                            conn.as_mut().graceful_shutdown();
                            conn.as_mut().await
                        }
                    };
                    if let Err(e) = result {
                        debug!("{} connection error from {}: {}", label, addr, e);
                    }
                });
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            _ = shutdown.recv() => {
                info!("{} shutting down", label);
                break;
            }
        }
    }

    drop(listener);
    let drained = tokio::time::timeout(SHUTDOWN_GRACE_PERIOD, async {
        while connections.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!(
            "{}: {} connection(s) still open after grace period, aborting",
            label,
            connections.len()
        );
        connections.shutdown().await;
    }
    Ok(())
}

/// Mock plane: answers every request from the active assertions
pub struct MockServer {
    listener: TcpListener,
    matcher: Arc<Matcher>,
}

impl MockServer {
    /// Bind the mock plane listener
    pub async fn bind(addr: SocketAddr, matcher: Arc<Matcher>) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("failed to bind mock listener on {addr}: {e}"))?;
        Ok(Self { listener, matcher })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until `shutdown` fires
    pub async fn run(self, shutdown: broadcast::Receiver<()>) -> Result<(), anyhow::Error> {
        info!("Mock HTTP server listening on http://{}", self.local_addr()?);
        let matcher = self.matcher;
        serve(self.listener, shutdown, "Mock server", move |req| {
            handle_mock_request(req, Arc::clone(&matcher))
        })
        .await
    }
}

//! Control API server.

use crate::control_api::router::route_request;
use crate::matcher::Matcher;
use crate::server::serve;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::info;

/// Control API server
pub struct ControlApiServer {
    listener: TcpListener,
    matcher: Arc<Matcher>,
}

impl ControlApiServer {
    /// Bind the control API listener
    pub async fn bind(addr: SocketAddr, matcher: Arc<Matcher>) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| anyhow::anyhow!("failed to bind control listener on {addr}: {e}"))?;
        Ok(Self { listener, matcher })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the control API server until `shutdown` fires
    pub async fn run(self, shutdown: broadcast::Receiver<()>) -> Result<(), anyhow::Error> {
        info!("Control API listening on http://{}", self.local_addr()?);
        let matcher = self.matcher;
        serve(self.listener, shutdown, "Control API", move |req| {
            route_request(req, Arc::clone(&matcher))
        })
        .await
    }
}

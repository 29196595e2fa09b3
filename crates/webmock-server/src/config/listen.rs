//! Listener configuration for the control API and the mock plane.

use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};

/// Address a listener binds to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ListenConfig {
    /// Host or IP to bind (empty binds every interface)
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

pub(crate) fn default_host() -> String {
    "0.0.0.0".to_string()
}

impl ListenConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Resolve to a socket address; an empty host means every interface
    pub fn socket_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        let host = if self.host.is_empty() {
            "0.0.0.0"
        } else {
            self.host.as_str()
        };
        (host, self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| anyhow::anyhow!("could not resolve listen address {host}:{}", self.port))
    }
}

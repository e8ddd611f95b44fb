//! Ingress error types

use std::net::SocketAddr;

use thiserror::Error;

/// Socket-plumbing errors
#[derive(Debug, Error)]
pub enum IngressError {
    /// Listener could not be bound (fatal at startup)
    #[error("failed to bind {role} listener on {addr}: {source}")]
    Bind {
        role: &'static str,
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// accept() failed (fatal in this design)
    #[error("failed to accept {role} connection: {source}")]
    Accept {
        role: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// IO error on an established connection
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngressError {
    /// Create a bind error
    pub fn bind(role: &'static str, addr: SocketAddr, source: std::io::Error) -> Self {
        Self::Bind { role, addr, source }
    }

    /// Create an accept error
    pub fn accept(role: &'static str, source: std::io::Error) -> Self {
        Self::Accept { role, source }
    }
}

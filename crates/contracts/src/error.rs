//! Error definitions, layered by source: parse / handshake / sink.

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum RelayError {
    /// Malformed producer line
    #[error("bad event line {line:?}: {message}")]
    EventParse { line: String, message: String },

    /// Malformed first line on a client connection
    #[error("bad client handshake {line:?}: {message}")]
    ClientHandshake { line: String, message: String },

    /// Client socket write failure
    #[error("send to client {user_id} failed: {message}")]
    SinkWrite { user_id: u64, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    /// Create an event parse error
    pub fn event_parse(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EventParse {
            line: line.into(),
            message: message.into(),
        }
    }

    /// Create a client handshake error
    pub fn client_handshake(line: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ClientHandshake {
            line: line.into(),
            message: message.into(),
        }
    }

    /// Create a sink write error
    pub fn sink_write(user_id: u64, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            user_id,
            message: message.into(),
        }
    }
}

//! TcpClientSink - LF-framed writer over a client connection

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;

use contracts::{ClientSink, RelayError, UserId};

/// Write half of a client connection, owned by that client's worker.
pub struct TcpClientSink {
    user_id: UserId,
    writer: OwnedWriteHalf,
}

impl TcpClientSink {
    /// Wrap the write half of an accepted client connection.
    pub fn new(user_id: UserId, writer: OwnedWriteHalf) -> Self {
        Self { user_id, writer }
    }

    fn write_error(&self, e: std::io::Error) -> RelayError {
        RelayError::sink_write(self.user_id, e.to_string())
    }
}

impl ClientSink for TcpClientSink {
    fn user_id(&self) -> UserId {
        self.user_id
    }

    async fn send(&mut self, line: &[u8]) -> Result<(), RelayError> {
        self.writer
            .write_all(line)
            .await
            .map_err(|e| self.write_error(e))?;
        self.writer
            .write_all(b"\n")
            .await
            .map_err(|e| self.write_error(e))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), RelayError> {
        self.writer
            .shutdown()
            .await
            .map_err(|e| self.write_error(e))
    }
}

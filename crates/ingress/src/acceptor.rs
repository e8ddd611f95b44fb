//! Client acceptor: id handshake, registration, disconnect watch.

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, instrument, warn};

use contracts::{RelayError, UserId};
use dispatcher::{ClientHandle, ClientRegistry};

use crate::error::IngressError;
use crate::sink::TcpClientSink;

/// Accept client connections until the listener fails.
///
/// Each connection announces a decimal user id on its first line and is
/// registered in `registry` with a dedicated send worker. The protocol
/// never reads from the client after the handshake. An accept error is
/// fatal and bubbles up to the caller.
#[instrument(name = "client_acceptor", skip_all)]
pub async fn run_client_acceptor(
    listener: TcpListener,
    registry: ClientRegistry,
    queue_capacity: usize,
) -> Result<(), IngressError> {
    let mut next_token: u64 = 1;
    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .map_err(|e| IngressError::accept("client", e))?;
        debug!(%peer, "client connection accepted");

        let registry = registry.clone();
        let token = next_token;
        next_token += 1;
        tokio::spawn(async move {
            handle_client(stream, registry, queue_capacity, token).await;
        });
    }
}

async fn handle_client(
    stream: TcpStream,
    registry: ClientRegistry,
    queue_capacity: usize,
    token: u64,
) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut line = String::new();
    match reader.read_line(&mut line).await {
        Ok(0) => return, // closed before the handshake
        Ok(_) => {}
        Err(e) => {
            debug!(error = %e, "error reading client handshake");
            return;
        }
    }

    let user_id: UserId = match line.trim().parse() {
        Ok(id) => id,
        Err(_) => {
            let err = RelayError::client_handshake(line.trim(), "expected a decimal user id");
            warn!(error = %err, "rejecting client connection");
            let _ = write_half
                .write_all(b"error|expected a decimal user id\n")
                .await;
            return; // dropping both halves closes the connection
        }
    };

    let sink = TcpClientSink::new(user_id, write_half);
    registry.register(ClientHandle::spawn(token, sink, queue_capacity));

    // Keep draining the read half purely to observe EOF; the token guard
    // keeps an old connection's EOF from evicting a replacement.
    watch_for_disconnect(reader.into_inner()).await;
    if registry.forget_token(user_id, token) {
        info!(user_id, "client connection closed");
    }
}

async fn watch_for_disconnect(mut read_half: OwnedReadHalf) {
    let mut scratch = [0u8; 64];
    loop {
        match read_half.read(&mut scratch).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {} // clients only read; anything further is ignored
        }
    }
}

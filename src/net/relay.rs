//! Full-duplex byte relay between two established connections.
//!
//! # Responsibilities
//! - Move bytes in both directions until each side has finished
//! - Propagate half-closes so either peer can finish sending
//!   independently of the other direction
//! - Close both sockets exactly once, after both directions stop
//!
//! # Design Decisions
//! - Each direction is an independent pump; an I/O error stops that pump
//!   only, and the opposite direction drains to completion on its own
//! - Pumps never close a socket; the relay drops both streams after both
//!   pumps return, so neither pump can see a closed descriptor
//! - Reads block indefinitely unless an idle timeout is injected

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

const RELAY_BUF_SIZE: usize = 8192;

/// Bytes moved by a completed relay session, per direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayOutcome {
    pub to_backend: u64,
    pub from_backend: u64,
}

/// Relay bytes between `client` and `backend` until both directions have
/// finished, then release both connections.
pub async fn relay<C, B>(client: C, backend: B, idle_timeout: Option<Duration>) -> RelayOutcome
where
    C: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let (client_read, client_write) = tokio::io::split(client);
    let (backend_read, backend_write) = tokio::io::split(backend);

    let (to_backend, from_backend) = tokio::join!(
        pump(client_read, backend_write, idle_timeout, "client->backend"),
        pump(backend_read, client_write, idle_timeout, "backend->client"),
    );

    // Both pumps have stopped; dropping the halves here closes each
    // connection exactly once.
    RelayOutcome {
        to_backend,
        from_backend,
    }
}

/// Copy one direction until EOF, error, or idle timeout. Returns the
/// number of bytes moved.
async fn pump(
    mut src: impl AsyncRead + Unpin,
    mut dst: impl AsyncWrite + Unpin,
    idle_timeout: Option<Duration>,
    direction: &'static str,
) -> u64 {
    let mut buf = vec![0u8; RELAY_BUF_SIZE];
    let mut total = 0u64;

    loop {
        let read = match idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, src.read(&mut buf)).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(direction, bytes = total, "Relay idle timeout");
                    let _ = dst.shutdown().await;
                    break;
                }
            },
            None => src.read(&mut buf).await,
        };

        match read {
            Ok(0) => {
                // Source finished sending; let the destination know while
                // the opposite direction keeps flowing.
                let _ = dst.shutdown().await;
                debug!(direction, bytes = total, "Relay direction finished");
                break;
            }
            Ok(n) => {
                if let Err(e) = dst.write_all(&buf[..n]).await {
                    debug!(direction, bytes = total, error = %e, "Relay write failed");
                    break;
                }
                total += n as u64;
            }
            Err(e) => {
                debug!(direction, bytes = total, error = %e, "Relay read failed");
                break;
            }
        }
    }

    total
}

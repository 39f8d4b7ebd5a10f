//! Liveness probing.

use std::time::Duration;

use tokio::net::TcpStream;
use tracing::debug;

/// Attempt a bounded-timeout TCP connect to `host:port`.
///
/// The connection is dropped immediately on success; reachability is the
/// only signal taken from it.
pub async fn check(host: &str, port: u16, limit: Duration) -> bool {
    match tokio::time::timeout(limit, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            drop(stream);
            true
        }
        Ok(Err(e)) => {
            debug!(host, port, error = %e, "Probe connect failed");
            false
        }
        Err(_) => {
            debug!(host, port, timeout = ?limit, "Probe timed out");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn reachable_listener_probes_healthy() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(check("127.0.0.1", port, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn closed_port_probes_unhealthy() {
        // bind then drop to find a port that refuses connections
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        assert!(!check("127.0.0.1", port, Duration::from_secs(1)).await);
    }
}

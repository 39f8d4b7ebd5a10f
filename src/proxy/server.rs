//! Accept loop and per-session lifecycle.
//!
//! # Responsibilities
//! - Accept client connections and hand each to a dedicated task
//! - Drive one session through select → connect → relay → release
//! - Keep the registry's session accounting correct on every exit path

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::balancer::{SelectError, Selector};
use crate::config::BalancerConfig;
use crate::net::listener::{Listener, ListenerError, SessionPermit};
use crate::net::relay::relay;
use crate::observability::metrics;
use crate::registry::RegistryStore;

/// Global atomic counter for session IDs.
/// Relaxed ordering is sufficient; only uniqueness matters.
static SESSION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one proxied session, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub fn next() -> Self {
        Self(SESSION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// The balancer process: accepts clients and proxies each to a backend
/// chosen from the shared registry.
pub struct BalancerServer {
    selector: Arc<Selector>,
    connect_timeout: Duration,
    idle_timeout: Option<Duration>,
}

impl BalancerServer {
    /// Build a server over the registry path named in the config.
    pub fn new(config: &BalancerConfig) -> Self {
        let registry = Arc::new(RegistryStore::new(config.registry.path.clone()));
        Self::with_registry(config, registry)
    }

    /// Build a server over an existing registry handle.
    pub fn with_registry(config: &BalancerConfig, registry: Arc<RegistryStore>) -> Self {
        Self {
            selector: Arc::new(Selector::new(config.balancing.strategy, registry)),
            connect_timeout: Duration::from_secs(config.balancing.connect_timeout_secs),
            idle_timeout: config.balancing.idle_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Run the accept loop until the shutdown signal fires.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ListenerError> {
        let server = Arc::new(self);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer, permit)) => {
                            let server = Arc::clone(&server);
                            let id = SessionId::next();
                            tokio::spawn(
                                async move {
                                    server.handle_session(stream, peer, permit).await;
                                }
                                .instrument(tracing::info_span!("session", id = %id, peer = %peer)),
                            );
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Accept error");
                            // Brief sleep to avoid a tight loop on persistent errors
                            tokio::time::sleep(Duration::from_millis(100)).await;
                        }
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Balancer received shutdown signal, exiting accept loop");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Drive one session: Accepted → BackendSelected → Relaying → Closed.
    ///
    /// Every exit path releases the selection exactly once; dropping the
    /// client stream is the only answer an unserved client gets.
    async fn handle_session(&self, client: TcpStream, peer: SocketAddr, permit: SessionPermit) {
        let _permit = permit;

        let selection = match self.selector.select(peer.ip()).await {
            Ok(selection) => selection,
            Err(SelectError::NoBackendsAvailable) => {
                tracing::warn!("No backends available, disconnecting client");
                return;
            }
            Err(SelectError::Registry(e)) => {
                tracing::warn!(error = %e, "Registry unavailable, disconnecting client");
                return;
            }
        };

        tracing::debug!(
            backend = %selection.key,
            host = %selection.host,
            port = selection.port,
            "Backend selected"
        );

        let connect = TcpStream::connect((selection.host.as_str(), selection.port));
        let backend = match tokio::time::timeout(self.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                tracing::warn!(backend = %selection.key, error = %e, "Backend connect failed");
                self.selector.finish(&selection).await;
                return;
            }
            Err(_) => {
                tracing::warn!(backend = %selection.key, "Backend connect timed out");
                self.selector.finish(&selection).await;
                return;
            }
        };

        metrics::record_session_opened(&selection.key);
        let outcome = relay(client, backend, self.idle_timeout).await;
        metrics::record_session_closed(&selection.key, outcome);

        tracing::debug!(
            backend = %selection.key,
            to_backend = outcome.to_backend,
            from_backend = outcome.from_backend,
            "Session finished"
        );
        self.selector.finish(&selection).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::next();
        let b = SessionId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn session_id_display_is_stable() {
        let id = SessionId(7);
        assert_eq!(id.to_string(), "session-7");
    }
}

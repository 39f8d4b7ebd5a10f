//! Backend selection strategies.

use std::net::IpAddr;
use std::sync::Arc;

use tracing::warn;

use crate::balancer::sticky::StickyTable;
use crate::config::SelectionStrategy;
use crate::registry::{RegistryError, RegistryStore};

/// Error type for backend selection.
#[derive(Debug, thiserror::Error)]
pub enum SelectError {
    /// The registry snapshot holds no backends.
    #[error("no backends available")]
    NoBackendsAvailable,
    /// The registry store could not be read; callers treat this the same
    /// as an empty backend set.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// The outcome of one selection: where to connect, and whether the
/// registry's active counter was bumped on the way.
#[derive(Debug, Clone)]
pub struct Selection {
    pub key: String,
    pub host: String,
    pub port: u16,
    /// True when LeastConnections incremented the counter during
    /// selection; `finish` must undo it exactly once.
    counted: bool,
}

impl Selection {
    pub fn counted(&self) -> bool {
        self.counted
    }
}

/// Chooses a backend for each incoming session.
pub struct Selector {
    strategy: SelectionStrategy,
    registry: Arc<RegistryStore>,
    sticky: StickyTable,
}

impl Selector {
    pub fn new(strategy: SelectionStrategy, registry: Arc<RegistryStore>) -> Self {
        Self {
            strategy,
            registry,
            sticky: StickyTable::new(),
        }
    }

    pub fn strategy(&self) -> SelectionStrategy {
        self.strategy
    }

    /// Pick exactly one backend for `client`.
    ///
    /// LeastConnections performs pick-and-increment as a single registry
    /// critical section: two concurrent selections can never both observe
    /// the same momentarily-least-loaded backend.
    pub async fn select(&self, client: IpAddr) -> Result<Selection, SelectError> {
        match self.strategy {
            SelectionStrategy::LeastConnections => {
                let picked = self
                    .registry
                    .with_lock(|snapshot| {
                        // strict less keeps the first-encountered key on ties
                        let mut best: Option<(&str, u64)> = None;
                        for (key, entry) in snapshot.iter() {
                            if best.map_or(true, |(_, min)| entry.active < min) {
                                best = Some((key.as_str(), entry.active));
                            }
                        }
                        let key = best.map(|(key, _)| key.to_string())?;
                        let entry = snapshot.get_mut(&key)?;
                        entry.active += 1;
                        Some((key, entry.host.clone(), entry.port))
                    })
                    .await?;

                let (key, host, port) = picked.ok_or(SelectError::NoBackendsAvailable)?;
                Ok(Selection {
                    key,
                    host,
                    port,
                    counted: true,
                })
            }
            SelectionStrategy::StickyRoundRobin => {
                let snapshot = self.registry.load().await?;
                let key = self
                    .sticky
                    .resolve(client, &snapshot)
                    .ok_or(SelectError::NoBackendsAvailable)?;
                let entry = &snapshot[&key];
                Ok(Selection {
                    host: entry.host.clone(),
                    port: entry.port,
                    key,
                    counted: false,
                })
            }
        }
    }

    /// Release a selection at the end of its session.
    ///
    /// Exactly one call per selection, on every termination path. Only
    /// counted selections touch the registry; a store failure here is
    /// logged and absorbed, since the session is already over.
    pub async fn finish(&self, selection: &Selection) {
        if !selection.counted {
            return;
        }
        if let Err(e) = self.registry.decrement_active(&selection.key).await {
            warn!(backend = %selection.key, error = %e, "Failed to release session count");
        }
    }
}

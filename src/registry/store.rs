//! File-backed backend registry.
//!
//! # Responsibilities
//! - Persist the backend map as JSON readable by independent processes
//! - Serialize all mutations through one critical section
//! - Keep per-backend active-connection counters consistent
//!
//! # Design Decisions
//! - Mutations hold the lock only for the in-memory transform plus the
//!   persistence write; no socket I/O ever happens under it
//! - A missing or malformed file is "registry unavailable", which callers
//!   degrade to an empty backend set rather than a crash
//! - Saves use the write-to-temp + rename pattern for atomicity

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

/// One backend record as persisted in the registry file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendEntry {
    /// Backend host.
    pub host: String,
    /// Backend port.
    pub port: u16,
    /// Number of sessions currently assigned to this backend.
    #[serde(default)]
    pub active: u64,
}

/// A full point-in-time copy of the registry contents.
///
/// BTreeMap keeps iteration order stable, which makes least-connections
/// tie-breaking deterministic.
pub type RegistrySnapshot = BTreeMap<String, BackendEntry>;

/// Error type for registry store operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The store could not be read or written.
    #[error("registry store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// The store exists but does not parse as a registry document.
    #[error("registry store is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Shared, persistent mapping of backend key → backend state.
///
/// One instance exists per process; cross-process sharing happens only
/// through the file itself.
pub struct RegistryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RegistryStore {
    /// Create a store over the given registry file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current snapshot without mutating anything.
    pub async fn load(&self) -> Result<RegistrySnapshot, RegistryError> {
        read_snapshot(&self.path)
    }

    /// Acquire the registry lock, apply `f` to the current contents, and
    /// persist the result before releasing.
    ///
    /// All mutations go through here, so concurrent callers serialize and
    /// never interleave partial updates.
    pub async fn with_lock<T>(
        &self,
        f: impl FnOnce(&mut RegistrySnapshot) -> T,
    ) -> Result<T, RegistryError> {
        let _guard = self.lock.lock().await;
        let mut snapshot = read_snapshot(&self.path)?;
        let out = f(&mut snapshot);
        write_snapshot(&self.path, &snapshot)?;
        Ok(out)
    }

    /// Record one more active session on `key`.
    ///
    /// A missing key is a no-op: the backend may have been removed by the
    /// monitor since it was selected.
    pub async fn increment_active(&self, key: &str) -> Result<(), RegistryError> {
        self.with_lock(|snapshot| {
            if let Some(entry) = snapshot.get_mut(key) {
                entry.active += 1;
            }
        })
        .await
    }

    /// Record the end of a session on `key`.
    ///
    /// Saturates at zero and ignores missing keys, so it is safe on every
    /// termination path.
    pub async fn decrement_active(&self, key: &str) -> Result<(), RegistryError> {
        self.with_lock(|snapshot| {
            if let Some(entry) = snapshot.get_mut(key) {
                entry.active = entry.active.saturating_sub(1);
            }
        })
        .await
    }

    /// Replace the registry contents with the given healthy set.
    ///
    /// Membership comes solely from `healthy`; a key absent from it stops
    /// existing. Active counters of keys that survive the replace are
    /// carried forward so in-flight sessions stay accounted for. An
    /// unreadable previous generation is treated as empty, not an error:
    /// the monitor's view always wins.
    pub async fn replace_healthy(
        &self,
        healthy: BTreeMap<String, (String, u16)>,
    ) -> Result<(), RegistryError> {
        let _guard = self.lock.lock().await;
        let previous = read_snapshot(&self.path).unwrap_or_default();

        let next: RegistrySnapshot = healthy
            .into_iter()
            .map(|(key, (host, port))| {
                let active = previous.get(&key).map(|e| e.active).unwrap_or(0);
                (key, BackendEntry { host, port, active })
            })
            .collect();

        write_snapshot(&self.path, &next)?;
        debug!(path = %self.path.display(), backends = next.len(), "Registry replaced");
        Ok(())
    }
}

fn read_snapshot(path: &Path) -> Result<RegistrySnapshot, RegistryError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_snapshot(path: &Path, snapshot: &RegistrySnapshot) -> Result<(), RegistryError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("tmp");
    let content = serde_json::to_string(snapshot)?;
    fs::write(&tmp_path, content)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

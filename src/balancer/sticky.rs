//! Sticky-session table with round-robin fallback.
//!
//! # Responsibilities
//! - Remember which backend each client identity was assigned to
//! - Hand out round-robin assignments for new or stale clients
//! - Detect staleness by key presence in the current registry snapshot
//!
//! # Design Decisions
//! - The table lives only in the balancer's memory; it is never persisted
//!   or shared with the monitor
//! - Lookups and reassignments for one client go through the map's entry
//!   API, so concurrent first connections from the same client serialize
//! - A cached key is never trusted blindly; validity is re-checked against
//!   a fresh snapshot on every lookup

use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::registry::RegistrySnapshot;

/// Client identity → assigned backend key, plus the shared rotation cursor
/// used for every fresh assignment.
#[derive(Debug, Default)]
pub struct StickyTable {
    assignments: DashMap<IpAddr, String>,
    cursor: AtomicUsize,
}

impl StickyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the backend key for `client` against `snapshot`.
    ///
    /// Reuses the existing assignment while its key is still present;
    /// otherwise assigns the next backend in rotation and records it.
    /// Returns `None` only for an empty snapshot.
    pub fn resolve(&self, client: IpAddr, snapshot: &RegistrySnapshot) -> Option<String> {
        if snapshot.is_empty() {
            return None;
        }

        let key = match self.assignments.entry(client) {
            Entry::Occupied(entry) if snapshot.contains_key(entry.get()) => entry.get().clone(),
            Entry::Occupied(mut entry) => {
                let key = self.next_in_rotation(snapshot);
                entry.insert(key.clone());
                key
            }
            Entry::Vacant(entry) => {
                let key = self.next_in_rotation(snapshot);
                entry.insert(key.clone());
                key
            }
        };
        Some(key)
    }

    /// Number of clients currently assigned.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    fn next_in_rotation(&self, snapshot: &RegistrySnapshot) -> String {
        let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % snapshot.len();
        // snapshot checked non-empty by the caller
        snapshot.keys().nth(idx).cloned().unwrap_or_default()
    }
}

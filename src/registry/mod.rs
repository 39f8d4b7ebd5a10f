//! Shared backend registry subsystem.
//!
//! # Data Flow
//! ```text
//! HealthMonitor ──replace_healthy──▶ registry file ◀──load── Selector
//!                                        ▲
//! Proxy sessions ──increment/decrement───┘
//! ```
//!
//! # Design Decisions
//! - The registry file is the single source of truth, shared between the
//!   balancer and monitor processes; no in-memory caching
//! - Every mutation is a locked read-modify-write followed by an atomic
//!   write (temp file + rename), so readers never see a partial document
//! - Health updates are a generation replace: the monitor publishes the
//!   whole healthy set, and absent keys simply stop existing

pub mod store;

pub use store::{BackendEntry, RegistryError, RegistrySnapshot, RegistryStore};

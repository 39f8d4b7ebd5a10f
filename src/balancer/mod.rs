//! Backend selection subsystem.
//!
//! # Data Flow
//! ```text
//! Session accepted → Selector::select(client ip)
//!     → LeastConnections: locked pick-minimum + increment in the registry
//!     → StickyRoundRobin: sticky table lookup, round-robin fallback
//!     → Selection { key, host, port, counted }
//! Session finished → Selector::finish (decrement when counted)
//! ```
//!
//! # Design Decisions
//! - Strategies are a closed enum; both are known at build time
//! - LeastConnections treats pick-and-increment as one registry critical
//!   section, so concurrent selections never double-book one backend
//! - StickyRoundRobin never reads or writes connection counts

pub mod selector;
pub mod sticky;

pub use selector::{SelectError, Selection, Selector};

//! Proxy orchestration subsystem.
//!
//! # Data Flow
//! ```text
//! Listener accept
//!     → spawn session task
//!     → Selector::select (registry snapshot)
//!     → connect to backend (bounded timeout)
//!     → relay until both directions finish
//!     → Selector::finish (release the session count)
//! ```
//!
//! # Design Decisions
//! - The accept loop never blocks on a session; every accepted connection
//!   runs in its own task
//! - A client that cannot be served is simply disconnected; the balancer
//!   is transport-only and sends no protocol-level explanation
//! - No session error ever terminates the accept loop

pub mod server;

pub use server::BalancerServer;

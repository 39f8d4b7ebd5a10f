//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, session limits)
//!     → Hand off to the proxy layer
//!
//! Established client + backend pair
//!     → relay.rs (two one-directional pumps until both finish)
//! ```
//!
//! # Design Decisions
//! - Bounded listen backlog and a session semaphore prevent resource
//!   exhaustion
//! - The relay owns socket closure; pumps only ever half-close

pub mod listener;
pub mod relay;

//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! SIGTERM/SIGINT → wait_for_signal → Shutdown::trigger
//!     → accept loop stops taking connections
//!     → monitor loop exits after its current cycle
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans the signal out to every long-running task
//! - In-flight sessions finish on their own; nothing forcibly closes them

pub mod shutdown;

pub use shutdown::Shutdown;

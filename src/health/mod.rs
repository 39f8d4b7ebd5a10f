//! Health monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! Probe cycle (monitor.rs):
//!     For each configured backend
//!         → probe.rs (bounded-timeout TCP connect)
//!         → reachable: include in healthy set
//!         → unreachable: recovery.rs (launch restart command)
//!     → registry replace_healthy (one generation publish)
//!     → next interval from MonitorSchedule
//! ```
//!
//! # Design Decisions
//! - Configuration is the ground truth of which backends should exist;
//!   the registry only ever holds the currently-reachable subset
//! - Recovery is fire-and-forget: the outcome is observed by the next
//!   probe cycle, not by waiting on the launched process
//! - The polling interval adapts: short while degraded, long when every
//!   backend is healthy

pub mod monitor;
pub mod probe;
pub mod recovery;

pub use monitor::{CycleReport, HealthMonitor, MonitorSchedule};
pub use recovery::{RestartLauncher, ShellLauncher};

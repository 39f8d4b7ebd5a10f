//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via `tracing`; the subscriber is installed in
//!   `main` with an env-filter defaulting to the configured level
//! - Metric updates are cheap atomic operations and are no-ops until an
//!   exporter is installed, so library code records unconditionally

pub mod metrics;

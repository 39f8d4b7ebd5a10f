//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check value ranges (ports, backlog, intervals)
//! - Detect duplicate backend names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::BalancerConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidBindAddress(String),
    ZeroBacklog,
    NoBackends,
    DuplicateBackend(String),
    InvalidBackend { name: String, reason: String },
    InvalidIntervals { short: u64, long: u64 },
    ZeroProbeTimeout,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(addr) => {
                write!(f, "listener.bind_address is not a socket address: {}", addr)
            }
            ValidationError::ZeroBacklog => write!(f, "listener.backlog must be at least 1"),
            ValidationError::NoBackends => write!(f, "at least one [[backends]] entry is required"),
            ValidationError::DuplicateBackend(name) => {
                write!(f, "duplicate backend name: {}", name)
            }
            ValidationError::InvalidBackend { name, reason } => {
                write!(f, "backend {}: {}", name, reason)
            }
            ValidationError::InvalidIntervals { short, long } => write!(
                f,
                "monitor.short_interval_secs ({}) must not exceed long_interval_secs ({})",
                short, long
            ),
            ValidationError::ZeroProbeTimeout => {
                write!(f, "monitor.probe_timeout_secs must be at least 1")
            }
        }
    }
}

/// Validate a configuration, collecting every semantic error.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.backlog == 0 {
        errors.push(ValidationError::ZeroBacklog);
    }

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }
    let mut seen = HashSet::new();
    for backend in &config.backends {
        if backend.name.is_empty() {
            errors.push(ValidationError::InvalidBackend {
                name: "<unnamed>".to_string(),
                reason: "name must not be empty".to_string(),
            });
        } else if !seen.insert(backend.name.as_str()) {
            errors.push(ValidationError::DuplicateBackend(backend.name.clone()));
        }
        if backend.host.is_empty() {
            errors.push(ValidationError::InvalidBackend {
                name: backend.name.clone(),
                reason: "host must not be empty".to_string(),
            });
        }
        if backend.port == 0 {
            errors.push(ValidationError::InvalidBackend {
                name: backend.name.clone(),
                reason: "port must not be 0".to_string(),
            });
        }
    }

    if config.monitor.short_interval_secs > config.monitor.long_interval_secs {
        errors.push(ValidationError::InvalidIntervals {
            short: config.monitor.short_interval_secs,
            long: config.monitor.long_interval_secs,
        });
    }
    if config.monitor.probe_timeout_secs == 0 {
        errors.push(ValidationError::ZeroProbeTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

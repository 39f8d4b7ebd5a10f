//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer
//! and the health monitor. All types derive Serde traits for deserialization
//! from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration shared by the balancer and monitor processes.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BalancerConfig {
    /// Listener configuration (bind address, backlog).
    pub listener: ListenerConfig,

    /// Registry store configuration.
    pub registry: RegistryConfig,

    /// Backend selection settings.
    pub balancing: BalancingConfig,

    /// Health monitor settings.
    pub monitor: MonitorConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Backend server definitions.
    pub backends: Vec<BackendConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:9000").
    pub bind_address: String,

    /// Listen backlog for pending connections.
    pub backlog: u32,

    /// Maximum concurrent proxied sessions (backpressure).
    pub max_sessions: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9000".to_string(),
            backlog: 5,
            max_sessions: 1024,
        }
    }
}

/// Registry store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Path of the shared registry file.
    pub path: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("active_servers.json"),
        }
    }
}

/// Backend selection strategy.
///
/// Only these two policies exist; both are known at build time, so the
/// strategy is a closed enum rather than a plugin interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Pick the backend with the fewest active connections.
    #[default]
    LeastConnections,
    /// Pin each client to one backend, round-robin for new clients.
    StickyRoundRobin,
}

/// Backend selection settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BalancingConfig {
    /// Selection strategy.
    pub strategy: SelectionStrategy,

    /// Backend connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Optional idle timeout for relay reads in seconds.
    ///
    /// Unset means reads block until the peer sends or closes.
    pub idle_timeout_secs: Option<u64>,
}

impl Default for BalancingConfig {
    fn default() -> Self {
        Self {
            strategy: SelectionStrategy::default(),
            connect_timeout_secs: 2,
            idle_timeout_secs: None,
        }
    }
}

/// Health monitor settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Probe interval while any backend is down, in seconds.
    pub short_interval_secs: u64,

    /// Probe interval while every backend is healthy, in seconds.
    pub long_interval_secs: u64,

    /// Probe connect timeout in seconds.
    pub probe_timeout_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            short_interval_secs: 60,
            long_interval_secs: 300,
            probe_timeout_secs: 2,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Unique backend identifier; doubles as the registry key.
    pub name: String,

    /// Backend host.
    pub host: String,

    /// Backend port.
    pub port: u16,

    /// Command the monitor runs to restart this backend when it is down.
    #[serde(default)]
    pub restart_command: Option<String>,

    /// Working directory for the restart command.
    #[serde(default)]
    pub restart_dir: Option<PathBuf>,
}

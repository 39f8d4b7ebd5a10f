//! Health monitor loop.
//!
//! # Responsibilities
//! - Probe every configured backend each cycle
//! - Publish the reachable set to the registry as one generation
//! - Trigger recovery for unreachable backends
//! - Adapt the polling interval to observed health

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::BalancerConfig;
use crate::health::probe;
use crate::health::recovery::{RestartLauncher, ShellLauncher};
use crate::observability::metrics;
use crate::registry::RegistryStore;

/// The monitor's two-speed polling schedule.
///
/// Recomputed after every cycle, so an interval change always applies to
/// the very next run.
#[derive(Debug, Clone, Copy)]
pub struct MonitorSchedule {
    short: Duration,
    long: Duration,
}

impl MonitorSchedule {
    pub fn new(short: Duration, long: Duration) -> Self {
        Self { short, long }
    }

    /// Interval to sleep before the next cycle.
    pub fn next_interval(&self, all_healthy: bool) -> Duration {
        if all_healthy {
            self.long
        } else {
            self.short
        }
    }
}

/// What one probe cycle observed.
#[derive(Debug, Clone, Copy)]
pub struct CycleReport {
    pub healthy: usize,
    pub configured: usize,
}

impl CycleReport {
    pub fn all_healthy(&self) -> bool {
        self.healthy == self.configured
    }
}

struct ProbeTarget {
    name: String,
    host: String,
    port: u16,
    restart_command: Option<String>,
    restart_dir: Option<PathBuf>,
}

/// Periodically probes configured backends and keeps the registry's
/// health view current.
pub struct HealthMonitor {
    targets: Vec<ProbeTarget>,
    registry: Arc<RegistryStore>,
    launcher: Box<dyn RestartLauncher>,
    schedule: MonitorSchedule,
    probe_timeout: Duration,
}

impl HealthMonitor {
    /// Build a monitor over the registry path named in the config, with
    /// the production shell launcher.
    pub fn new(config: &BalancerConfig) -> Self {
        let registry = Arc::new(RegistryStore::new(config.registry.path.clone()));
        Self::with_parts(config, registry, Box::new(ShellLauncher))
    }

    /// Build a monitor with explicit collaborators.
    pub fn with_parts(
        config: &BalancerConfig,
        registry: Arc<RegistryStore>,
        launcher: Box<dyn RestartLauncher>,
    ) -> Self {
        let targets = config
            .backends
            .iter()
            .map(|backend| ProbeTarget {
                name: backend.name.clone(),
                host: backend.host.clone(),
                port: backend.port,
                restart_command: backend.restart_command.clone(),
                restart_dir: backend.restart_dir.clone(),
            })
            .collect();

        Self {
            targets,
            registry,
            launcher,
            schedule: MonitorSchedule::new(
                Duration::from_secs(config.monitor.short_interval_secs),
                Duration::from_secs(config.monitor.long_interval_secs),
            ),
            probe_timeout: Duration::from_secs(config.monitor.probe_timeout_secs),
        }
    }

    /// Run probe cycles until the shutdown signal fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            backends = self.targets.len(),
            short_interval = ?self.schedule.short,
            long_interval = ?self.schedule.long,
            "Health monitor starting"
        );

        let mut current: Option<Duration> = None;
        loop {
            let report = self.run_cycle().await;
            let next = self.schedule.next_interval(report.all_healthy());
            if current != Some(next) {
                info!(
                    interval = ?next,
                    healthy = report.healthy,
                    configured = report.configured,
                    "Monitor interval set"
                );
                current = Some(next);
            }

            tokio::select! {
                _ = tokio::time::sleep(next) => {}
                _ = shutdown.recv() => {
                    info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every configured backend once and publish the result.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut healthy = BTreeMap::new();

        for target in &self.targets {
            let reachable = probe::check(&target.host, target.port, self.probe_timeout).await;
            metrics::record_backend_health(&target.name, reachable);

            if reachable {
                debug!(backend = %target.name, "Backend reachable");
                healthy.insert(target.name.clone(), (target.host.clone(), target.port));
            } else {
                warn!(
                    backend = %target.name,
                    host = %target.host,
                    port = target.port,
                    "Backend unreachable, triggering recovery"
                );
                match &target.restart_command {
                    Some(command) => {
                        self.launcher
                            .launch(&target.name, command, target.restart_dir.as_deref())
                    }
                    None => warn!(backend = %target.name, "No restart command configured"),
                }
            }
        }

        let report = CycleReport {
            healthy: healthy.len(),
            configured: self.targets.len(),
        };

        if let Err(e) = self.registry.replace_healthy(healthy).await {
            warn!(error = %e, "Failed to publish registry update");
        }

        report
    }
}

//! Integration tests for the health monitor process.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpListener;

use tcp_balancer::config::{BackendConfig, BalancerConfig};
use tcp_balancer::health::{HealthMonitor, MonitorSchedule, RestartLauncher};
use tcp_balancer::lifecycle::Shutdown;
use tcp_balancer::registry::{BackendEntry, RegistrySnapshot, RegistryStore};

mod common;

/// Launcher that records invocations instead of spawning processes.
#[derive(Default)]
struct RecordingLauncher {
    launched: Arc<Mutex<Vec<(String, String)>>>,
}

impl RestartLauncher for RecordingLauncher {
    fn launch(&self, backend: &str, command: &str, _dir: Option<&Path>) {
        self.launched
            .lock()
            .unwrap()
            .push((backend.to_string(), command.to_string()));
    }
}

fn backend_config(name: &str, port: u16, restart_command: Option<&str>) -> BackendConfig {
    BackendConfig {
        name: name.to_string(),
        host: "127.0.0.1".to_string(),
        port,
        restart_command: restart_command.map(str::to_string),
        restart_dir: None,
    }
}

fn monitor_over(
    registry_path: &Path,
    backends: Vec<BackendConfig>,
) -> (HealthMonitor, Arc<Mutex<Vec<(String, String)>>>) {
    let mut config = BalancerConfig::default();
    config.registry.path = registry_path.to_path_buf();
    config.monitor.probe_timeout_secs = 1;
    config.backends = backends;

    let launcher = RecordingLauncher::default();
    let launched = Arc::clone(&launcher.launched);
    let registry = Arc::new(RegistryStore::new(registry_path.to_path_buf()));
    let monitor = HealthMonitor::with_parts(&config, registry, Box::new(launcher));
    (monitor, launched)
}

#[tokio::test]
async fn cycle_publishes_reachable_and_recovers_unreachable() {
    let live = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let live_port = live.local_addr().unwrap().port();

    let doomed = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_port = doomed.local_addr().unwrap().port();
    drop(doomed);

    let registry = common::temp_registry_path("cycle");
    let (monitor, launched) = monitor_over(
        &registry,
        vec![
            backend_config("alpha", live_port, Some("./restart-alpha.sh")),
            backend_config("beta", dead_port, Some("./restart-beta.sh")),
        ],
    );

    let report = monitor.run_cycle().await;
    assert_eq!(report.healthy, 1);
    assert_eq!(report.configured, 2);
    assert!(!report.all_healthy());

    let snapshot = RegistryStore::new(registry.clone()).load().await.unwrap();
    assert!(snapshot.contains_key("alpha"));
    assert!(!snapshot.contains_key("beta"));
    assert_eq!(snapshot["alpha"].port, live_port);

    let recorded = launched.lock().unwrap().clone();
    assert_eq!(recorded, vec![("beta".to_string(), "./restart-beta.sh".to_string())]);

    let _ = std::fs::remove_file(&registry);
}

#[tokio::test]
async fn interval_follows_observed_health_across_cycles() {
    let live = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = live.local_addr().unwrap();

    let registry = common::temp_registry_path("interval");
    let (monitor, _) = monitor_over(
        &registry,
        vec![backend_config("alpha", addr.port(), None)],
    );
    let schedule = MonitorSchedule::new(Duration::from_secs(60), Duration::from_secs(300));

    // healthy: next cycle uses the long interval
    let report = monitor.run_cycle().await;
    assert!(report.all_healthy());
    assert_eq!(schedule.next_interval(report.all_healthy()), Duration::from_secs(300));

    // backend goes down: next cycle uses the short interval
    drop(live);
    let report = monitor.run_cycle().await;
    assert!(!report.all_healthy());
    assert_eq!(schedule.next_interval(report.all_healthy()), Duration::from_secs(60));

    // backend recovers on the same port: back to the long interval
    let _revived = common::bind_reusable(addr);
    let report = monitor.run_cycle().await;
    assert!(report.all_healthy());
    assert_eq!(schedule.next_interval(report.all_healthy()), Duration::from_secs(300));

    let _ = std::fs::remove_file(&registry);
}

#[tokio::test]
async fn replace_preserves_counts_for_surviving_backends() {
    let live = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let live_port = live.local_addr().unwrap().port();

    let registry = common::temp_registry_path("preserve");
    let mut seeded = RegistrySnapshot::new();
    seeded.insert(
        "alpha".to_string(),
        BackendEntry {
            host: "127.0.0.1".to_string(),
            port: live_port,
            active: 2,
        },
    );
    std::fs::write(&registry, serde_json::to_string(&seeded).unwrap()).unwrap();

    let (monitor, _) = monitor_over(
        &registry,
        vec![backend_config("alpha", live_port, None)],
    );
    monitor.run_cycle().await;

    let snapshot = RegistryStore::new(registry.clone()).load().await.unwrap();
    assert_eq!(snapshot["alpha"].active, 2);

    let _ = std::fs::remove_file(&registry);
}

#[tokio::test]
async fn unreachable_backend_without_command_is_only_excluded() {
    let doomed = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_port = doomed.local_addr().unwrap().port();
    drop(doomed);

    let registry = common::temp_registry_path("no-command");
    let (monitor, launched) = monitor_over(
        &registry,
        vec![backend_config("alpha", dead_port, None)],
    );

    let report = monitor.run_cycle().await;
    assert_eq!(report.healthy, 0);
    assert!(launched.lock().unwrap().is_empty());

    let snapshot = RegistryStore::new(registry.clone()).load().await.unwrap();
    assert!(snapshot.is_empty());

    let _ = std::fs::remove_file(&registry);
}

#[tokio::test]
async fn run_loop_publishes_immediately_and_honors_shutdown() {
    let live = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let live_port = live.local_addr().unwrap().port();

    let registry = common::temp_registry_path("run-loop");
    let (monitor, _) = monitor_over(
        &registry,
        vec![backend_config("alpha", live_port, None)],
    );

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(monitor.run(rx));

    // the first cycle runs without waiting for a full interval
    common::wait_for_registry(&registry, |snapshot| snapshot.contains_key("alpha")).await;

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("monitor did not stop on shutdown")
        .unwrap();

    let _ = std::fs::remove_file(&registry);
}

//! Backend recovery actions.
//!
//! # Responsibilities
//! - Launch a backend's restart command when a probe finds it down
//! - Stay fire-and-forget: exit codes and output are not acted on

use std::path::Path;

use tokio::process::Command;
use tracing::{error, info};

/// Launches recovery commands for unreachable backends.
///
/// The monitor never waits on the launched process; the next probe cycle
/// is the only verification that recovery worked.
pub trait RestartLauncher: Send + Sync {
    fn launch(&self, backend: &str, command: &str, dir: Option<&Path>);
}

/// Production launcher: runs the command through `sh -c`, detached.
pub struct ShellLauncher;

impl RestartLauncher for ShellLauncher {
    fn launch(&self, backend: &str, command: &str, dir: Option<&Path>) {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }

        match cmd.spawn() {
            Ok(mut child) => {
                info!(backend, command, "Restart command launched");
                // reap the child so it never lingers as a zombie; the
                // status itself is not inspected
                tokio::spawn(async move {
                    let _ = child.wait().await;
                });
            }
            Err(e) => {
                error!(backend, command, error = %e, "Failed to launch restart command");
            }
        }
    }
}

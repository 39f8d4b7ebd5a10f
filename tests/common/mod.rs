//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket};

use tcp_balancer::registry::{RegistrySnapshot, RegistryStore};

/// Start a mock backend that echoes every byte back until the client
/// stops sending, then half-closes its side.
#[allow(dead_code)]
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 4096];
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => {
                                    if socket.write_all(&buf[..n]).await.is_err() {
                                        break;
                                    }
                                }
                            }
                        }
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a mock backend that greets each connection with `tag`, then
/// holds the connection open until the client closes it.
#[allow(dead_code)]
pub async fn start_tagged_backend(tag: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        if socket.write_all(tag.as_bytes()).await.is_err() {
                            return;
                        }
                        let mut buf = vec![0u8; 1024];
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(_) => {}
                            }
                        }
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Bind a listener with SO_REUSEADDR so a test can revive a backend on
/// the exact port it previously occupied.
#[allow(dead_code)]
pub fn bind_reusable(addr: SocketAddr) -> TcpListener {
    let socket = TcpSocket::new_v4().unwrap();
    socket.set_reuseaddr(true).unwrap();
    socket.bind(addr).unwrap();
    socket.listen(16).unwrap()
}

/// Registry file path in the temp dir, unique per test.
pub fn temp_registry_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "tcp-balancer-it-{}-{}.json",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    path
}

/// Publish `backends` to the registry file as a fresh healthy set.
#[allow(dead_code)]
pub async fn seed_registry(path: &PathBuf, backends: &[(&str, SocketAddr)]) {
    let store = RegistryStore::new(path.clone());
    let healthy = backends
        .iter()
        .map(|(key, addr)| (key.to_string(), (addr.ip().to_string(), addr.port())))
        .collect();
    store.replace_healthy(healthy).await.unwrap();
}

/// Poll the registry until `pred` holds, panicking after five seconds.
#[allow(dead_code)]
pub async fn wait_for_registry(path: &PathBuf, pred: impl Fn(&RegistrySnapshot) -> bool) {
    let store = RegistryStore::new(path.clone());
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(snapshot) = store.load().await {
            if pred(&snapshot) {
                return;
            }
        }
        if tokio::time::Instant::now() > deadline {
            panic!("registry at {} never reached the expected state", path.display());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

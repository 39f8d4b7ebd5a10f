//! TCP connection load balancer with a health-driven backend registry.

pub mod balancer;
pub mod config;
pub mod health;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;
pub mod registry;

pub use config::BalancerConfig;
pub use lifecycle::Shutdown;
pub use proxy::BalancerServer;

pub mod cluster;
pub mod config;
pub mod pinning_service;
pub mod provider;
pub mod types;
pub mod url;

pub use cluster::ClusterClient;
pub use config::{ApiDialect, Protocol, ServiceConfig};
pub use pinning_service::IpfsPinningClient;
pub use provider::{CreateOptions, PinItem, PinningApi};
pub use types::*;

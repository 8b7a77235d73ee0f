//! Open Service Broker router: hosts several services behind one broker
//! endpoint and routes each protocol request to the service that owns it.

pub mod config;
pub mod network;
pub mod observability;
pub mod service;

pub use config::BrokerArgs;
pub use network::{BrokerServer, NetworkConfig};
pub use service::{BrokerRouter, RegistryError, ServiceRegistry};

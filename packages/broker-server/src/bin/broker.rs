//! `osb-broker`: serves the bundled services over the OSB v2 HTTP API.

use broker_server::observability::{init_tracing, install_metrics_exporter};
use broker_server::service::domain::CatService;
use broker_server::{BrokerArgs, BrokerRouter, BrokerServer, ServiceRegistry};
use clap::Parser;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = BrokerArgs::parse();
    init_tracing(args.log_format)?;
    if let Some(addr) = args.metrics_addr {
        install_metrics_exporter(addr)?;
    }

    let config = args.network_config()?;
    if config.credentials.is_none() {
        warn!("no broker credentials configured, /v2 routes are unauthenticated");
    }

    let mut registry = ServiceRegistry::new();
    registry.register(CatService::new())?;
    info!(services = registry.len(), "service registry ready");

    let mut server = BrokerServer::new(config, BrokerRouter::new(registry));
    let port = server.start().await?;
    info!(port, "osb-broker listening");

    server
        .serve(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "failed to listen for ctrl-c");
            }
        })
        .await
}

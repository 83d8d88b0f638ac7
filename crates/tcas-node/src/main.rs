//! TCAS node - one aircraft on the shared channel

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tcas_core::TcasRules;
use tcas_node::{Config, NatsTransport, TcasNode};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("tcas_node=debug".parse()?))
        .init();

    tracing::info!("Starting TCAS node...");

    let config = Config::from_env();
    let client_name = format!("tcas-node-{}", config.aircraft_id);

    let transport = match NatsTransport::connect(&config.nats_url, &client_name).await {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            tracing::error!("Cannot reach message bus: {}", e);
            return Err(e.into());
        }
    };

    let ownship = config.sim.build();
    let (node, mut snapshots) =
        match TcasNode::start(&config, TcasRules::default(), transport, ownship).await {
            Ok(started) => started,
            Err(e) => {
                tracing::error!("TCAS node failed to start: {}", e);
                return Err(e.into());
            }
        };

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(node.run(shutdown_rx));

    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            if let Some(kind) = snapshot.most_severe {
                tracing::info!(
                    "{:?}: {} tracks, aural {}",
                    kind,
                    snapshot.tracks.len(),
                    if snapshot.aural_suppressed { "off" } else { "on" }
                );
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Interrupt received");
    let _ = shutdown_tx.send(());

    handle.await??;
    Ok(())
}

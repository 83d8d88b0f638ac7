//! Run a two-aircraft encounter on the in-process bus.
//!
//! Each aircraft is a full TCAS node with a simulated ownship. The traffic
//! picture of every aircraft is printed once per second.

use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tcas_core::geo::METERS_TO_NM;
use tcas_core::{Advisory, AdvisoryKind, TcasRules};
use tcas_node::{Config, MemoryBus, TcasNode, TrafficSnapshot};
use tokio::sync::{broadcast, watch};
use tokio::time;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Fly two simulated aircraft into each other and watch the advisories
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Scenario: head-on, crossing, parallel
    #[arg(long, default_value = "head-on")]
    scenario: String,

    /// Encounter center latitude
    #[arg(long, default_value_t = 53.8036111)]
    lat: f64,

    /// Encounter center longitude
    #[arg(long, default_value_t = 10.7148917)]
    lon: f64,

    /// Duration in seconds
    #[arg(long, default_value_t = 40)]
    duration: u64,

    /// Tick period in milliseconds
    #[arg(long, default_value_t = 1000)]
    tick_ms: u64,
}

fn describe(advisory: &Advisory) -> String {
    match (advisory.kind, advisory.alert) {
        (AdvisoryKind::Ra, Some(sense)) => format!(
            "RA {} [{:.0}, {:.0}] ft/min{}",
            sense,
            advisory.min_vertical_speed_fpm,
            advisory.max_vertical_speed_fpm,
            if advisory.is_accepted { " (coordinated)" } else { "" }
        ),
        (AdvisoryKind::Ra, None) => "RA".to_string(),
        (AdvisoryKind::Ta, _) => "TRAFFIC, TRAFFIC".to_string(),
        (AdvisoryKind::ClearOfConflict, _) => "CLEAR OF CONFLICT".to_string(),
    }
}

fn print_picture(id: &str, snapshot: &TrafficSnapshot) {
    let own = &snapshot.own;
    println!(
        "[{:>5.1}s] {} alt {:.0} ft vs {:.0} ft/min hdg {:.0}",
        snapshot.time_s, id, own.altitude_ft, own.vertical_speed_fpm, own.heading_deg
    );
    for view in &snapshot.tracks {
        println!(
            "          {} {:?} {:.2} NM brg {:.0} vsep {:+.0} ft {}",
            view.id,
            view.category,
            view.distance_m * METERS_TO_NM,
            view.bearing_deg,
            -view.vertical_separation_ft,
            view.advisory.as_ref().map(describe).unwrap_or_default()
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("tcas_cli=info".parse()?)
            .add_directive("demo_encounter=info".parse()?))
        .init();

    let args = Args::parse();

    let Some(encounter) = tcas_cli::by_name(&args.scenario, args.lat, args.lon) else {
        anyhow::bail!("unknown scenario: {}", args.scenario);
    };

    println!("Running {} encounter for {}s", encounter.name, args.duration);
    println!("  Center: ({}, {})", args.lat, args.lon);
    println!();

    let bus = MemoryBus::default();
    let (shutdown_tx, _) = broadcast::channel(1);
    let mut pictures: Vec<(String, watch::Receiver<TrafficSnapshot>)> = Vec::new();
    let mut handles = Vec::new();

    for (id, start) in &encounter.aircraft {
        let mut config = Config::local(id.clone(), *start);
        config.tick = Duration::from_millis(args.tick_ms.max(1));
        let (node, snapshots) = TcasNode::start(
            &config,
            TcasRules::default(),
            Arc::new(bus.endpoint()),
            start.build(),
        )
        .await?;
        handles.push(tokio::spawn(node.run(shutdown_tx.subscribe())));
        pictures.push((id.clone(), snapshots));
    }

    let mut ticker = time::interval(Duration::from_secs(1));
    let deadline = time::Instant::now() + Duration::from_secs(args.duration);

    while time::Instant::now() < deadline {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Interrupted");
                break;
            }
            _ = ticker.tick() => {
                for (id, snapshots) in &pictures {
                    let snapshot = snapshots.borrow().clone();
                    print_picture(id, &snapshot);
                }
                println!();
            }
        }
    }

    let _ = shutdown_tx.send(());
    for handle in handles {
        handle.await??;
    }

    tracing::info!("Encounter finished");
    Ok(())
}

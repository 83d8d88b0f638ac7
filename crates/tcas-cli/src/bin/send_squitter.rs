//! CLI tool to inject a fixed squitter onto the TCAS channel.
//!
//! Useful for exercising a running node against a stationary fake intruder.

use clap::Parser;
use std::time::Duration;
use tcas_core::{Message, Payload, SquitterData};
use tcas_node::{NatsTransport, Transport};
use tokio::time;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Publish a fixed squitter for a fake aircraft
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// NATS server URL
    #[arg(long, default_value = "nats://localhost:4222")]
    url: String,

    /// Channel root
    #[arg(long, default_value = "tcas")]
    channel: String,

    /// Sender identifier
    #[arg(long, default_value = "ef542760-4715-40b1-abc4-349b881ef7c2")]
    address: String,

    /// Altitude in feet
    #[arg(long, default_value_t = 5400.0)]
    alt: f64,

    #[arg(long, default_value_t = 53.805747173744344)]
    lat: f64,

    #[arg(long, default_value_t = 10.714933253660258)]
    lon: f64,

    /// Vertical speed in ft/min
    #[arg(long, default_value_t = 0.0)]
    vs: f64,

    /// Ground speed in knots
    #[arg(long, default_value_t = 140.0)]
    gs: f64,

    /// Heading in degrees, omitted from the squitter when not set
    #[arg(long)]
    hdg: Option<f64>,

    /// Send LONG_SQUITTER instead of SHORT_SQUITTER
    #[arg(long)]
    long: bool,

    /// Interval between squitters in milliseconds
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,

    /// Stop after this many squitters (0 = until interrupted)
    #[arg(long, default_value_t = 0)]
    count: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("tcas_cli=info".parse()?)
            .add_directive("send_squitter=info".parse()?)
            .add_directive("tcas_node=info".parse()?))
        .init();

    let args = Args::parse();

    let data = SquitterData {
        alt: args.alt,
        lat: args.lat,
        long: args.lon,
        vs: args.vs,
        gs: args.gs,
        hdg: args.hdg,
    };
    let payload = if args.long {
        Payload::LongSquitter(data)
    } else {
        Payload::ShortSquitter(data)
    };
    let msg = Message::broadcast(&args.address, payload);
    let topic = msg.topic(&args.channel);
    let bytes = msg.to_bytes()?;

    println!("Connecting to NATS at {}...", args.url);
    let transport = NatsTransport::connect(&args.url, "tcas-send-squitter").await?;

    println!("Sending {:?} as {} on {}", msg.kind(), args.address, topic);
    println!("  Position: ({}, {}) at {} ft", args.lat, args.lon, args.alt);
    println!("  Interval: {} ms", args.interval_ms);
    println!();

    let mut ticker = time::interval(Duration::from_millis(args.interval_ms.max(1)));
    let mut sent = 0u64;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Interrupted");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = transport.publish(&topic, bytes.clone()).await {
                    tracing::warn!("Publish failed: {}", e);
                }
                sent += 1;
                if args.count > 0 && sent >= args.count {
                    break;
                }
            }
        }
    }

    transport.disconnect().await?;
    println!("Sent {} squitters", sent);
    Ok(())
}

//! Aircraft node loop.
//!
//! One task owns the registry and the ownship source. It selects over the
//! shutdown signal, the squitter ticker and inbound frames, so each frame is
//! fully processed before the next event is observed.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::config::Config;
use crate::error::NodeError;
use crate::transport::{Inbound, Transport};
use tcas_core::{
    AdvisoryKind, Message, OwnshipSource, OwnshipState, Registry, TcasRules, TrackView,
};

/// Traffic picture published after every tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrafficSnapshot {
    /// Seconds since the node started
    pub time_s: f64,
    pub own: OwnshipState,
    pub tracks: Vec<TrackView>,
    pub most_severe: Option<AdvisoryKind>,
    /// Aural alerts are suppressed close to the ground
    pub aural_suppressed: bool,
}

impl TrafficSnapshot {
    pub fn track(&self, id: &str) -> Option<&TrackView> {
        self.tracks.iter().find(|view| view.id == id)
    }
}

pub struct TcasNode<T, O> {
    registry: Registry,
    transport: Arc<T>,
    ownship: O,
    channel: String,
    tick: Duration,
    inbound: mpsc::Receiver<Inbound>,
    snapshots: watch::Sender<TrafficSnapshot>,
    started: Instant,
}

impl<T, O> TcasNode<T, O>
where
    T: Transport + 'static,
    O: OwnshipSource,
{
    /// Connect the ownship source and subscribe to the channel.
    ///
    /// Either failure is fatal; there is no reconnect.
    pub async fn start(
        config: &Config,
        rules: TcasRules,
        transport: Arc<T>,
        mut ownship: O,
    ) -> Result<(Self, watch::Receiver<TrafficSnapshot>), NodeError> {
        ownship.connect()?;

        let (tx, inbound) = mpsc::channel(config.inbound_capacity.max(1));
        transport.subscribe(&config.channel, tx).await?;

        let (snapshots, snapshot_rx) = watch::channel(TrafficSnapshot {
            own: ownship.snapshot(),
            ..TrafficSnapshot::default()
        });

        tracing::info!(
            "TCAS node {} started on channel {}",
            config.aircraft_id,
            config.channel
        );

        let node = Self {
            registry: Registry::new(config.aircraft_id.clone(), rules),
            transport,
            ownship,
            channel: config.channel.clone(),
            tick: config.tick,
            inbound,
            snapshots,
            started: Instant::now(),
        };
        Ok((node, snapshot_rx))
    }

    pub fn id(&self) -> &str {
        self.registry.own_id()
    }

    /// Run until shutdown is signalled or the inbound channel closes.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<(), NodeError> {
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("TCAS node {} shutting down", self.id());
                    break;
                }
                _ = ticker.tick() => {
                    self.on_tick().await;
                }
                frame = self.inbound.recv() => match frame {
                    Some(frame) => self.on_frame(frame).await,
                    None => {
                        tracing::warn!("Inbound channel closed");
                        break;
                    }
                }
            }
        }

        self.transport.disconnect().await?;
        Ok(())
    }

    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    async fn on_tick(&mut self) {
        let now = self.now();
        if let Err(e) = self.ownship.update(now) {
            tracing::warn!("Ownship update failed, keeping last state: {}", e);
        }
        let own = self.ownship.snapshot();
        tracing::debug!(
            alt_ft = own.altitude_ft,
            agl_ft = own.altitude_agl_ft,
            lat = own.lat,
            lon = own.lon,
            vs_fpm = own.vertical_speed_fpm,
            gs_kt = own.ground_speed_kt,
            hdg_deg = own.heading_deg,
            tracks = self.registry.len(),
            "Own state"
        );

        let squitter = self.registry.own_squitter(&own);
        self.publish(&squitter).await;

        self.registry.sweep_timeouts(now);
        for interrogation in self.registry.interrogations(now) {
            self.publish(&interrogation).await;
        }

        let inhibitions = self.registry.rules().inhibitions(&own);
        self.snapshots.send_replace(TrafficSnapshot {
            time_s: now,
            own,
            tracks: self.registry.views(now),
            most_severe: self.registry.most_severe_advisory(),
            aural_suppressed: inhibitions.ta_aural,
        });
        self.registry.consume_clear_of_conflict();
    }

    async fn on_frame(&mut self, frame: Inbound) {
        let msg = match Message::from_slice(&frame.payload) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!("Dropping frame on {}: {}", frame.topic, e);
                return;
            }
        };

        let own = self.ownship.snapshot();
        let now = self.now();
        for reply in self.registry.handle_message(&msg, &own, now) {
            self.publish(&reply).await;
        }
    }

    async fn publish(&self, msg: &Message) {
        let payload = match msg.to_bytes() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Failed to encode {:?}: {}", msg.kind(), e);
                return;
            }
        };
        let topic = msg.topic(&self.channel);
        if let Err(e) = self.transport.publish(&topic, payload).await {
            tracing::warn!("Dropped {:?} publish: {}", msg.kind(), e);
        }
    }
}

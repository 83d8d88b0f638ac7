//! Node configuration from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;
use tcas_core::KinematicSimulator;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Config {
    pub nats_url: String,
    /// Channel root; every aircraft publishes on `<channel>/<id>`
    pub channel: String,
    pub aircraft_id: String,
    pub tick: Duration,
    pub inbound_capacity: usize,
    pub sim: SimulatorStart,
}

/// Start state for the built-in kinematic simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatorStart {
    pub altitude_ft: f64,
    pub lat: f64,
    pub lon: f64,
    pub vertical_speed_fpm: f64,
    pub ground_speed_kt: f64,
    pub heading_deg: f64,
    pub ground_elevation_ft: f64,
}

impl Default for SimulatorStart {
    fn default() -> Self {
        Self {
            altitude_ft: 15_000.0,
            lat: 53.8036111,
            lon: 10.7148917,
            vertical_speed_fpm: 200.0,
            ground_speed_kt: 200.0,
            heading_deg: 270.0,
            ground_elevation_ft: 0.0,
        }
    }
}

impl SimulatorStart {
    pub fn build(&self) -> KinematicSimulator {
        KinematicSimulator::new(
            self.altitude_ft,
            self.lat,
            self.lon,
            self.vertical_speed_fpm,
            self.ground_speed_kt,
            self.heading_deg,
        )
        .with_ground_elevation(self.ground_elevation_ft)
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nats_url: "nats://localhost:4222".to_string(),
            channel: "tcas".to_string(),
            aircraft_id: Uuid::new_v4().to_string(),
            tick: Duration::from_millis(1000),
            inbound_capacity: 256,
            sim: SimulatorStart::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let sim = defaults.sim;
        Self {
            nats_url: env::var("TCAS_NATS_URL").unwrap_or(defaults.nats_url),
            channel: env::var("TCAS_CHANNEL").unwrap_or(defaults.channel),
            aircraft_id: env::var("TCAS_AIRCRAFT_ID").unwrap_or(defaults.aircraft_id),
            tick: Duration::from_millis(parse_or("TCAS_TICK_MS", 1000u64).max(1)),
            inbound_capacity: parse_or("TCAS_INBOUND_CAPACITY", defaults.inbound_capacity).max(1),
            sim: SimulatorStart {
                altitude_ft: parse_or("TCAS_SIM_ALT_FT", sim.altitude_ft),
                lat: parse_or("TCAS_SIM_LAT", sim.lat),
                lon: parse_or("TCAS_SIM_LON", sim.lon),
                vertical_speed_fpm: parse_or("TCAS_SIM_VS_FPM", sim.vertical_speed_fpm),
                ground_speed_kt: parse_or("TCAS_SIM_GS_KT", sim.ground_speed_kt),
                heading_deg: parse_or("TCAS_SIM_HDG_DEG", sim.heading_deg),
                ground_elevation_ft: parse_or("TCAS_SIM_GROUND_FT", sim.ground_elevation_ft),
            },
        }
    }

    /// Config for an in-process node with a fixed id, as used by tests and demos.
    pub fn local(aircraft_id: impl Into<String>, sim: SimulatorStart) -> Self {
        Self {
            aircraft_id: aircraft_id.into(),
            sim,
            ..Self::default()
        }
    }
}

//! Own-aircraft data sources.

use crate::geo::{offset_by_bearing, KNOTS_TO_MPS};
use crate::models::OwnshipState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OwnshipError {
    #[error("ownship data source unavailable: {0}")]
    Unavailable(String),
}

/// Supplies own position and kinematics once per cycle.
pub trait OwnshipSource: Send {
    /// Open the underlying data source. Failure is fatal to the session.
    fn connect(&mut self) -> Result<(), OwnshipError> {
        Ok(())
    }

    /// Refresh the state. `now_s` is the caller's monotonic clock in seconds.
    fn update(&mut self, now_s: f64) -> Result<(), OwnshipError>;

    /// Latest state.
    fn snapshot(&self) -> OwnshipState;
}

/// Deterministic dead-reckoning simulator.
///
/// Holds vertical speed, ground speed and heading constant and integrates
/// altitude and position between updates.
#[derive(Debug, Clone)]
pub struct KinematicSimulator {
    state: OwnshipState,
    ground_elevation_ft: f64,
    last_update_s: Option<f64>,
}

impl KinematicSimulator {
    /// Create a simulator at the given start state.
    ///
    /// # Arguments
    /// * `altitude_ft` - Altitude in feet MSL
    /// * `lat`, `lon` - Position in degrees
    /// * `vertical_speed_fpm` - Vertical speed in ft/min
    /// * `ground_speed_kt` - Ground speed in knots
    /// * `heading_deg` - True heading in degrees
    pub fn new(
        altitude_ft: f64,
        lat: f64,
        lon: f64,
        vertical_speed_fpm: f64,
        ground_speed_kt: f64,
        heading_deg: f64,
    ) -> Self {
        let mut sim = Self {
            state: OwnshipState {
                altitude_ft,
                altitude_agl_ft: altitude_ft,
                lat,
                lon,
                ground_speed_kt,
                vertical_speed_fpm,
                heading_deg,
            },
            ground_elevation_ft: 0.0,
            last_update_s: None,
        };
        sim.refresh_agl();
        sim
    }

    /// Set terrain elevation under the aircraft (ft MSL).
    pub fn with_ground_elevation(mut self, ground_elevation_ft: f64) -> Self {
        self.ground_elevation_ft = ground_elevation_ft;
        self.refresh_agl();
        self
    }

    /// Advance the simulation by `dt_s` seconds.
    pub fn advance(&mut self, dt_s: f64) {
        if dt_s <= 0.0 {
            return;
        }
        self.state.altitude_ft += self.state.vertical_speed_fpm * dt_s / 60.0;

        let distance_m = self.state.ground_speed_kt * KNOTS_TO_MPS * dt_s;
        let (lat, lon) = offset_by_bearing(
            self.state.lat,
            self.state.lon,
            distance_m,
            self.state.heading_deg.to_radians(),
        );
        self.state.lat = lat;
        self.state.lon = lon;
        self.refresh_agl();
    }

    fn refresh_agl(&mut self) {
        self.state.altitude_agl_ft = self.state.altitude_ft - self.ground_elevation_ft;
    }
}

impl OwnshipSource for KinematicSimulator {
    fn update(&mut self, now_s: f64) -> Result<(), OwnshipError> {
        if let Some(last) = self.last_update_s {
            self.advance(now_s - last);
        }
        self.last_update_s = Some(now_s);
        Ok(())
    }

    fn snapshot(&self) -> OwnshipState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::haversine_distance;

    #[test]
    fn test_first_update_does_not_move() {
        let mut sim = KinematicSimulator::new(15_000.0, 53.8, 10.7, 600.0, 200.0, 270.0);
        sim.update(100.0).unwrap();
        let state = sim.snapshot();
        assert_eq!(state.altitude_ft, 15_000.0);
        assert_eq!((state.lat, state.lon), (53.8, 10.7));
    }

    #[test]
    fn test_integrates_altitude_and_position() {
        let mut sim = KinematicSimulator::new(15_000.0, 53.8, 10.7, 600.0, 200.0, 90.0);
        sim.update(0.0).unwrap();
        sim.update(10.0).unwrap();
        let state = sim.snapshot();
        assert!((state.altitude_ft - 15_100.0).abs() < 1e-9);
        let moved = haversine_distance(53.8, 10.7, state.lat, state.lon);
        assert!((moved - 200.0 * KNOTS_TO_MPS * 10.0).abs() < 0.5);
        assert!(state.lon > 10.7);
    }

    #[test]
    fn test_agl_follows_ground_elevation() {
        let sim = KinematicSimulator::new(3_000.0, 0.0, 0.0, 0.0, 0.0, 0.0)
            .with_ground_elevation(1_200.0);
        assert_eq!(sim.snapshot().altitude_agl_ft, 1_800.0);
    }

    #[test]
    fn test_simulator_always_connects() {
        let mut sim = KinematicSimulator::new(1_000.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        assert!(sim.connect().is_ok());
    }
}

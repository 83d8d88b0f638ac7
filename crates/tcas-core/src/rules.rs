//! Range limits, timeouts and inhibition altitudes.

use crate::geo::NM_TO_METERS;
use crate::models::OwnshipState;
use serde::{Deserialize, Serialize};

/// Configuration for tracking and advisory rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcasRules {
    /// Tracks farther than this are dropped (meters)
    pub max_distance_m: f64,
    /// Tracks with a larger vertical separation are dropped (feet)
    pub max_vertical_separation_ft: f64,
    /// Horizontal limit for PROXIMATE traffic (meters)
    pub proximate_distance_m: f64,
    /// Vertical limit for PROXIMATE traffic (feet)
    pub proximate_vertical_ft: f64,
    /// Tracks not heard from for longer than this are removed (seconds)
    pub aircraft_timeout_secs: f64,
    /// Quiet tracks older than this are interrogated (seconds)
    pub interrogation_after_secs: f64,
    /// Vertical-speed search bounds and step (ft/min)
    pub vs_min_fpm: i32,
    pub vs_max_fpm: i32,
    pub vs_step_fpm: i32,
    /// Climb RAs are inhibited above this own altitude (ft MSL)
    pub climb_inhibit_altitude_ft: f64,
    /// Increase-descent RAs are inhibited below this height (ft AGL)
    pub increase_descent_inhibit_agl_ft: f64,
    /// Descend RAs are inhibited below this height (ft AGL)
    pub descend_inhibit_agl_ft: f64,
    /// Below this height only TAs are issued (ft AGL)
    pub ta_only_agl_ft: f64,
    /// Below this height TA aural alerts are suppressed (ft AGL)
    pub ta_no_aural_agl_ft: f64,
}

impl Default for TcasRules {
    fn default() -> Self {
        Self {
            max_distance_m: 30.0 * NM_TO_METERS,
            max_vertical_separation_ft: 9_900.0,
            proximate_distance_m: 6.0 * NM_TO_METERS,
            proximate_vertical_ft: 1_200.0,
            aircraft_timeout_secs: 30.0,
            interrogation_after_secs: 5.0,
            vs_min_fpm: -10_000,
            vs_max_fpm: 10_000,
            vs_step_fpm: 100,
            climb_inhibit_altitude_ft: 4_800.0,
            increase_descent_inhibit_agl_ft: 1_500.0,
            descend_inhibit_agl_ft: 11_000.0,
            ta_only_agl_ft: 1_000.0,
            ta_no_aural_agl_ft: 500.0,
        }
    }
}

/// Advisory inhibitions derived from own altitude.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Inhibitions {
    pub climb: bool,
    pub increase_descent: bool,
    pub descend: bool,
    /// No RA may be issued at all
    pub resolution: bool,
    pub ta_aural: bool,
}

impl TcasRules {
    pub fn inhibitions(&self, own: &OwnshipState) -> Inhibitions {
        Inhibitions {
            climb: own.altitude_ft > self.climb_inhibit_altitude_ft,
            increase_descent: own.altitude_agl_ft < self.increase_descent_inhibit_agl_ft,
            descend: own.altitude_agl_ft < self.descend_inhibit_agl_ft,
            resolution: own.altitude_agl_ft < self.ta_only_agl_ft,
            ta_aural: own.altitude_agl_ft < self.ta_no_aural_agl_ft,
        }
    }

    /// Whether an intruder at this geometry is outside surveillance range.
    pub fn out_of_range(&self, distance_m: f64, vertical_separation_ft: f64) -> bool {
        distance_m > self.max_distance_m
            || vertical_separation_ft.abs() > self.max_vertical_separation_ft
    }
}

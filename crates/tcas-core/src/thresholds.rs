//! Altitude-indexed sensitivity thresholds.
//!
//! The table is keyed by ascending altitude breakpoints. The entry of the
//! smallest breakpoint strictly greater than own altitude applies; the last
//! breakpoint is unbounded so a lookup always succeeds.

use crate::geo::NM_TO_METERS;
use serde::Serialize;

/// Sensitivity parameters for one altitude band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdEntry {
    pub ta_sensitivity_level: u8,
    /// Time-to-CPA threshold for a traffic advisory (seconds)
    pub ta_tau_s: f64,
    /// Distance threshold for a traffic advisory (nautical miles)
    pub ta_dmod_nm: f64,
    /// Vertical threshold for a traffic advisory (feet)
    pub ta_zthr_ft: f64,
    pub ra_sensitivity_level: u8,
    /// Time-to-CPA threshold for a resolution advisory (seconds)
    pub ra_tau_s: f64,
    /// Distance threshold for a resolution advisory (nautical miles)
    pub ra_dmod_nm: f64,
    /// Vertical threshold for a resolution advisory (feet)
    pub ra_zthr_ft: f64,
}

impl ThresholdEntry {
    pub fn ra_dmod_m(&self) -> f64 {
        self.ra_dmod_nm * NM_TO_METERS
    }
}

const fn entry(
    ta: (u8, f64, f64, f64),
    ra: (u8, f64, f64, f64),
) -> ThresholdEntry {
    ThresholdEntry {
        ta_sensitivity_level: ta.0,
        ta_tau_s: ta.1,
        ta_dmod_nm: ta.2,
        ta_zthr_ft: ta.3,
        ra_sensitivity_level: ra.0,
        ra_tau_s: ra.1,
        ra_dmod_nm: ra.2,
        ra_zthr_ft: ra.3,
    }
}

/// `(altitude breakpoint in ft, entry)`, ascending.
pub const THRESHOLD_TABLE: [(f64, ThresholdEntry); 6] = [
    (2_350.0, entry((3, 25.0, 0.33, 850.0), (3, 15.0, 0.20, 600.0))),
    (5_000.0, entry((4, 30.0, 0.48, 850.0), (4, 20.0, 0.35, 600.0))),
    (10_000.0, entry((5, 40.0, 0.75, 850.0), (5, 25.0, 0.55, 600.0))),
    (20_000.0, entry((6, 45.0, 1.00, 850.0), (6, 30.0, 0.80, 600.0))),
    (42_000.0, entry((7, 48.0, 1.30, 850.0), (7, 35.0, 0.10, 700.0))),
    (f64::INFINITY, entry((7, 48.0, 1.30, 1200.0), (7, 35.0, 0.10, 800.0))),
];

/// Select the threshold entry for own altitude (ft MSL).
pub fn threshold_for_altitude(altitude_ft: f64) -> &'static ThresholdEntry {
    THRESHOLD_TABLE
        .iter()
        .find(|(ceiling, _)| *ceiling > altitude_ft)
        .map(|(_, entry)| entry)
        .unwrap_or(&THRESHOLD_TABLE[THRESHOLD_TABLE.len() - 1].1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_15000_ft_selects_20000_row() {
        let entry = threshold_for_altitude(15_000.0);
        assert_eq!(entry.ta_tau_s, 45.0);
        assert_eq!(entry.ra_tau_s, 30.0);
        assert_eq!(entry.ta_zthr_ft, 850.0);
    }

    #[test]
    fn test_breakpoint_is_exclusive() {
        // Exactly on a breakpoint falls through to the next band.
        assert_eq!(threshold_for_altitude(2_350.0).ta_sensitivity_level, 4);
        assert_eq!(threshold_for_altitude(2_349.9).ta_sensitivity_level, 3);
    }

    #[test]
    fn test_unbounded_top_row_always_applies() {
        let entry = threshold_for_altitude(60_000.0);
        assert_eq!(entry.ta_zthr_ft, 1200.0);
        assert_eq!(entry.ra_zthr_ft, 800.0);
    }

    #[test]
    fn test_below_ground_uses_first_row() {
        assert_eq!(threshold_for_altitude(-500.0).ra_tau_s, 15.0);
    }

    #[test]
    fn test_dmod_converts_to_meters() {
        let entry = threshold_for_altitude(15_000.0);
        assert!((entry.ra_dmod_m() - 0.8 * 1852.0).abs() < 1e-9);
    }
}

//! Per-intruder track with a two-sample history and rate estimation.

use crate::message::SquitterData;
use crate::models::{Advisory, Category};
use serde::Serialize;
use std::collections::VecDeque;

const HISTORY_LEN: usize = 2;

/// Relative geometry of an intruder at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackSample {
    /// Monotonic seconds
    pub time_s: f64,
    /// Slant distance in meters
    pub distance_m: f64,
    /// Bearing from own aircraft in degrees `[0, 360)`
    pub bearing_deg: f64,
    /// Own altitude minus intruder altitude in feet
    pub vertical_separation_ft: f64,
}

/// State held for one intruder aircraft.
#[derive(Debug, Clone)]
pub struct Track {
    pub id: String,
    samples: VecDeque<TrackSample>,
    /// m/s, negative while closing
    range_rate: Option<f64>,
    /// ft/s
    vertical_rate: Option<f64>,
    pub category: Category,
    pub advisory: Option<Advisory>,
    pub last_seen: f64,
    /// Most recent squitter body received from the intruder
    pub last_squitter: Option<SquitterData>,
}

impl Track {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            samples: VecDeque::with_capacity(HISTORY_LEN + 1),
            range_rate: None,
            vertical_rate: None,
            category: Category::Other,
            advisory: None,
            last_seen: 0.0,
            last_squitter: None,
        }
    }

    /// Append a sample, keep the two most recent and refresh the rates.
    ///
    /// When both samples share a timestamp the previous rates are kept.
    pub fn ingest(&mut self, sample: TrackSample) {
        self.last_seen = sample.time_s;
        self.samples.push_back(sample);
        while self.samples.len() > HISTORY_LEN {
            self.samples.pop_front();
        }

        if self.samples.len() < HISTORY_LEN {
            return;
        }
        let (older, newer) = (self.samples[0], self.samples[1]);
        let dt = older.time_s - newer.time_s;
        if dt != 0.0 {
            let range_rate = (older.distance_m - newer.distance_m) / dt;
            let vertical_rate = (older.vertical_separation_ft - newer.vertical_separation_ft) / dt;
            debug_assert!(range_rate.is_finite() && vertical_rate.is_finite());
            self.range_rate = Some(range_rate);
            self.vertical_rate = Some(vertical_rate);
        }
    }

    /// Range and vertical rate, once two samples have been seen.
    pub fn rates(&self) -> Option<(f64, f64)> {
        self.range_rate.zip(self.vertical_rate)
    }

    pub fn range_rate(&self) -> Option<f64> {
        self.range_rate
    }

    pub fn vertical_rate(&self) -> Option<f64> {
        self.vertical_rate
    }

    pub fn latest(&self) -> Option<&TrackSample> {
        self.samples.back()
    }

    pub fn samples(&self) -> impl Iterator<Item = &TrackSample> {
        self.samples.iter()
    }

    /// Seconds since the track was last updated.
    pub fn age(&self, now: f64) -> f64 {
        now - self.last_seen
    }

    /// Live (TA or RA) advisory, ignoring a pending clear-of-conflict marker.
    pub fn live_advisory(&self) -> Option<&Advisory> {
        self.advisory.as_ref().filter(|advisory| advisory.is_live())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time_s: f64, distance_m: f64, vertical_separation_ft: f64) -> TrackSample {
        TrackSample {
            time_s,
            distance_m,
            bearing_deg: 90.0,
            vertical_separation_ft,
        }
    }

    #[test]
    fn test_rates_unknown_after_first_sample() {
        let mut track = Track::new("AAA");
        track.ingest(sample(0.0, 10_000.0, 1_000.0));
        assert_eq!(track.rates(), None);
        assert_eq!(track.last_seen, 0.0);
    }

    #[test]
    fn test_rate_correctness() {
        let mut track = Track::new("AAA");
        track.ingest(sample(0.0, 10_000.0, 1_000.0));
        track.ingest(sample(1.0, 9_800.0, 900.0));
        assert_eq!(track.range_rate(), Some(-200.0));
        assert_eq!(track.vertical_rate(), Some(-100.0));
    }

    #[test]
    fn test_history_is_bounded_to_two() {
        let mut track = Track::new("AAA");
        for i in 0..5 {
            track.ingest(sample(i as f64, 10_000.0 - 100.0 * i as f64, 500.0));
        }
        assert_eq!(track.samples().count(), 2);
        assert_eq!(track.latest().map(|s| s.time_s), Some(4.0));
        assert_eq!(track.range_rate(), Some(-100.0));
        assert_eq!(track.vertical_rate(), Some(0.0));
    }

    #[test]
    fn test_zero_dt_keeps_previous_rates() {
        let mut track = Track::new("AAA");
        track.ingest(sample(0.0, 10_000.0, 1_000.0));
        track.ingest(sample(1.0, 9_800.0, 900.0));
        track.ingest(sample(1.0, 9_000.0, 100.0));
        assert_eq!(track.rates(), Some((-200.0, -100.0)));
    }

    #[test]
    fn test_zero_dt_on_second_sample_leaves_rates_unknown() {
        let mut track = Track::new("AAA");
        track.ingest(sample(2.0, 10_000.0, 1_000.0));
        track.ingest(sample(2.0, 9_900.0, 1_000.0));
        assert_eq!(track.rates(), None);
    }

    #[test]
    fn test_opening_geometry_gives_positive_range_rate() {
        let mut track = Track::new("AAA");
        track.ingest(sample(0.0, 5_000.0, 0.0));
        track.ingest(sample(2.0, 5_400.0, 0.0));
        assert_eq!(track.range_rate(), Some(200.0));
        assert_eq!(track.age(32.0), 30.0);
    }
}

//! Threat classification.
//!
//! Turns a freshly ingested track sample into a threat category using the
//! time-to-CPA (TAU) and the predicted vertical separation at CPA, and
//! drives the advisory lifecycle of the track.

use crate::models::{Advisory, AdvisoryKind, Category, OwnshipState};
use crate::rules::TcasRules;
use crate::thresholds::threshold_for_altitude;
use crate::track::Track;

/// Outcome of classifying one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub previous: Category,
    pub category: Category,
    /// Seconds to closest approach, `None` when range is not changing
    pub tau_s: Option<f64>,
    /// Predicted vertical separation at CPA in feet
    pub vsep_at_cpa_ft: Option<f64>,
    /// Category settled at RA with an advisory that has not been sent yet
    pub needs_resolution: bool,
}

impl Classification {
    pub fn escalated(&self) -> bool {
        self.category > self.previous && self.category.is_threat()
    }

    pub fn cleared(&self) -> bool {
        self.previous.is_threat() && !self.category.is_threat()
    }
}

/// Time to closest approach. A zero range rate never reaches CPA.
pub fn time_to_cpa(distance_m: f64, range_rate: f64) -> Option<f64> {
    if range_rate == 0.0 {
        return None;
    }
    let tau = distance_m / range_rate.abs();
    debug_assert!(tau.is_finite());
    Some(tau)
}

/// Threshold test shared by the TA and RA stages.
///
/// Trips on a short time to CPA with a small predicted vertical miss, or on
/// an intruder that is already close both vertically and horizontally.
fn trips(
    tau_s: Option<f64>,
    vsep_at_cpa_ft: Option<f64>,
    vertical_separation_ft: f64,
    distance_m: f64,
    tau_threshold_s: f64,
    zthr_ft: f64,
    dmod_m: f64,
) -> bool {
    let time_test = match (tau_s, vsep_at_cpa_ft) {
        (Some(tau), Some(vsep)) => tau < tau_threshold_s && vsep < zthr_ft,
        _ => false,
    };
    let range_test = vertical_separation_ft.abs() < zthr_ft && distance_m < dmod_m;
    time_test || range_test
}

/// Classify the latest sample of `track` and update its category and advisory.
///
/// Returns `None` while the track has fewer than two samples (rates unknown).
pub fn classify(track: &mut Track, own: &OwnshipState, rules: &TcasRules) -> Option<Classification> {
    let (range_rate, vertical_rate) = track.rates()?;
    let sample = *track.latest()?;
    let threshold = threshold_for_altitude(own.altitude_ft);
    let inhibitions = rules.inhibitions(own);

    let distance_m = sample.distance_m;
    let vsep = sample.vertical_separation_ft;
    let tau_s = time_to_cpa(distance_m, range_rate);
    let vsep_at_cpa_ft = tau_s.map(|tau| (vsep + vertical_rate * tau).abs());
    let previous = track.category;
    let closing = range_rate <= 0.0;

    let mut category = if vsep.abs() <= rules.proximate_vertical_ft
        && distance_m <= rules.proximate_distance_m
    {
        Category::Proximate
    } else {
        Category::Other
    };

    if closing
        && trips(
            tau_s,
            vsep_at_cpa_ft,
            vsep,
            distance_m,
            threshold.ta_tau_s,
            threshold.ta_zthr_ft,
            threshold.ra_dmod_m(),
        )
    {
        category = Category::Ta;
        if track.live_advisory().is_none() {
            track.advisory = Some(Advisory::new(AdvisoryKind::Ta));
        }
    }

    if !inhibitions.resolution
        && closing
        && trips(
            tau_s,
            vsep_at_cpa_ft,
            vsep,
            distance_m,
            threshold.ra_tau_s,
            threshold.ra_zthr_ft,
            threshold.ra_dmod_m(),
        )
    {
        category = Category::Ra;
        let has_ra = track
            .advisory
            .as_ref()
            .is_some_and(|advisory| advisory.kind == AdvisoryKind::Ra);
        if !has_ra {
            track.advisory = Some(Advisory::new(AdvisoryKind::Ra));
        }
    }

    // An RA holds until the geometry clears completely, unless RAs are
    // inhibited, in which case it drops to a fresh TA.
    if previous == Category::Ra && category == Category::Ta {
        if inhibitions.resolution {
            track.advisory = Some(Advisory::new(AdvisoryKind::Ta));
        } else {
            category = Category::Ra;
        }
    }

    if !category.is_threat() {
        if previous.is_threat() {
            track.advisory = Some(Advisory::new(AdvisoryKind::ClearOfConflict));
        } else if track.live_advisory().is_some() {
            track.advisory = None;
        }
    }

    track.category = category;

    let needs_resolution = category == Category::Ra
        && track
            .advisory
            .as_ref()
            .is_some_and(|advisory| advisory.kind == AdvisoryKind::Ra && !advisory.is_sent);

    tracing::debug!(
        track = %track.id,
        ?category,
        ?previous,
        advisory = ?track.advisory.as_ref().map(|a| a.kind),
        distance_nm = distance_m * crate::geo::METERS_TO_NM,
        vsep_ft = vsep,
        range_rate,
        vertical_rate,
        tau_s = ?tau_s,
        vsep_at_cpa_ft = ?vsep_at_cpa_ft,
        "Classified track"
    );

    Some(Classification {
        previous,
        category,
        tau_s,
        vsep_at_cpa_ft,
        needs_resolution,
    })
}

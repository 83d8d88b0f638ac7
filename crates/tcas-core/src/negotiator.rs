//! Resolution advisory search and the two-party negotiation rules.
//!
//! Each aircraft searches vertical-speed offsets in both directions for
//! the ones that clear the intruder by more than the TA vertical threshold
//! at CPA, picks the direction with the best achievable separation and
//! sends the complementary sense to the intruder. When both aircraft send
//! at the same time, the aircraft with the lexicographically smaller
//! identifier keeps its own advisory and the other one adopts the request.

use crate::classifier::time_to_cpa;
use crate::message::ResolutionResponse;
use crate::models::{Advisory, Category, OwnshipState, Sense, Solution};
use crate::rules::TcasRules;
use crate::thresholds::threshold_for_altitude;
use crate::track::Track;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    vs_fpm: i32,
    separation_ft: f64,
}

impl Candidate {
    /// Seed for a direction with no acceptable rate.
    const FALLBACK: Candidate = Candidate {
        vs_fpm: 0,
        separation_ft: 0.0,
    };
}

/// Computed resolution for own aircraft plus the mirror for the intruder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub sense: Sense,
    pub min_vertical_speed_fpm: f64,
    pub max_vertical_speed_fpm: f64,
    /// Largest predicted separation at CPA in the chosen direction (ft)
    pub best_separation_ft: f64,
    pub opponent: Solution,
}

impl Resolution {
    pub fn apply_to(&self, advisory: &mut Advisory) {
        advisory.alert = Some(self.sense);
        advisory.min_vertical_speed_fpm = self.min_vertical_speed_fpm;
        advisory.max_vertical_speed_fpm = self.max_vertical_speed_fpm;
        advisory.opponent_solution = Some(self.opponent);
    }
}

fn scan(
    offsets: impl Iterator<Item = i32>,
    vertical_separation_ft: f64,
    vertical_rate: f64,
    tau_s: f64,
    zthr_ft: f64,
) -> Vec<Candidate> {
    offsets
        .filter_map(|vs_fpm| {
            let separation_ft =
                (vertical_separation_ft + (vertical_rate + vs_fpm as f64 / 60.0) * tau_s).abs();
            (separation_ft > zthr_ft).then_some(Candidate {
                vs_fpm,
                separation_ft,
            })
        })
        .collect()
}

fn best_separation(candidates: &[Candidate]) -> f64 {
    candidates
        .iter()
        .map(|c| c.separation_ft)
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Search for a vertical-speed resolution against `track`.
///
/// Returns `None` when the rates are unknown or TAU is undefined.
pub fn find_resolution(track: &Track, own: &OwnshipState, rules: &TcasRules) -> Option<Resolution> {
    let (range_rate, vertical_rate) = track.rates()?;
    let sample = track.latest()?;
    let tau_s = time_to_cpa(sample.distance_m, range_rate)?;
    let threshold = threshold_for_altitude(own.altitude_ft);
    let inhibitions = rules.inhibitions(own);
    let step = rules.vs_step_fpm.max(1) as usize;
    let vsep = sample.vertical_separation_ft;

    let mut up = if inhibitions.climb {
        Vec::new()
    } else {
        scan(
            (0..rules.vs_max_fpm).step_by(step),
            vsep,
            vertical_rate,
            tau_s,
            threshold.ta_zthr_ft,
        )
    };

    let mut down = if inhibitions.descend && inhibitions.increase_descent {
        Vec::new()
    } else {
        scan(
            (rules.vs_min_fpm..0).step_by(step),
            vsep,
            vertical_rate,
            tau_s,
            threshold.ta_zthr_ft,
        )
    };

    if up.is_empty() {
        up.push(Candidate::FALLBACK);
    }
    if down.is_empty() {
        down.push(Candidate::FALLBACK);
    }

    let best_up = best_separation(&up);
    let best_down = best_separation(&down);
    // Equal separation goes to descend.
    let (sense, chosen, best_separation_ft) = if best_up > best_down {
        (Sense::Climb, &up, best_up)
    } else {
        (Sense::Descend, &down, best_down)
    };

    let min_vs = chosen.iter().map(|c| c.vs_fpm).min().unwrap_or(0);
    let max_vs = chosen.iter().map(|c| c.vs_fpm).max().unwrap_or(0);

    let opponent = match sense {
        Sense::Climb => Solution {
            alert: Sense::Descend,
            minimal_vertical_speed: rules.vs_min_fpm as f64,
            maximal_vertical_speed: 0.0,
        },
        Sense::Descend => Solution {
            alert: Sense::Climb,
            minimal_vertical_speed: 0.0,
            maximal_vertical_speed: rules.vs_max_fpm as f64,
        },
    };

    Some(Resolution {
        sense,
        min_vertical_speed_fpm: min_vs as f64,
        max_vertical_speed_fpm: max_vs as f64,
        best_separation_ft,
        opponent,
    })
}

/// What to do with an incoming resolution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDecision {
    /// Adopt the requested band and reply with an acceptance
    Accept,
    /// Own advisory stands, ignore the request
    Discard,
}

/// Decide on a resolution request from `intruder_id`.
///
/// Only a track already at RA with its own request sent can refuse, and only
/// when the own identifier sorts before the intruder's.
pub fn decide_request(own_id: &str, intruder_id: &str, track: &Track) -> RequestDecision {
    let own_request_sent = track.category == Category::Ra
        && track.live_advisory().is_some_and(|advisory| advisory.is_sent);
    if own_request_sent && own_id < intruder_id {
        RequestDecision::Discard
    } else {
        RequestDecision::Accept
    }
}

/// Adopt the intruder's requested band as own RA.
pub fn accept_request(track: &mut Track, solution: &Solution) {
    track.category = Category::Ra;
    track.advisory = Some(Advisory::adopted(solution));
}

/// Apply a resolution response. Returns whether the advisory changed.
///
/// A rejection leaves the advisory untouched.
pub fn apply_response(track: &mut Track, response: ResolutionResponse) -> bool {
    if !response.accept {
        return false;
    }
    match track.advisory.as_mut() {
        Some(advisory) if advisory.is_live() && !advisory.is_accepted => {
            advisory.is_accepted = true;
            true
        }
        _ => false,
    }
}

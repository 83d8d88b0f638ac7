//! Core data models shared by the tracker, classifier and negotiator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Own-aircraft state, read once per cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OwnshipState {
    /// Altitude in feet MSL
    pub altitude_ft: f64,
    /// Height above ground in feet
    pub altitude_agl_ft: f64,
    pub lat: f64,
    pub lon: f64,
    /// Ground speed in knots
    pub ground_speed_kt: f64,
    /// Vertical speed in ft/min
    pub vertical_speed_fpm: f64,
    /// True heading in degrees
    pub heading_deg: f64,
}

/// Threat category of a tracked aircraft, ordered by severity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    #[default]
    Other,
    Proximate,
    Ta,
    Ra,
}

impl Category {
    /// TA or RA.
    pub fn is_threat(self) -> bool {
        matches!(self, Category::Ta | Category::Ra)
    }
}

/// Kind of advisory, ordered by display priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdvisoryKind {
    ClearOfConflict,
    Ta,
    Ra,
}

/// Vertical sense of a resolution advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sense {
    #[serde(rename = "CLIMB, CLIMB")]
    Climb,
    #[serde(rename = "DESCEND, DESCEND")]
    Descend,
}

impl Sense {
    pub fn opposite(self) -> Self {
        match self {
            Sense::Climb => Sense::Descend,
            Sense::Descend => Sense::Climb,
        }
    }

    pub fn alert(self) -> &'static str {
        match self {
            Sense::Climb => "CLIMB, CLIMB",
            Sense::Descend => "DESCEND, DESCEND",
        }
    }
}

impl fmt::Display for Sense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alert())
    }
}

/// A recommended vertical-speed band, as exchanged in a resolution request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub alert: Sense,
    /// Lower bound in ft/min
    pub minimal_vertical_speed: f64,
    /// Upper bound in ft/min
    pub maximal_vertical_speed: f64,
}

/// The advisory currently attached to a track.
#[derive(Debug, Clone, Serialize)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    /// Resolution sense, present once a resolution exists
    pub alert: Option<Sense>,
    pub min_vertical_speed_fpm: f64,
    pub max_vertical_speed_fpm: f64,
    /// Band recommended to the intruder
    pub opponent_solution: Option<Solution>,
    /// Resolution request transmitted
    pub is_sent: bool,
    /// Handshake complete
    pub is_accepted: bool,
    pub issued_at: DateTime<Utc>,
}

impl Advisory {
    pub fn new(kind: AdvisoryKind) -> Self {
        Self {
            kind,
            alert: None,
            min_vertical_speed_fpm: 0.0,
            max_vertical_speed_fpm: 0.0,
            opponent_solution: None,
            is_sent: false,
            is_accepted: false,
            issued_at: Utc::now(),
        }
    }

    /// An RA adopted from an intruder's resolution request.
    pub fn adopted(solution: &Solution) -> Self {
        Self {
            alert: Some(solution.alert),
            min_vertical_speed_fpm: solution.minimal_vertical_speed,
            max_vertical_speed_fpm: solution.maximal_vertical_speed,
            is_sent: true,
            is_accepted: true,
            ..Self::new(AdvisoryKind::Ra)
        }
    }

    /// TA or RA; a clear-of-conflict marker is not live.
    pub fn is_live(&self) -> bool {
        self.kind != AdvisoryKind::ClearOfConflict
    }

    /// Own recommended band.
    pub fn solution(&self) -> Option<Solution> {
        self.alert.map(|alert| Solution {
            alert,
            minimal_vertical_speed: self.min_vertical_speed_fpm,
            maximal_vertical_speed: self.max_vertical_speed_fpm,
        })
    }
}

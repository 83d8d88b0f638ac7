pub mod classifier;
pub mod geo;
pub mod message;
pub mod models;
pub mod negotiator;
pub mod ownship;
pub mod registry;
pub mod rules;
pub mod thresholds;
pub mod track;

pub use classifier::{classify, time_to_cpa, Classification};
pub use geo::{bearing, haversine_distance, offset_by_bearing};
pub use message::{
    Message, MessageError, MessageType, Mode, Payload, ResolutionResponse, SquitterData,
};
pub use models::{Advisory, AdvisoryKind, Category, OwnshipState, Sense, Solution};
pub use negotiator::{find_resolution, RequestDecision, Resolution};
pub use ownship::{KinematicSimulator, OwnshipError, OwnshipSource};
pub use registry::{Registry, TrackView};
pub use rules::{Inhibitions, TcasRules};
pub use thresholds::{threshold_for_altitude, ThresholdEntry};
pub use track::{Track, TrackSample};

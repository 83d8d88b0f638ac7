//! Track registry: intruder id → track, plus message dispatch.
//!
//! Every operation takes `&mut self` and returns the messages to publish, so
//! one call covers a whole ingest-classify-negotiate sequence. The caller
//! owns the registry on a single task and publishes the returned messages.

use crate::classifier::classify;
use crate::geo::{bearing, haversine_distance};
use crate::message::{Message, Mode, Payload, ResolutionResponse, SquitterData};
use crate::models::{Advisory, AdvisoryKind, Category, OwnshipState, Solution};
use crate::negotiator::{
    accept_request, apply_response, decide_request, find_resolution, RequestDecision,
};
use crate::rules::TcasRules;
use crate::track::{Track, TrackSample};
use serde::Serialize;
use std::collections::HashMap;

/// Read-only view of one track for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct TrackView {
    pub id: String,
    pub category: Category,
    pub advisory: Option<Advisory>,
    pub distance_m: f64,
    pub bearing_deg: f64,
    pub vertical_separation_ft: f64,
    /// Intruder's own reported vertical speed (ft/min)
    pub intruder_vertical_speed_fpm: Option<f64>,
    pub range_rate_mps: Option<f64>,
    pub vertical_rate_fps: Option<f64>,
    pub age_s: f64,
}

pub struct Registry {
    own_id: String,
    rules: TcasRules,
    tracks: HashMap<String, Track>,
}

impl Registry {
    pub fn new(own_id: impl Into<String>, rules: TcasRules) -> Self {
        Self {
            own_id: own_id.into(),
            rules,
            tracks: HashMap::new(),
        }
    }

    pub fn own_id(&self) -> &str {
        &self.own_id
    }

    pub fn rules(&self) -> &TcasRules {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.get(id)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Periodic own-state broadcast.
    pub fn own_squitter(&self, own: &OwnshipState) -> Message {
        Message::broadcast(&self.own_id, Payload::ShortSquitter(own.into()))
    }

    /// Dispatch one decoded message by `(mode, type)`.
    pub fn handle_message(&mut self, msg: &Message, own: &OwnshipState, now: f64) -> Vec<Message> {
        if !msg.is_for(&self.own_id) {
            return Vec::new();
        }

        match (msg.mode, &msg.payload) {
            (Mode::Broadcast, Payload::ShortSquitter(data) | Payload::LongSquitter(data))
            | (Mode::Selective, Payload::LongSquitter(data)) => {
                self.ingest_squitter(&msg.address, data, own, now)
            }
            (Mode::Selective, Payload::ResolutionRequest(solution)) => {
                self.handle_resolution_request(&msg.address, solution)
            }
            (Mode::Selective, Payload::ResolutionResponse(response)) => {
                self.handle_resolution_response(&msg.address, *response);
                Vec::new()
            }
            (Mode::Selective, Payload::Interrogation) => {
                tracing::debug!("Interrogated by {}, replying with long squitter", msg.address);
                vec![Message::selective(
                    &self.own_id,
                    &msg.address,
                    Payload::LongSquitter(own.into()),
                )]
            }
            (mode, payload) => {
                tracing::debug!(
                    "Ignoring {:?} {:?} from {}",
                    mode,
                    payload.kind(),
                    msg.address
                );
                Vec::new()
            }
        }
    }

    /// Feed a squitter from `sender` into its track and classify it.
    ///
    /// Returns a resolution request when the track reaches RA with an
    /// unsent advisory.
    pub fn ingest_squitter(
        &mut self,
        sender: &str,
        data: &SquitterData,
        own: &OwnshipState,
        now: f64,
    ) -> Vec<Message> {
        let distance_m = haversine_distance(own.lat, own.lon, data.lat, data.long);
        let bearing_deg = bearing(own.lat, own.lon, data.lat, data.long);
        let vertical_separation_ft = own.altitude_ft - data.alt;

        if self.rules.out_of_range(distance_m, vertical_separation_ft) {
            if let Some(track) = self.tracks.remove(sender) {
                tracing::info!(
                    "Dropped track {} out of range (was {:?})",
                    sender,
                    track.category
                );
            }
            return Vec::new();
        }

        let track = self.tracks.entry(sender.to_string()).or_insert_with(|| {
            tracing::info!("New track {}", sender);
            Track::new(sender)
        });

        // Same body and same own geometry: a redelivered frame. Feeding it as
        // a new sample would zero the range rate.
        let redelivered = track.last_squitter == Some(*data)
            && track.latest().is_some_and(|sample| {
                sample.distance_m == distance_m
                    && sample.vertical_separation_ft == vertical_separation_ft
            });
        if redelivered {
            tracing::debug!("Duplicate squitter from {}", sender);
            track.last_seen = now;
            return Vec::new();
        }

        track.last_squitter = Some(*data);
        track.ingest(TrackSample {
            time_s: now,
            distance_m,
            bearing_deg,
            vertical_separation_ft,
        });

        let Some(result) = classify(track, own, &self.rules) else {
            return Vec::new();
        };

        if result.escalated() {
            tracing::warn!(
                "{:?} against {} (tau {:?} s, vsep at CPA {:?} ft)",
                result.category,
                sender,
                result.tau_s,
                result.vsep_at_cpa_ft
            );
        } else if result.cleared() {
            tracing::info!("Clear of conflict with {}", sender);
        }

        if !result.needs_resolution {
            return Vec::new();
        }

        let Some(resolution) = find_resolution(track, own, &self.rules) else {
            return Vec::new();
        };
        let Some(advisory) = track.advisory.as_mut() else {
            return Vec::new();
        };
        resolution.apply_to(advisory);
        advisory.is_sent = true;

        tracing::warn!(
            "RA {} [{}, {}] ft/min against {}, requesting {}",
            resolution.sense,
            resolution.min_vertical_speed_fpm,
            resolution.max_vertical_speed_fpm,
            sender,
            resolution.opponent.alert
        );

        vec![Message::selective(
            &self.own_id,
            sender,
            Payload::ResolutionRequest(resolution.opponent),
        )]
    }

    fn handle_resolution_request(&mut self, sender: &str, solution: &Solution) -> Vec<Message> {
        let Some(track) = self.tracks.get_mut(sender) else {
            tracing::debug!("Dropping resolution request from untracked {}", sender);
            return Vec::new();
        };

        match decide_request(&self.own_id, sender, track) {
            RequestDecision::Discard => {
                tracing::info!(
                    "Resolution request from {} discarded, own advisory stands",
                    sender
                );
                Vec::new()
            }
            RequestDecision::Accept => {
                accept_request(track, solution);
                tracing::warn!(
                    "RA {} [{}, {}] ft/min adopted from {}",
                    solution.alert,
                    solution.minimal_vertical_speed,
                    solution.maximal_vertical_speed,
                    sender
                );
                vec![Message::selective(
                    &self.own_id,
                    sender,
                    Payload::ResolutionResponse(ResolutionResponse { accept: true }),
                )]
            }
        }
    }

    fn handle_resolution_response(&mut self, sender: &str, response: ResolutionResponse) {
        let Some(track) = self.tracks.get_mut(sender) else {
            tracing::debug!("Dropping resolution response from untracked {}", sender);
            return;
        };
        if apply_response(track, response) {
            tracing::info!("Resolution accepted by {}", sender);
        }
    }

    /// Remove tracks not heard from within the aircraft timeout.
    pub fn sweep_timeouts(&mut self, now: f64) -> Vec<String> {
        let timeout = self.rules.aircraft_timeout_secs;
        let expired: Vec<String> = self
            .tracks()
            .filter(|track| track.age(now) > timeout)
            .map(|track| track.id.clone())
            .collect();

        for id in &expired {
            self.tracks.remove(id);
            tracing::info!("Track {} timed out", id);
        }
        expired
    }

    /// Interrogations for tracks that have gone quiet.
    pub fn interrogations(&self, now: f64) -> Vec<Message> {
        self.tracks()
            .filter(|track| track.age(now) > self.rules.interrogation_after_secs)
            .map(|track| Message::selective(&self.own_id, &track.id, Payload::Interrogation))
            .collect()
    }

    /// Track views sorted by distance.
    pub fn views(&self, now: f64) -> Vec<TrackView> {
        let mut views: Vec<TrackView> = self
            .tracks()
            .filter_map(|track| {
                let sample = track.latest()?;
                Some(TrackView {
                    id: track.id.clone(),
                    category: track.category,
                    advisory: track.advisory.clone(),
                    distance_m: sample.distance_m,
                    bearing_deg: sample.bearing_deg,
                    vertical_separation_ft: sample.vertical_separation_ft,
                    intruder_vertical_speed_fpm: track.last_squitter.map(|data| data.vs),
                    range_rate_mps: track.range_rate(),
                    vertical_rate_fps: track.vertical_rate(),
                    age_s: track.age(now),
                })
            })
            .collect();
        views.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        views
    }

    /// Most severe advisory across all tracks: RA > TA > clear of conflict.
    pub fn most_severe_advisory(&self) -> Option<AdvisoryKind> {
        self.tracks()
            .filter_map(|track| track.advisory.as_ref().map(|advisory| advisory.kind))
            .max()
    }

    /// Drop one-shot clear-of-conflict markers once they have been shown.
    pub fn consume_clear_of_conflict(&mut self) -> usize {
        let mut consumed = 0;
        for track in self.tracks.values_mut() {
            if track
                .advisory
                .as_ref()
                .is_some_and(|advisory| advisory.kind == AdvisoryKind::ClearOfConflict)
            {
                track.advisory = None;
                consumed += 1;
            }
        }
        consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{offset_by_bearing, NM_TO_METERS};
    use crate::models::Sense;

    const LAT: f64 = 53.8036111;
    const LON: f64 = 10.7148917;

    /// Own state `east_m` meters east of the reference point.
    fn state_at(east_m: f64, altitude_ft: f64) -> OwnshipState {
        let (lat, lon) = offset_by_bearing(LAT, LON, east_m, 90f64.to_radians());
        OwnshipState {
            altitude_ft,
            altitude_agl_ft: altitude_ft,
            lat,
            lon,
            ground_speed_kt: 200.0,
            vertical_speed_fpm: 0.0,
            heading_deg: 270.0,
        }
    }

    fn squitter(from: &str, state: &OwnshipState) -> Message {
        Message::broadcast(from, Payload::ShortSquitter(state.into()))
    }

    fn requests(messages: &[Message]) -> Vec<&Message> {
        messages
            .iter()
            .filter(|m| matches!(m.payload, Payload::ResolutionRequest(_)))
            .collect()
    }

    #[test]
    fn test_first_squitter_creates_unclassified_track() {
        let mut registry = Registry::new("AAA", TcasRules::default());
        let own = state_at(0.0, 15_000.0);
        let out = registry.handle_message(&squitter("BBB", &state_at(1_000.0, 14_800.0)), &own, 0.0);
        assert!(out.is_empty());
        let track = registry.track("BBB").unwrap();
        assert_eq!(track.category, Category::Other);
        assert!((track.latest().unwrap().distance_m - 1_000.0).abs() < 1.0);
        assert!((track.latest().unwrap().bearing_deg - 90.0).abs() < 0.5);
        assert_eq!(track.latest().unwrap().vertical_separation_ft, 200.0);
    }

    #[test]
    fn test_loopback_and_foreign_selective_are_ignored() {
        let mut registry = Registry::new("AAA", TcasRules::default());
        let own = state_at(0.0, 15_000.0);
        assert!(registry
            .handle_message(&squitter("AAA", &own), &own, 0.0)
            .is_empty());
        assert!(registry.is_empty());

        let foreign = Message::selective("BBB", "CCC", Payload::Interrogation);
        assert!(registry.handle_message(&foreign, &own, 0.0).is_empty());
    }

    #[test]
    fn test_ra_sent_once_for_repeated_sample() {
        let mut registry = Registry::new("AAA", TcasRules::default());
        let own = state_at(0.0, 15_000.0);
        registry.handle_message(&squitter("BBB", &state_at(1_050.0, 14_800.0)), &own, 0.0);
        let near = squitter("BBB", &state_at(1_000.0, 14_800.0));

        let first = registry.handle_message(&near, &own, 1.0);
        assert_eq!(requests(&first).len(), 1);
        let advisory = registry.track("BBB").unwrap().advisory.as_ref().unwrap();
        assert_eq!(advisory.kind, AdvisoryKind::Ra);
        assert!(advisory.is_sent);
        assert_eq!(advisory.alert, Some(Sense::Descend));

        let second = registry.handle_message(&near, &own, 1.0);
        assert!(second.is_empty());
        assert_eq!(registry.most_severe_advisory(), Some(AdvisoryKind::Ra));
    }

    #[test]
    fn test_redelivered_squitter_keeps_time_based_ra() {
        let mut registry = Registry::new("AAA", TcasRules::default());
        let own = state_at(0.0, 15_000.0);
        // Outside RA DMOD, so only the TAU test trips (TAU 20 s).
        registry.handle_message(&squitter("BBB", &state_at(2_100.0, 14_800.0)), &own, 0.0);
        let sample = squitter("BBB", &state_at(2_000.0, 14_800.0));
        let first = registry.handle_message(&sample, &own, 1.0);
        assert_eq!(requests(&first).len(), 1);

        assert!(registry.handle_message(&sample, &own, 1.05).is_empty());
        let track = registry.track("BBB").unwrap();
        assert_eq!(track.category, Category::Ra);
        assert_eq!(track.last_seen, 1.05);
        assert!((track.range_rate().unwrap() + 100.0).abs() < 0.5);
        assert_eq!(
            track.advisory.as_ref().map(|a| a.kind),
            Some(AdvisoryKind::Ra)
        );

        let next = registry.handle_message(&squitter("BBB", &state_at(1_900.0, 14_800.0)), &own, 2.0);
        assert!(requests(&next).is_empty());
        assert_eq!(registry.track("BBB").unwrap().category, Category::Ra);
    }

    #[test]
    fn test_out_of_range_prunes_ra_track() {
        let mut registry = Registry::new("AAA", TcasRules::default());
        let own = state_at(0.0, 15_000.0);
        registry.handle_message(&squitter("BBB", &state_at(1_050.0, 14_800.0)), &own, 0.0);
        registry.handle_message(&squitter("BBB", &state_at(1_000.0, 14_800.0)), &own, 1.0);
        assert_eq!(registry.track("BBB").unwrap().category, Category::Ra);

        let far = state_at(31.0 * NM_TO_METERS, 14_800.0);
        registry.handle_message(&squitter("BBB", &far), &own, 2.0);
        assert!(registry.track("BBB").is_none());
    }

    #[test]
    fn test_vertical_out_of_range_never_creates_track() {
        let mut registry = Registry::new("AAA", TcasRules::default());
        let own = state_at(0.0, 15_000.0);
        registry.handle_message(&squitter("BBB", &state_at(1_000.0, 25_000.0)), &own, 0.0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_timeout_sweep() {
        let mut registry = Registry::new("AAA", TcasRules::default());
        let own = state_at(0.0, 15_000.0);
        registry.handle_message(&squitter("BBB", &state_at(5_000.0, 14_000.0)), &own, 10.0);

        assert!(registry.sweep_timeouts(40.0).is_empty());
        assert_eq!(registry.sweep_timeouts(40.0001), vec!["BBB".to_string()]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_quiet_tracks_are_interrogated() {
        let mut registry = Registry::new("AAA", TcasRules::default());
        let own = state_at(0.0, 15_000.0);
        registry.handle_message(&squitter("BBB", &state_at(5_000.0, 14_000.0)), &own, 0.0);

        assert!(registry.interrogations(5.0).is_empty());
        let out = registry.interrogations(5.5);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].receiver.as_deref(), Some("BBB"));
        assert_eq!(out[0].payload, Payload::Interrogation);
    }

    #[test]
    fn test_interrogation_reply_is_selective_long_squitter() {
        let mut registry = Registry::new("BBB", TcasRules::default());
        let own = state_at(0.0, 14_000.0);
        let out = registry.handle_message(
            &Message::selective("AAA", "BBB", Payload::Interrogation),
            &own,
            0.0,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].mode, Mode::Selective);
        assert_eq!(out[0].receiver.as_deref(), Some("AAA"));
        match &out[0].payload {
            Payload::LongSquitter(data) => {
                assert_eq!(data.alt, 14_000.0);
                assert_eq!(data.hdg, Some(270.0));
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_selective_long_squitter_feeds_track() {
        let mut registry = Registry::new("AAA", TcasRules::default());
        let own = state_at(0.0, 15_000.0);
        let reply = Message::selective(
            "BBB",
            "AAA",
            Payload::LongSquitter((&state_at(2_000.0, 14_000.0)).into()),
        );
        registry.handle_message(&reply, &own, 0.0);
        assert!(registry.track("BBB").is_some());
    }

    #[test]
    fn test_request_from_untracked_aircraft_is_dropped() {
        let mut registry = Registry::new("BBB", TcasRules::default());
        let request = Message::selective(
            "AAA",
            "BBB",
            Payload::ResolutionRequest(Solution {
                alert: Sense::Climb,
                minimal_vertical_speed: 0.0,
                maximal_vertical_speed: 10_000.0,
            }),
        );
        let out = registry.handle_message(&request, &state_at(0.0, 15_000.0), 0.0);
        assert!(out.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_rejected_response_leaves_state_unchanged() {
        let mut registry = Registry::new("AAA", TcasRules::default());
        let own = state_at(0.0, 15_000.0);
        registry.handle_message(&squitter("BBB", &state_at(1_050.0, 14_800.0)), &own, 0.0);
        registry.handle_message(&squitter("BBB", &state_at(1_000.0, 14_800.0)), &own, 1.0);

        let reject = Message::selective(
            "BBB",
            "AAA",
            Payload::ResolutionResponse(ResolutionResponse { accept: false }),
        );
        assert!(registry.handle_message(&reject, &own, 1.5).is_empty());
        let track = registry.track("BBB").unwrap();
        let advisory = track.advisory.as_ref().unwrap();
        assert_eq!(track.category, Category::Ra);
        assert!(advisory.is_sent);
        assert!(!advisory.is_accepted);
        assert_eq!(advisory.alert, Some(Sense::Descend));
    }

    #[test]
    fn test_negotiation_symmetry_smaller_id_prevails() {
        let mut a = Registry::new("AAA", TcasRules::default());
        let mut b = Registry::new("BBB", TcasRules::default());

        // A holds position; B flies west toward A, 200 ft below.
        let a_own = state_at(0.0, 15_000.0);
        let b_t0 = state_at(1_050.0, 14_800.0);
        let b_t1 = state_at(1_000.0, 14_800.0);

        a.handle_message(&squitter("BBB", &b_t0), &a_own, 0.0);
        b.handle_message(&squitter("AAA", &a_own), &b_t0, 0.0);

        let from_a = a.handle_message(&squitter("BBB", &b_t1), &a_own, 1.0);
        let from_b = b.handle_message(&squitter("AAA", &a_own), &b_t1, 1.0);
        let a_request = requests(&from_a)[0].clone();
        let b_request = requests(&from_b)[0].clone();

        // Requests cross on the wire.
        assert!(a.handle_message(&b_request, &a_own, 1.1).is_empty());
        let b_reply = b.handle_message(&a_request, &b_t1, 1.1);
        assert_eq!(b_reply.len(), 1);
        assert_eq!(
            b_reply[0].payload,
            Payload::ResolutionResponse(ResolutionResponse { accept: true })
        );
        a.handle_message(&b_reply[0], &a_own, 1.2);

        let a_adv = a.track("BBB").unwrap().advisory.as_ref().unwrap();
        let b_adv = b.track("AAA").unwrap().advisory.as_ref().unwrap();

        assert!(a_adv.is_sent && a_adv.is_accepted);
        assert_eq!(a_adv.alert, Some(Sense::Descend));
        assert_eq!(a_adv.min_vertical_speed_fpm, -10_000.0);
        assert_eq!(a_adv.max_vertical_speed_fpm, -3_200.0);

        assert!(b_adv.is_sent && b_adv.is_accepted);
        assert_eq!(b_adv.solution(), a_adv.opponent_solution);
        assert_eq!(b_adv.alert, Some(Sense::Climb));
    }

    #[test]
    fn test_clear_of_conflict_is_consumed_once() {
        let mut registry = Registry::new("AAA", TcasRules::default());
        let own = state_at(0.0, 15_000.0);
        registry.handle_message(&squitter("BBB", &state_at(1_050.0, 14_800.0)), &own, 0.0);
        registry.handle_message(&squitter("BBB", &state_at(1_000.0, 14_800.0)), &own, 1.0);
        // Intruder passes and opens.
        registry.handle_message(&squitter("BBB", &state_at(-1_500.0, 14_800.0)), &own, 2.0);

        assert_eq!(
            registry.most_severe_advisory(),
            Some(AdvisoryKind::ClearOfConflict)
        );
        let views = registry.views(2.0);
        assert_eq!(views[0].category, Category::Proximate);
        assert_eq!(registry.consume_clear_of_conflict(), 1);
        assert_eq!(registry.most_severe_advisory(), None);
        assert_eq!(registry.consume_clear_of_conflict(), 0);
    }
}

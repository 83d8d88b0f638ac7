//! Wire messages exchanged over the pub/sub channel.
//!
//! Frames are JSON envelopes carrying a `type` tag and an untyped `data`
//! object. Decoding goes envelope first, then into [`Payload`], so an unknown
//! `type` or a missing field surfaces as a [`MessageError`] instead of a
//! half-filled message.

use crate::models::{OwnshipState, Solution};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Broadcast,
    Selective,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    ShortSquitter,
    LongSquitter,
    #[serde(rename = "INTEROGATION")]
    Interrogation,
    ResolutionRequest,
    ResolutionResponse,
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("malformed envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error("malformed {kind:?} payload: {source}")]
    Payload {
        kind: MessageType,
        #[source]
        source: serde_json::Error,
    },
    #[error("selective message without receiver")]
    MissingReceiver,
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Own-state broadcast body, shared by short and long squitters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SquitterData {
    /// Altitude in feet MSL
    pub alt: f64,
    pub lat: f64,
    pub long: f64,
    /// Vertical speed in ft/min
    pub vs: f64,
    /// Ground speed in knots
    pub gs: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdg: Option<f64>,
}

impl From<&OwnshipState> for SquitterData {
    fn from(own: &OwnshipState) -> Self {
        Self {
            alt: own.altitude_ft,
            lat: own.lat,
            long: own.lon,
            vs: own.vertical_speed_fpm,
            gs: own.ground_speed_kt,
            hdg: Some(own.heading_deg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResponse {
    pub accept: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    ShortSquitter(SquitterData),
    LongSquitter(SquitterData),
    Interrogation,
    /// Carries the band recommended to the receiver
    ResolutionRequest(Solution),
    ResolutionResponse(ResolutionResponse),
}

impl Payload {
    pub fn kind(&self) -> MessageType {
        match self {
            Payload::ShortSquitter(_) => MessageType::ShortSquitter,
            Payload::LongSquitter(_) => MessageType::LongSquitter,
            Payload::Interrogation => MessageType::Interrogation,
            Payload::ResolutionRequest(_) => MessageType::ResolutionRequest,
            Payload::ResolutionResponse(_) => MessageType::ResolutionResponse,
        }
    }

    fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Payload::ShortSquitter(data) | Payload::LongSquitter(data) => serde_json::to_value(data),
            Payload::Interrogation => Ok(serde_json::Value::Object(Default::default())),
            Payload::ResolutionRequest(solution) => serde_json::to_value(solution),
            Payload::ResolutionResponse(response) => serde_json::to_value(response),
        }
    }

    fn from_value(kind: MessageType, data: serde_json::Value) -> Result<Self, MessageError> {
        let payload = match kind {
            MessageType::ShortSquitter => serde_json::from_value(data).map(Payload::ShortSquitter),
            MessageType::LongSquitter => serde_json::from_value(data).map(Payload::LongSquitter),
            MessageType::Interrogation => Ok(Payload::Interrogation),
            MessageType::ResolutionRequest => {
                serde_json::from_value(data).map(Payload::ResolutionRequest)
            }
            MessageType::ResolutionResponse => {
                serde_json::from_value(data).map(Payload::ResolutionResponse)
            }
        };
        payload.map_err(|source| MessageError::Payload { kind, source })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    mode: Mode,
    address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    receiver: Option<String>,
    #[serde(rename = "type")]
    kind: MessageType,
    #[serde(default)]
    data: serde_json::Value,
}

/// A decoded message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub mode: Mode,
    /// Sender identifier
    pub address: String,
    /// Target identifier, SELECTIVE only
    pub receiver: Option<String>,
    pub payload: Payload,
}

impl Message {
    pub fn broadcast(address: impl Into<String>, payload: Payload) -> Self {
        Self {
            mode: Mode::Broadcast,
            address: address.into(),
            receiver: None,
            payload,
        }
    }

    pub fn selective(
        address: impl Into<String>,
        receiver: impl Into<String>,
        payload: Payload,
    ) -> Self {
        Self {
            mode: Mode::Selective,
            address: address.into(),
            receiver: Some(receiver.into()),
            payload,
        }
    }

    pub fn kind(&self) -> MessageType {
        self.payload.kind()
    }

    /// Topic this message is published on: `<channel_root>/<sender>`.
    pub fn topic(&self, channel_root: &str) -> String {
        format!("{}/{}", channel_root.trim_end_matches('/'), self.address)
    }

    /// Whether a node with `own_id` should process this message.
    ///
    /// Own messages looped back by the bus are dropped, as are selective
    /// messages addressed to someone else.
    pub fn is_for(&self, own_id: &str) -> bool {
        if self.address == own_id {
            return false;
        }
        match self.mode {
            Mode::Broadcast => true,
            Mode::Selective => self.receiver.as_deref() == Some(own_id),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, MessageError> {
        let envelope = Envelope {
            mode: self.mode,
            address: self.address.clone(),
            receiver: self.receiver.clone(),
            kind: self.kind(),
            data: self.payload.to_value()?,
        };
        Ok(serde_json::to_vec(&envelope)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, MessageError> {
        let envelope: Envelope = serde_json::from_slice(bytes).map_err(MessageError::Envelope)?;
        if envelope.mode == Mode::Selective && envelope.receiver.is_none() {
            return Err(MessageError::MissingReceiver);
        }
        let payload = Payload::from_value(envelope.kind, envelope.data)?;
        Ok(Self {
            mode: envelope.mode,
            address: envelope.address,
            receiver: envelope.receiver,
            payload,
        })
    }
}

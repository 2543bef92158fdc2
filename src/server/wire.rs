//! Channel wire format.
//!
//! Every frame is a JSON text message `{"event": "<name>", "data": <payload>}`.
//!
//! | Direction | Event               | Payload                                  |
//! |-----------|---------------------|------------------------------------------|
//! | in        | `user-input`        | `{text, isVoiceInput}`                   |
//! | out       | `text-chunk`        | `{content}`                              |
//! | out       | `audio-chunk`       | `{type: "text", content}`                |
//! | out       | `audio-chunk`       | `{type: "audio", content: <base64 mp3>}` |
//! | out       | `response-complete` | none                                     |
//! | out       | `error`             | `{message}`                              |
//!
//! `AudioBegin` / `AudioEnd` only order events inside the process; they
//! have no frame.  The receiving side reopens audio runs lazily.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::TurnEvent;

/// Errors decoding a frame.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid audio payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Frames sent by the widget / terminal client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    UserInput(UserInput),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    pub text: String,
    #[serde(default)]
    pub is_voice_input: bool,
}

impl ClientMessage {
    pub fn user_input(text: impl Into<String>, voice: bool) -> Self {
        ClientMessage::UserInput(UserInput {
            text: text.into(),
            is_voice_input: voice,
        })
    }

    pub fn decode(frame: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(frame)?)
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Payload of an `audio-chunk` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum AudioPayload {
    /// Sentence text that precedes its audio.
    Text(String),
    /// Base64-encoded audio bytes.
    Audio(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPayload {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Frames sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    TextChunk(ContentPayload),
    AudioChunk(AudioPayload),
    ResponseComplete,
    Error(ErrorPayload),
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error(ErrorPayload {
            message: message.into(),
        })
    }

    /// Frame for `event`, or `None` for in-process markers.
    ///
    /// In voice mode sentence text travels as `audio-chunk {type: "text"}`
    /// so the widget can pair it with the audio that follows.
    pub fn from_turn_event(event: &TurnEvent, voice: bool) -> Option<Self> {
        match event {
            TurnEvent::Text(text) if voice => {
                Some(ServerMessage::AudioChunk(AudioPayload::Text(text.clone())))
            }
            TurnEvent::Text(text) => Some(ServerMessage::TextChunk(ContentPayload {
                content: text.clone(),
            })),
            TurnEvent::AudioChunk(bytes) => Some(ServerMessage::AudioChunk(AudioPayload::Audio(
                STANDARD.encode(bytes),
            ))),
            TurnEvent::AudioBegin | TurnEvent::AudioEnd => None,
            TurnEvent::TurnComplete => Some(ServerMessage::ResponseComplete),
            TurnEvent::TurnError(message) => Some(ServerMessage::error(message.clone())),
        }
    }

    /// Turn event carried by this frame (client side).
    pub fn into_turn_event(self) -> Result<TurnEvent, WireError> {
        Ok(match self {
            ServerMessage::TextChunk(p) => TurnEvent::Text(p.content),
            ServerMessage::AudioChunk(AudioPayload::Text(text)) => TurnEvent::Text(text),
            ServerMessage::AudioChunk(AudioPayload::Audio(b64)) => {
                TurnEvent::AudioChunk(Bytes::from(STANDARD.decode(b64)?))
            }
            ServerMessage::ResponseComplete => TurnEvent::TurnComplete,
            ServerMessage::Error(p) => TurnEvent::TurnError(p.message),
        })
    }

    pub fn decode(frame: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(frame)?)
    }

    pub fn encode(&self) -> String {
        // Plain data enums; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

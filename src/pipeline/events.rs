//! Events produced by one conversational turn.

use bytes::Bytes;

/// One step of a turn, in emission order.
///
/// Produced only by [`TurnOrchestrator`](super::TurnOrchestrator) and
/// consumed by the single subscriber of that turn's channel.  For a spoken
/// sentence the order is always `Text`, `AudioBegin`, `AudioChunk`*,
/// `AudioEnd`; the next sentence's `Text` never precedes the previous
/// sentence's `AudioEnd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// A sentence unit of the reply, exactly as generated (links included).
    Text(String),
    /// Synthesized audio for the preceding `Text` is about to follow.
    AudioBegin,
    /// One fragment of encoded audio, in playback order.
    AudioChunk(Bytes),
    /// No more audio for the preceding `Text`.
    AudioEnd,
    /// The turn finished and the reply was recorded in history.
    TurnComplete,
    /// The turn was aborted by a generation failure.
    TurnError(String),
}

impl TurnEvent {
    /// `true` for `TurnComplete` and `TurnError`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnEvent::TurnComplete | TurnEvent::TurnError(_))
    }

    /// The sentence text carried by a `Text` event.
    pub fn text(&self) -> Option<&str> {
        match self {
            TurnEvent::Text(s) => Some(s),
            _ => None,
        }
    }
}

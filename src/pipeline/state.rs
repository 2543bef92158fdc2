//! Turn state machine.
//!
//! [`TurnState`] tracks where the orchestrator is inside one turn.  The
//! session logs it after every turn; tests read it to check the final state.

// ---------------------------------------------------------------------------
// TurnState
// ---------------------------------------------------------------------------

/// States of a conversational turn.
///
/// The state machine transitions are:
///
/// ```text
/// Idle ──input──▶ Streaming
///                 ──sentence, voice──▶ Synthesizing ──AudioEnd──▶ Streaming
///                 ──sentence, text───▶ Relaying     ──Text──────▶ Streaming
///                 ──deltas done──────▶ Completing ──TurnComplete──▶ Idle
/// Streaming | Synthesizing ──generation error──▶ Failed ──TurnError──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    /// No turn in progress.
    #[default]
    Idle,

    /// Pulling deltas from the text generator.
    Streaming,

    /// Emitting text and synthesized audio for one sentence.
    Synthesizing,

    /// Emitting a text-only sentence.
    Relaying,

    /// Flushing the segmenter and recording the reply in history.
    Completing,

    /// Generation failed; the turn is being aborted.
    Failed,
}

impl TurnState {
    /// Returns `true` while a turn is in flight.
    ///
    /// ```
    /// use ec_voice_bot::pipeline::TurnState;
    ///
    /// assert!(!TurnState::Idle.is_busy());
    /// assert!(TurnState::Streaming.is_busy());
    /// assert!(TurnState::Synthesizing.is_busy());
    /// assert!(!TurnState::Failed.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            TurnState::Streaming
                | TurnState::Synthesizing
                | TurnState::Relaying
                | TurnState::Completing
        )
    }

    /// A short human-readable label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            TurnState::Idle => "Idle",
            TurnState::Streaming => "Streaming",
            TurnState::Synthesizing => "Synthesizing",
            TurnState::Relaying => "Relaying",
            TurnState::Completing => "Completing",
            TurnState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_states() {
        assert!(!TurnState::Idle.is_busy());
        assert!(TurnState::Streaming.is_busy());
        assert!(TurnState::Synthesizing.is_busy());
        assert!(TurnState::Relaying.is_busy());
        assert!(TurnState::Completing.is_busy());
        assert!(!TurnState::Failed.is_busy());
    }

    #[test]
    fn labels() {
        assert_eq!(TurnState::Idle.label(), "Idle");
        assert_eq!(TurnState::Synthesizing.label(), "Synthesizing");
        assert_eq!(TurnState::Relaying.to_string(), "Relaying");
        assert_eq!(TurnState::Failed.label(), "Failed");
    }

    #[test]
    fn default_is_idle() {
        assert_eq!(TurnState::default(), TurnState::Idle);
    }
}

//! Turn pipeline: streamed reply → sentences → text and audio events.
//!
//! # Architecture
//!
//! ```text
//! user input
//!        │
//!        ▼
//! TurnOrchestrator::run_turn()  ← one call per turn, sequential per session
//!        │
//!        ├─ TextGenerator::generate         → Streaming
//!        ├─ SentenceSegmenter::add / flush
//!        ├─ [voice] SpeechSynthesizer        → Synthesizing
//!        └─ [text]                           → Relaying
//!        │
//!        ▼
//! mpsc::Sender<TurnEvent>  ───▶ session forwarder (wire frames)
//! ```

pub mod events;
pub mod orchestrator;
pub mod segmenter;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use events::TurnEvent;
pub use orchestrator::TurnOrchestrator;
pub use segmenter::{is_sentence_end, SentenceSegmenter, SENTENCE_PUNCTUATION};
pub use state::TurnState;

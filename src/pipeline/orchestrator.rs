//! Turn orchestrator: drives one reply from text deltas to ordered events.
//!
//! [`TurnOrchestrator`] pulls deltas from a [`TextGenerator`], cuts them into
//! sentences with a [`SentenceSegmenter`], and for every sentence emits
//! [`TurnEvent`]s on a `tokio::sync::mpsc` channel.
//!
//! # Turn flow
//!
//! ```text
//! run_turn(input)
//!   └─▶ history += user(input)                               [Streaming]
//!         └─▶ generator.generate(input, prior history, system)
//!               └─▶ for each delta → segmenter.add
//!                     ├─ voice → Text, AudioBegin, AudioChunk*, AudioEnd  [Synthesizing]
//!                     └─ text  → Text                                    [Relaying]
//!         └─▶ segmenter.flush → same per-sentence processing
//!         └─▶ history += model(reply), TurnComplete                [Completing]
//!   generation error ─▶ history rolled back, TurnError              [Failed]
//! ```
//!
//! Sentences are processed strictly one after another: the next sentence's
//! synthesis does not start before the current sentence's `AudioEnd` has
//! been handed to the channel.  A synthesis failure only costs that
//! sentence its audio.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;

use crate::catalog::Catalog;
use crate::config::SegmenterConfig;
use crate::llm::{ConversationHistory, LlmError, PromptBuilder, TextGenerator, TextStream};
use crate::tts::{strip_markdown_links, SpeechSynthesizer};

use super::events::TurnEvent;
use super::segmenter::SentenceSegmenter;
use super::state::TurnState;

// ---------------------------------------------------------------------------
// EventSink
// ---------------------------------------------------------------------------

/// Sender side of a turn's event channel.
///
/// Once the receiver is gone every further event is discarded.
struct EventSink<'a> {
    tx: &'a mpsc::Sender<TurnEvent>,
    connected: bool,
}

impl<'a> EventSink<'a> {
    fn new(tx: &'a mpsc::Sender<TurnEvent>) -> Self {
        Self {
            tx,
            connected: !tx.is_closed(),
        }
    }

    async fn emit(&mut self, event: TurnEvent) {
        if !self.connected {
            return;
        }
        if self.tx.send(event).await.is_err() {
            log::debug!("turn: consumer gone, discarding further events");
            self.connected = false;
        }
    }
}

// ---------------------------------------------------------------------------
// TurnOrchestrator
// ---------------------------------------------------------------------------

/// Sequences conversational turns for one channel session.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
/// use ec_voice_bot::catalog::{Catalog, SheetsSource};
/// use ec_voice_bot::config::AppConfig;
/// use ec_voice_bot::llm::{ConversationHistory, GeminiGenerator};
/// use ec_voice_bot::pipeline::TurnOrchestrator;
/// use ec_voice_bot::tts::ElevenLabsSynthesizer;
///
/// # async fn example() {
/// let config = AppConfig::default();
/// let catalog = Arc::new(Catalog::new(Arc::new(SheetsSource::from_config(&config.catalog))));
/// let mut orchestrator = TurnOrchestrator::new(
///     Arc::new(GeminiGenerator::from_config(&config.llm)),
///     Arc::new(ElevenLabsSynthesizer::from_config(&config.tts)),
///     catalog,
///     config.llm.product_context_limit,
///     config.segmenter.clone(),
/// );
///
/// let mut history = ConversationHistory::new();
/// let (tx, mut rx) = mpsc::channel(64);
/// tokio::spawn(async move {
///     while let Some(event) = rx.recv().await {
///         println!("{event:?}");
///     }
/// });
/// orchestrator.run_turn("おすすめを教えて", &mut history, true, &tx).await;
/// # }
/// ```
pub struct TurnOrchestrator {
    generator: Arc<dyn TextGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    catalog: Arc<Catalog>,
    prompt: PromptBuilder,
    segmenter: SegmenterConfig,
    state: TurnState,
}

impl TurnOrchestrator {
    /// Create a new orchestrator.
    ///
    /// # Arguments
    ///
    /// * `generator`    : text generator (e.g. `GeminiGenerator`).
    /// * `synthesizer`  : speech synthesizer (e.g. `ElevenLabsSynthesizer`).
    /// * `catalog`      : product list rendered into the system context.
    /// * `product_limit`: maximum products listed in the system context.
    /// * `segmenter`    : sentence segmentation policy.
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        catalog: Arc<Catalog>,
        product_limit: usize,
        segmenter: SegmenterConfig,
    ) -> Self {
        Self {
            generator,
            synthesizer,
            catalog,
            prompt: PromptBuilder::new(product_limit),
            segmenter,
            state: TurnState::Idle,
        }
    }

    /// Current state of the turn state machine.
    pub fn state(&self) -> TurnState {
        self.state
    }

    // -----------------------------------------------------------------------
    // Turn
    // -----------------------------------------------------------------------

    /// Run one turn and emit its events on `events`, terminated by exactly
    /// one `TurnComplete` or `TurnError`.
    ///
    /// The input is appended to `history` before generation.  On success the
    /// full reply is appended as a model entry; on a generation failure the
    /// input entry is removed again so the turn leaves `history` unchanged.
    pub async fn run_turn(
        &mut self,
        input: &str,
        history: &mut ConversationHistory,
        voice: bool,
        events: &mpsc::Sender<TurnEvent>,
    ) {
        let mut sink = EventSink::new(events);
        self.set_state(TurnState::Streaming);
        log::info!("turn: input received (voice={voice}, {} chars)", input.chars().count());

        let checkpoint = history.len();
        history.push_user(input);

        let system = self.prompt.build_system(&self.catalog.products());
        let prior = &history.entries()[..checkpoint];

        let result = match self.generator.generate(input, prior, &system).await {
            Ok(deltas) => self.stream_reply(deltas, voice, &mut sink).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(reply) => {
                self.set_state(TurnState::Completing);
                history.push_model(reply);
                sink.emit(TurnEvent::TurnComplete).await;
            }
            Err(e) => {
                self.set_state(TurnState::Failed);
                log::error!("turn: generation failed: {e}");
                history.truncate(checkpoint);
                sink.emit(TurnEvent::TurnError(format!("Processing error: {e}")))
                    .await;
            }
        }

        self.set_state(TurnState::Idle);
    }

    /// Consume the delta stream, processing sentences as they complete.
    /// Returns the full, unmodified reply text.
    async fn stream_reply(
        &mut self,
        mut deltas: TextStream,
        voice: bool,
        sink: &mut EventSink<'_>,
    ) -> Result<String, LlmError> {
        let mut segmenter = match self.segmenter.max_pending_chars {
            Some(max) => SentenceSegmenter::with_max_pending(max),
            None => SentenceSegmenter::new(),
        };
        let mut reply = String::new();

        while let Some(delta) = deltas.next().await {
            let delta = delta?;
            reply.push_str(&delta);
            for sentence in segmenter.add(&delta) {
                self.process_sentence(&sentence, voice, sink).await;
            }
        }

        if let Some(rest) = segmenter.flush() {
            self.process_sentence(&rest, voice, sink).await;
        }
        Ok(reply)
    }

    // -----------------------------------------------------------------------
    // Sentence processing
    // -----------------------------------------------------------------------

    async fn process_sentence(&mut self, sentence: &str, voice: bool, sink: &mut EventSink<'_>) {
        if !voice {
            self.set_state(TurnState::Relaying);
            sink.emit(TurnEvent::Text(sentence.to_string())).await;
            self.set_state(TurnState::Streaming);
            return;
        }

        self.set_state(TurnState::Synthesizing);
        sink.emit(TurnEvent::Text(sentence.to_string())).await;
        if sink.connected {
            self.speak(sentence, sink).await;
        }
        self.set_state(TurnState::Streaming);
    }

    /// Emit `AudioBegin`, the synthesized fragments, and `AudioEnd` for one
    /// sentence.  Failures are logged and leave the sentence text-only.
    async fn speak(&self, sentence: &str, sink: &mut EventSink<'_>) {
        let speech = strip_markdown_links(sentence);

        let mut audio = match self.synthesizer.synthesize(&speech).await {
            Ok(audio) => audio,
            Err(e) => {
                log::warn!("turn: synthesis failed, sentence stays text-only: {e}");
                return;
            }
        };

        sink.emit(TurnEvent::AudioBegin).await;
        let mut total = 0usize;
        while let Some(chunk) = audio.next().await {
            match chunk {
                Ok(bytes) if bytes.is_empty() => {}
                Ok(bytes) => {
                    total += bytes.len();
                    sink.emit(TurnEvent::AudioChunk(bytes)).await;
                }
                Err(e) => {
                    log::warn!("turn: audio stream broke off after {total} bytes: {e}");
                    break;
                }
            }
        }
        sink.emit(TurnEvent::AudioEnd).await;
        log::debug!("turn: sentence synthesized ({total} bytes)");
    }

    fn set_state(&mut self, state: TurnState) {
        if self.state != state {
            log::debug!("turn: {} → {}", self.state, state);
        }
        self.state = state;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

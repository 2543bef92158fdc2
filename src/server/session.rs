//! One WebSocket channel session.
//!
//! A session owns its [`ConversationHistory`] and [`TurnOrchestrator`];
//! nothing but the catalog is shared with other sessions.  Inbound frames
//! are handled one at a time, so turns never overlap.  While a turn runs,
//! its events are forwarded to the socket writer concurrently.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::llm::ConversationHistory;
use crate::pipeline::{TurnEvent, TurnOrchestrator, TurnState};

use super::wire::{ClientMessage, ServerMessage};
use super::AppState;

const EVENT_BUFFER: usize = 64;
const OUTBOUND_BUFFER: usize = 64;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct Session {
    orchestrator: TurnOrchestrator,
    history: ConversationHistory,
}

impl Session {
    pub fn new(orchestrator: TurnOrchestrator) -> Self {
        Self {
            orchestrator,
            history: ConversationHistory::new(),
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn state(&self) -> TurnState {
        self.orchestrator.state()
    }

    /// Handle one inbound text frame, writing outbound frames to `out`.
    ///
    /// Returns once the turn it started (if any) has finished.
    pub async fn handle_frame(&mut self, frame: &str, out: &mpsc::Sender<ServerMessage>) {
        let input = match ClientMessage::decode(frame) {
            Ok(ClientMessage::UserInput(input)) => input,
            Err(e) => {
                log::warn!("session: {e}");
                let _ = out.send(ServerMessage::error(format!("Invalid message: {e}"))).await;
                return;
            }
        };

        let text = input.text.trim();
        if text.is_empty() {
            log::debug!("session: rejecting blank input");
            let _ = out.send(ServerMessage::error("Processing error: empty message")).await;
            return;
        }

        let voice = input.is_voice_input;
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let turn = async {
            self.orchestrator
                .run_turn(text, &mut self.history, voice, &events_tx)
                .await;
            drop(events_tx);
        };
        tokio::join!(turn, forward(events_rx, out, voice));
        log::debug!(
            "session: turn finished in state {} ({} history entries)",
            self.orchestrator.state(),
            self.history.len()
        );
    }
}

/// Translate turn events into frames until the turn ends or the writer is
/// gone.  Dropping `events` early makes the orchestrator discard the rest.
async fn forward(mut events: mpsc::Receiver<TurnEvent>, out: &mpsc::Sender<ServerMessage>, voice: bool) {
    while let Some(event) = events.recv().await {
        let Some(frame) = ServerMessage::from_turn_event(&event, voice) else {
            continue;
        };
        if out.send(frame).await.is_err() {
            log::debug!("session: writer gone, dropping remaining turn events");
            return;
        }
    }
}

// ---------------------------------------------------------------------------
// Socket loop
// ---------------------------------------------------------------------------

/// Drive `socket` until the client disconnects.
pub async fn run(socket: WebSocket, state: Arc<AppState>) {
    log::info!("session: client connected");
    let (mut sink, mut stream) = socket.split();

    let (out_tx, mut out_rx) = mpsc::channel::<ServerMessage>(OUTBOUND_BUFFER);
    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if let Err(e) = sink.send(Message::Text(frame.encode())).await {
                log::debug!("session: send failed: {e}");
                break;
            }
        }
    });

    let mut session = Session::new(state.orchestrator());
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => session.handle_frame(&text, &out_tx).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                log::debug!("session: receive failed: {e}");
                break;
            }
        }
        if out_tx.is_closed() {
            break;
        }
    }

    drop(out_tx);
    let _ = writer.await;
    log::info!(
        "session: client disconnected after {} history entries",
        session.history().len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CatalogError, News, Product, RecordSource};
    use crate::config::SegmenterConfig;
    use crate::llm::{HistoryEntry, LlmError, TextGenerator, TextStream};
    use crate::server::wire::{AudioPayload, ContentPayload};
    use crate::tts::{AudioStream, SpeechSynthesizer, TtsError};
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures_util::stream;

    struct Echo;

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate(
            &self,
            prompt: &str,
            _history: &[HistoryEntry],
            _system_context: &str,
        ) -> Result<TextStream, LlmError> {
            if prompt == "fail" {
                return Err(LlmError::Timeout);
            }
            let reply = format!("「{prompt}」ですね。");
            Ok(Box::pin(stream::iter(vec![Ok(reply)])))
        }
    }

    struct Beep;

    #[async_trait]
    impl SpeechSynthesizer for Beep {
        async fn synthesize(&self, _text: &str) -> Result<AudioStream, TtsError> {
            Ok(Box::pin(stream::iter(vec![Ok(Bytes::from_static(b"ID3"))])))
        }
    }

    struct Empty;

    #[async_trait]
    impl RecordSource for Empty {
        async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
            Ok(Vec::new())
        }
        async fn fetch_news(&self) -> Result<Vec<News>, CatalogError> {
            Ok(Vec::new())
        }
    }

    fn session() -> Session {
        Session::new(TurnOrchestrator::new(
            Arc::new(Echo),
            Arc::new(Beep),
            Arc::new(Catalog::new(Arc::new(Empty))),
            500,
            SegmenterConfig::default(),
        ))
    }

    async fn frames(session: &mut Session, inbound: &[&str]) -> Vec<ServerMessage> {
        let (tx, mut rx) = mpsc::channel(64);
        for frame in inbound {
            session.handle_frame(frame, &tx).await;
        }
        drop(tx);
        let mut out = Vec::new();
        while let Some(msg) = rx.recv().await {
            out.push(msg);
        }
        out
    }

    #[tokio::test]
    async fn voice_turn_frames() {
        let mut s = session();
        let out = frames(
            &mut s,
            &[r#"{"event":"user-input","data":{"text":"こんにちは","isVoiceInput":true}}"#],
        )
        .await;
        assert_eq!(
            out,
            vec![
                ServerMessage::AudioChunk(AudioPayload::Text("「こんにちは」ですね。".into())),
                ServerMessage::AudioChunk(AudioPayload::Audio("SUQz".into())),
                ServerMessage::ResponseComplete,
            ]
        );
    }

    #[tokio::test]
    async fn text_turn_frames() {
        let mut s = session();
        let out = frames(
            &mut s,
            &[r#"{"event":"user-input","data":{"text":"こんにちは","isVoiceInput":false}}"#],
        )
        .await;
        assert_eq!(
            out,
            vec![
                ServerMessage::TextChunk(ContentPayload {
                    content: "「こんにちは」ですね。".into()
                }),
                ServerMessage::ResponseComplete,
            ]
        );
    }

    #[tokio::test]
    async fn malformed_frame_reports_error_and_session_continues() {
        let mut s = session();
        let out = frames(
            &mut s,
            &[
                "{oops",
                r#"{"event":"user-input","data":{"text":"次","isVoiceInput":false}}"#,
            ],
        )
        .await;
        assert!(matches!(&out[0], ServerMessage::Error(p) if p.message.starts_with("Invalid message")));
        assert_eq!(out.last(), Some(&ServerMessage::ResponseComplete));
        assert_eq!(s.history().len(), 2);
    }

    #[tokio::test]
    async fn blank_input_gets_an_error_frame() {
        let mut s = session();
        let out = frames(&mut s, &[r#"{"event":"user-input","data":{"text":"   "}}"#]).await;
        assert_eq!(out, vec![ServerMessage::error("Processing error: empty message")]);
        assert!(s.history().is_empty());
    }

    #[tokio::test]
    async fn orchestrator_is_idle_between_turns() {
        let mut s = session();
        frames(
            &mut s,
            &[r#"{"event":"user-input","data":{"text":"fail","isVoiceInput":false}}"#],
        )
        .await;
        assert_eq!(s.state(), TurnState::Idle);
        frames(
            &mut s,
            &[r#"{"event":"user-input","data":{"text":"一","isVoiceInput":true}}"#],
        )
        .await;
        assert_eq!(s.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn turns_accumulate_history_in_order() {
        let mut s = session();
        frames(
            &mut s,
            &[
                r#"{"event":"user-input","data":{"text":"一","isVoiceInput":false}}"#,
                r#"{"event":"user-input","data":{"text":"fail","isVoiceInput":false}}"#,
                r#"{"event":"user-input","data":{"text":"二","isVoiceInput":false}}"#,
            ],
        )
        .await;
        let contents: Vec<&str> = s.history().entries().iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["一", "「一」ですね。", "二", "「二」ですね。"]);
    }

    #[tokio::test]
    async fn generation_failure_frame() {
        let mut s = session();
        let out = frames(
            &mut s,
            &[r#"{"event":"user-input","data":{"text":"fail","isVoiceInput":true}}"#],
        )
        .await;
        assert_eq!(out.len(), 1);
        assert!(matches!(&out[0], ServerMessage::Error(p) if p.message.starts_with("Processing error: ")));
    }
}

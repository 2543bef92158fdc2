//! Terminal client for the channel server.
//!
//! Reads one message per stdin line, prints reply text as it streams in and
//! plays reply audio through a [`PipePlayer`] driven by a
//! [`PlaybackIngestor`].  Socket frames, stdin lines and player
//! notifications are multiplexed on one task with `tokio::select!`, so the
//! ingestor is only ever touched from a single place.

pub mod pipe_player;

use std::io::Write;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::config::ClientConfig;
use crate::pipeline::TurnEvent;
use crate::playback::{PlaybackIngestor, PlaybackResource, ResourceNotification};
use crate::server::{ClientMessage, ServerMessage};

pub use pipe_player::PipePlayer;

/// Connect to `config.server_url` and run until stdin closes and every sent
/// message has been answered, or until the server hangs up.
pub async fn run(config: &ClientConfig) -> anyhow::Result<()> {
    let (ws, _) = tokio_tungstenite::connect_async(config.server_url.as_str())
        .await
        .with_context(|| format!("failed to connect to {}", config.server_url))?;
    log::info!("client: connected to {}", config.server_url);
    let (mut sink, mut stream) = ws.split();

    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel();
    let mut ingestor = PlaybackIngestor::new(PipePlayer::new(config.player_command.clone(), notify_tx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut pending_turns = 0usize;

    loop {
        if !stdin_open && pending_turns == 0 {
            break;
        }
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line.context("failed to read stdin")? {
                    Some(line) => {
                        let text = line.trim();
                        if text.is_empty() {
                            continue;
                        }
                        let frame = serde_json::to_string(&ClientMessage::user_input(text, config.voice))?;
                        sink.send(Message::Text(frame)).await.context("failed to send message")?;
                        pending_turns += 1;
                    }
                    None => stdin_open = false,
                }
            }
            message = stream.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(event) = decode_frame(&text) {
                            if event.is_terminal() {
                                pending_turns = pending_turns.saturating_sub(1);
                            }
                            show(&event);
                            ingestor.on_event(&event);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        log::info!("client: server closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        ingestor.shutdown();
                        return Err(e).context("connection lost");
                    }
                }
            }
            Some(note) = notify_rx.recv() => ingestor.on_notification(note),
        }
    }

    let _ = sink.send(Message::Close(None)).await;
    drain_playback(&mut ingestor, &mut notify_rx).await;
    ingestor.shutdown();
    ingestor.into_resource().wait().await;
    Ok(())
}

fn decode_frame(text: &str) -> Option<TurnEvent> {
    match ServerMessage::decode(text).and_then(ServerMessage::into_turn_event) {
        Ok(event) => Some(event),
        Err(e) => {
            log::warn!("client: {e}");
            None
        }
    }
}

fn show(event: &TurnEvent) {
    let mut out = std::io::stdout().lock();
    let _ = match event {
        TurnEvent::Text(text) => write!(out, "{text}"),
        TurnEvent::TurnComplete => writeln!(out),
        TurnEvent::TurnError(message) => writeln!(out, "\n[{message}]"),
        TurnEvent::AudioBegin | TurnEvent::AudioEnd | TurnEvent::AudioChunk(_) => return,
    };
    let _ = out.flush();
}

/// Keep feeding player notifications until every received fragment has
/// been handed to the player.
async fn drain_playback<R: PlaybackResource>(
    ingestor: &mut PlaybackIngestor<R>,
    notifications: &mut mpsc::UnboundedReceiver<ResourceNotification>,
) {
    while !ingestor.is_drained() {
        match notifications.recv().await {
            Some(note) => ingestor.on_notification(note),
            None => break,
        }
    }
}

//! Core `TextGenerator` trait and its error type.
//!
//! A generator turns a prompt plus the prior history into a lazy, finite
//! stream of text deltas.  The stream is consumed once; it cannot be
//! restarted.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use thiserror::Error;

use crate::llm::history::HistoryEntry;

// ---------------------------------------------------------------------------
// LlmError
// ---------------------------------------------------------------------------

/// Errors that can occur during text generation.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key is configured for the backend.
    #[error("GEMINI_API_KEY is missing")]
    MissingApiKey,

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete in time.
    #[error("generation request timed out")]
    Timeout,

    /// The backend answered with a non-success status.
    #[error("generation API error {status}: {body}")]
    Status { status: u16, body: String },

    /// A streamed payload could not be parsed.
    #[error("failed to parse generation response: {0}")]
    Parse(String),

    /// The backend refused to continue (e.g. safety block).
    #[error("generation stopped: {0}")]
    Blocked(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(e.to_string())
        }
    }
}

/// Lazy sequence of text deltas.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

// ---------------------------------------------------------------------------
// TextGenerator trait
// ---------------------------------------------------------------------------

/// Async trait for streaming text generation.
///
/// Implementors must be `Send + Sync` so they can be shared across sessions
/// behind an `Arc<dyn TextGenerator>`.
///
/// # Arguments
/// * `prompt`         – The new user input.
/// * `history`        – Prior turns, oldest first (not including `prompt`).
/// * `system_context` – Instruction text describing persona and catalog.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        history: &[HistoryEntry],
        system_context: &str,
    ) -> Result<TextStream, LlmError>;
}

// Compile-time assertion: Box<dyn TextGenerator> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn TextGenerator>) {}
};

//! Core `SpeechSynthesizer` trait and its error type.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use thiserror::Error;

// ---------------------------------------------------------------------------
// TtsError
// ---------------------------------------------------------------------------

/// Errors that can occur during speech synthesis.
#[derive(Debug, Error)]
pub enum TtsError {
    /// No API key is configured for the backend.
    #[error("ELEVENLABS_API_KEY is missing")]
    MissingApiKey,

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("TTS API error {status}: {body}")]
    Status { status: u16, body: String },

    /// The audio byte stream broke off.
    #[error("audio stream interrupted: {0}")]
    Stream(String),
}

impl From<reqwest::Error> for TtsError {
    fn from(e: reqwest::Error) -> Self {
        TtsError::Request(e.to_string())
    }
}

/// Lazy sequence of encoded audio fragments.
pub type AudioStream = Pin<Box<dyn Stream<Item = Result<Bytes, TtsError>> + Send>>;

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

/// Async trait for streaming text-to-speech.
///
/// The returned stream is finite and consumed once.  Fragment boundaries are
/// arbitrary; only their order matters.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioStream, TtsError>;
}

// Compile-time assertion: Box<dyn SpeechSynthesizer> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechSynthesizer>) {}
};

//! `ElevenLabsSynthesizer`: streaming MP3 synthesis.
//!
//! Calls `POST {base_url}/v1/text-to-speech/{voice_id}/stream` and hands the
//! response body through as an [`AudioStream`] without buffering it.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use serde_json::{json, Value};

use crate::config::TtsConfig;
use crate::tts::synthesizer::{AudioStream, SpeechSynthesizer, TtsError};

/// Production synthesizer backed by the ElevenLabs streaming endpoint.
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    config: TtsConfig,
}

impl ElevenLabsSynthesizer {
    /// Build a synthesizer from application config.
    pub fn from_config(config: &TtsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/text-to-speech/{}/stream?output_format={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.voice_id,
            self.config.output_format
        )
    }

    /// JSON request body for `text`.
    pub fn request_body(&self, text: &str) -> Value {
        json!({
            "text": text,
            "model_id": self.config.model_id,
            "voice_settings": {
                "stability": self.config.stability,
                "similarity_boost": self.config.similarity_boost,
            },
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioStream, TtsError> {
        let key = self.config.api_key.as_deref().unwrap_or("");
        if key.is_empty() {
            return Err(TtsError::MissingApiKey);
        }

        let text = text.trim();
        if text.is_empty() {
            return Ok(Box::pin(stream::empty::<Result<Bytes, TtsError>>()));
        }

        let response = self
            .client
            .post(self.endpoint())
            .header("xi-api-key", key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&self.request_body(text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let audio = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TtsError::Stream(e.to_string())));
        Ok(Box::pin(audio))
    }
}

//! `GeminiGenerator`: streaming text generation against the Gemini API.
//!
//! Calls `POST {base_url}/v1beta/models/{model}:streamGenerateContent?alt=sse`
//! and yields the text of every streamed candidate as one delta.  All
//! connection details come from [`LlmConfig`].

use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::config::LlmConfig;
use crate::llm::generator::{LlmError, TextGenerator, TextStream};
use crate::llm::history::HistoryEntry;
use crate::llm::prompt::PRIMER_ACK;
use crate::llm::sse::SseDecoder;

/// Buffered deltas between the HTTP reader task and the consumer.
const DELTA_CHANNEL_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// GeminiGenerator
// ---------------------------------------------------------------------------

/// Streams replies from a Gemini model.
///
/// The conversation is primed with the system context as a user entry and
/// [`PRIMER_ACK`] as the model's reply, followed by the history and the new
/// prompt.
pub struct GeminiGenerator {
    client: reqwest::Client,
    config: LlmConfig,
}

impl GeminiGenerator {
    /// Build a generator from application config.
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// JSON request body for one generation call.
    pub fn request_body(
        &self,
        prompt: &str,
        history: &[HistoryEntry],
        system_context: &str,
    ) -> Value {
        let mut contents = Vec::with_capacity(history.len() + 3);
        contents.push(content("user", system_context));
        contents.push(content("model", PRIMER_ACK));
        for entry in history {
            contents.push(content(entry.role.as_str(), &entry.content));
        }
        contents.push(content("user", prompt));

        json!({
            "contents": contents,
            "generationConfig": { "temperature": self.config.temperature },
        })
    }
}

fn content(role: &str, text: &str) -> Value {
    json!({ "role": role, "parts": [{ "text": text }] })
}

/// Extract the delta text from one streamed `GenerateContentResponse`.
///
/// Returns `Ok(None)` for payloads that carry no text (e.g. usage metadata).
pub fn parse_stream_payload(data: &str) -> Result<Option<String>, LlmError> {
    let value: Value = serde_json::from_str(data).map_err(|e| LlmError::Parse(e.to_string()))?;

    if let Some(err) = value.get("error") {
        let message = err["message"].as_str().unwrap_or("unknown error");
        return Err(LlmError::Parse(message.to_string()));
    }
    if let Some(reason) = value["promptFeedback"]["blockReason"].as_str() {
        return Err(LlmError::Blocked(reason.to_string()));
    }

    let text: String = value["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
        .unwrap_or_default();

    Ok((!text.is_empty()).then_some(text))
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(
        &self,
        prompt: &str,
        history: &[HistoryEntry],
        system_context: &str,
    ) -> Result<TextStream, LlmError> {
        let key = self.config.api_key.as_deref().unwrap_or("");
        if key.is_empty() {
            log::error!("gemini: GEMINI_API_KEY is missing");
            return Err(LlmError::MissingApiKey);
        }

        let body = self.request_body(prompt, history, system_context);
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("gemini: HTTP {status}: {body}");
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }
        log::debug!("gemini: stream established ({})", self.config.model);

        let (tx, rx) = mpsc::channel(DELTA_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut decoder = SseDecoder::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(LlmError::from(e))).await;
                        return;
                    }
                };
                for payload in decoder.push(&chunk) {
                    if !forward_payload(&tx, &payload).await {
                        return;
                    }
                }
            }
            if let Some(payload) = decoder.finish() {
                forward_payload(&tx, &payload).await;
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// Send one parsed payload downstream.  Returns `false` when the stream
/// should stop (parse error or receiver gone).
async fn forward_payload(tx: &mpsc::Sender<Result<String, LlmError>>, payload: &str) -> bool {
    match parse_stream_payload(payload) {
        Ok(Some(text)) => tx.send(Ok(text)).await.is_ok(),
        Ok(None) => true,
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Text generation for the bookseller conversation.
//!
//! This module provides:
//! * [`TextGenerator`]: async trait implemented by all generator backends.
//! * [`GeminiGenerator`]: streaming Gemini backend (production).
//! * [`PromptBuilder`]: persona + product-list system context.
//! * [`ConversationHistory`]: per-session `(role, content)` history.
//! * [`SseDecoder`]: incremental server-sent-events line decoder.
//! * [`LlmError`]: error variants for generation.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use futures_util::StreamExt;
//! use ec_voice_bot::config::AppConfig;
//! use ec_voice_bot::llm::{GeminiGenerator, PromptBuilder, TextGenerator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let generator = GeminiGenerator::from_config(&config.llm);
//!     let system = PromptBuilder::new(config.llm.product_context_limit).build_system(&[]);
//!
//!     let mut deltas = generator.generate("おすすめを教えて", &[], &system).await.unwrap();
//!     while let Some(delta) = deltas.next().await {
//!         print!("{}", delta.unwrap());
//!     }
//! }
//! ```

pub mod gemini;
pub mod generator;
pub mod history;
pub mod prompt;
pub mod sse;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use gemini::GeminiGenerator;
pub use generator::{LlmError, TextGenerator, TextStream};
pub use history::{ConversationHistory, HistoryEntry, Role};
pub use prompt::PromptBuilder;
pub use sse::SseDecoder;

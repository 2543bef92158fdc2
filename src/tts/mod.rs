//! Speech synthesis for spoken replies.
//!
//! * [`SpeechSynthesizer`]: async trait: text → stream of encoded audio.
//! * [`ElevenLabsSynthesizer`]: streaming ElevenLabs backend (MP3).
//! * [`strip_markdown_links`]: removes link targets before synthesis.
//! * [`TtsError`]: error variants for synthesis.

pub mod elevenlabs;
pub mod markup;
pub mod synthesizer;

pub use elevenlabs::ElevenLabsSynthesizer;
pub use markup::strip_markdown_links;
pub use synthesizer::{AudioStream, SpeechSynthesizer, TtsError};

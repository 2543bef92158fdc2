//! EC voice bot: streaming text + speech replies for a bookshop chat widget.
//!
//! A reply streams from the text generator, is cut into sentences, and each
//! sentence is sent as text and (in voice mode) synthesized audio, in order,
//! over a WebSocket channel.  A terminal client consumes the same channel
//! and plays the audio through an external player.

pub mod catalog;
pub mod client;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod playback;
pub mod server;
pub mod tts;

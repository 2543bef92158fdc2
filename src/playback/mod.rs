//! Client-side playback: queueing audio fragments into a playback resource.
//!
//! The resource is abstract ([`PlaybackResource`]) so the state machine in
//! [`PlaybackIngestor`] runs the same against a real player process and a
//! scripted fake in tests.

pub mod ingestor;
pub mod resource;

pub use ingestor::{BufferState, PlaybackIngestor};
pub use resource::{PlaybackError, PlaybackResource, ResourceNotification};

//! Playback buffer resource contract.
//!
//! A [`PlaybackResource`] accepts encoded audio fragments one at a time and
//! turns them into a continuously playing signal.  Its operations only
//! *start* work; completion is reported back asynchronously as a
//! [`ResourceNotification`], which the owner feeds into
//! [`PlaybackIngestor::on_notification`](super::PlaybackIngestor::on_notification).

use bytes::Bytes;
use thiserror::Error;

/// Errors raised synchronously by a playback resource.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The resource could not be allocated.
    #[error("failed to open playback resource: {0}")]
    Open(String),

    /// An operation was attempted before `open` or after `close`.
    #[error("playback resource is not open")]
    NotOpen,

    /// The resource refused a fragment.
    #[error("append rejected: {0}")]
    Append(String),

    /// Playback could not be started.
    #[error("failed to start playback: {0}")]
    Play(String),
}

/// Asynchronous notifications emitted by a playback resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceNotification {
    /// `open` finished; fragments may now be appended.
    Opened,
    /// The last submitted fragment has been consumed; ready for more data.
    AppendComplete,
    /// The resource shut down and accepts nothing further.
    Closed,
    /// A resource-level failure; the resource may still accept data.
    Error(String),
}

/// Consumer-side sink for sequential audio fragments.
///
/// Implementations must not be handed a second fragment before reporting
/// [`ResourceNotification::AppendComplete`] (or `Error`) for the first;
/// the ingestor guarantees this.
pub trait PlaybackResource {
    /// Begin allocating the buffer.  Success is reported as `Opened`.
    fn open(&mut self) -> Result<(), PlaybackError>;

    /// Submit one fragment.  Completion is reported as `AppendComplete`.
    fn append(&mut self, fragment: Bytes) -> Result<(), PlaybackError>;

    /// Whether output is currently paused.
    fn is_paused(&self) -> bool;

    /// (Re)start output.
    fn play(&mut self) -> Result<(), PlaybackError>;

    /// Release the buffer.
    fn close(&mut self);
}

//! `PlaybackResource` backed by an external player process.
//!
//! Fragments are written to the child's stdin; the player (by default
//! `ffplay`) decodes the concatenated MP3 stream and plays it as it
//! arrives.  Completion of each write is reported on the notification
//! channel handed to [`PipePlayer::new`].

use std::process::Stdio;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, Mutex};

use crate::playback::{PlaybackError, PlaybackResource, ResourceNotification};

pub struct PipePlayer {
    command: Vec<String>,
    child: Option<Child>,
    stdin: Option<Arc<Mutex<ChildStdin>>>,
    notify: mpsc::UnboundedSender<ResourceNotification>,
    started: bool,
}

impl PipePlayer {
    /// `command[0]` is the program, the rest its arguments.
    pub fn new(command: Vec<String>, notify: mpsc::UnboundedSender<ResourceNotification>) -> Self {
        Self {
            command,
            child: None,
            stdin: None,
            notify,
            started: false,
        }
    }

    /// Close stdin and wait for the player to exit on its own.
    ///
    /// Call after the ingestor has drained; audio already written keeps
    /// playing until the player reaches the end of its input.
    pub async fn wait(&mut self) {
        self.stdin = None;
        let Some(mut child) = self.child.take() else {
            return;
        };
        match child.wait().await {
            Ok(status) => log::debug!("playback: player exited ({status})"),
            Err(e) => log::warn!("playback: failed to wait for player: {e}"),
        }
    }
}

impl PlaybackResource for PipePlayer {
    fn open(&mut self) -> Result<(), PlaybackError> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| PlaybackError::Open("empty player command".into()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlaybackError::Open(format!("{program}: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| PlaybackError::Open("player stdin unavailable".into()))?;

        log::info!("playback: started {program}");
        self.stdin = Some(Arc::new(Mutex::new(stdin)));
        self.child = Some(child);
        let _ = self.notify.send(ResourceNotification::Opened);
        Ok(())
    }

    fn append(&mut self, fragment: Bytes) -> Result<(), PlaybackError> {
        let stdin = self.stdin.clone().ok_or(PlaybackError::NotOpen)?;
        let notify = self.notify.clone();
        tokio::spawn(async move {
            let mut pipe = stdin.lock().await;
            let result = match pipe.write_all(&fragment).await {
                Ok(()) => pipe.flush().await,
                Err(e) => Err(e),
            };
            let note = match result {
                Ok(()) => ResourceNotification::AppendComplete,
                Err(e) => ResourceNotification::Error(format!("player write failed: {e}")),
            };
            let _ = notify.send(note);
        });
        Ok(())
    }

    /// The player starts on its own once data arrives; this only tracks
    /// whether that first data has been handed over.
    fn is_paused(&self) -> bool {
        !self.started
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        if self.stdin.is_none() {
            return Err(PlaybackError::NotOpen);
        }
        self.started = true;
        Ok(())
    }

    fn close(&mut self) {
        // EOF on stdin lets the player finish what it was given and exit.
        self.stdin = None;
        self.started = false;
        let _ = self.notify.send(ResourceNotification::Closed);
    }
}

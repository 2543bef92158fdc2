//! Playback ingestor: turns the audio portion of a `TurnEvent` stream into
//! continuous playback.
//!
//! # State machine
//!
//! ```text
//! Uninitialized ──AudioBegin / first chunk──▶ Opening ──Opened──▶ Ready
//!       │                                        │                  │
//!       └──────────── open failure ──────────────┴──── Closed ──────┴──▶ Closed
//! ```
//!
//! The buffer persists across turns: `TurnComplete` / `TurnError` do not
//! reset it, only [`PlaybackIngestor::shutdown`] or a `Closed`
//! notification reach `Closed`.
//!
//! Fragments are queued unconditionally and drained one at a time: a new
//! append is only submitted once the previous one reported completion.

use std::collections::VecDeque;

use bytes::Bytes;

use crate::pipeline::TurnEvent;

use super::resource::{PlaybackResource, ResourceNotification};

/// Lifecycle of the playback buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferState {
    #[default]
    Uninitialized,
    Opening,
    Ready,
    Closed,
}

/// Single-threaded playback state machine over a [`PlaybackResource`].
pub struct PlaybackIngestor<R: PlaybackResource> {
    resource: R,
    state: BufferState,
    appending: bool,
    queue: VecDeque<Bytes>,
}

impl<R: PlaybackResource> PlaybackIngestor<R> {
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            state: BufferState::Uninitialized,
            appending: false,
            queue: VecDeque::new(),
        }
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    /// `true` while a submitted fragment has not been acknowledged.
    pub fn is_appending(&self) -> bool {
        self.appending
    }

    /// Fragments waiting to be appended.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// `true` once nothing is queued and no append is outstanding.
    pub fn is_drained(&self) -> bool {
        self.queue.is_empty() && !self.appending
    }

    /// Hand back the resource, e.g. to wait for it after `shutdown`.
    pub fn into_resource(self) -> R {
        self.resource
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Handle one event from the channel, in arrival order.
    pub fn on_event(&mut self, event: &TurnEvent) {
        match event {
            TurnEvent::AudioBegin => self.ensure_open(),
            TurnEvent::AudioChunk(bytes) => {
                self.ensure_open();
                if self.state == BufferState::Closed {
                    log::debug!("playback: buffer closed, dropping {} bytes", bytes.len());
                    return;
                }
                self.queue.push_back(bytes.clone());
                self.drain();
            }
            TurnEvent::Text(_)
            | TurnEvent::AudioEnd
            | TurnEvent::TurnComplete
            | TurnEvent::TurnError(_) => {}
        }
    }

    /// Handle a notification reported by the resource.
    pub fn on_notification(&mut self, notification: ResourceNotification) {
        match notification {
            ResourceNotification::Opened => {
                if self.state == BufferState::Opening {
                    log::debug!("playback: buffer ready");
                    self.state = BufferState::Ready;
                }
                self.drain();
            }
            ResourceNotification::AppendComplete => {
                self.appending = false;
                self.start_if_paused();
                self.drain();
            }
            ResourceNotification::Error(msg) => {
                log::warn!("playback: resource error: {msg}");
                self.appending = false;
                self.drain();
            }
            ResourceNotification::Closed => {
                if !self.queue.is_empty() {
                    log::warn!(
                        "playback: buffer closed with {} fragments pending",
                        self.queue.len()
                    );
                }
                self.state = BufferState::Closed;
                self.appending = false;
                self.queue.clear();
            }
        }
    }

    /// Release the resource at session teardown.
    pub fn shutdown(&mut self) {
        if self.state != BufferState::Closed {
            self.resource.close();
            self.state = BufferState::Closed;
        }
        self.appending = false;
        self.queue.clear();
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn ensure_open(&mut self) {
        if self.state != BufferState::Uninitialized {
            return;
        }
        self.state = BufferState::Opening;
        if let Err(e) = self.resource.open() {
            log::warn!("playback: {e}; continuing text-only");
            self.state = BufferState::Closed;
            self.queue.clear();
        }
    }

    /// Submit the next queued fragment if the buffer can take it.
    fn drain(&mut self) {
        while self.state == BufferState::Ready && !self.appending {
            let Some(fragment) = self.queue.pop_front() else {
                return;
            };
            let len = fragment.len();
            match self.resource.append(fragment) {
                Ok(()) => self.appending = true,
                Err(e) => log::warn!("playback: dropping {len}-byte fragment: {e}"),
            }
        }
    }

    fn start_if_paused(&mut self) {
        if self.resource.is_paused() {
            if let Err(e) = self.resource.play() {
                log::warn!("playback: {e}");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::PlaybackError;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Op {
        Open,
        Append(Bytes),
        Play,
        Close,
    }

    #[derive(Default)]
    struct Script {
        ops: Vec<Op>,
        in_flight: usize,
        fail_open: bool,
        reject_appends: usize,
        play_fails: bool,
        paused: bool,
    }

    /// Fake resource recording every call and refusing overlapping appends.
    #[derive(Clone, Default)]
    struct FakeResource(Rc<RefCell<Script>>);

    impl FakeResource {
        fn ops(&self) -> Vec<Op> {
            self.0.borrow().ops.clone()
        }

        fn appended(&self) -> Vec<Bytes> {
            self.ops()
                .into_iter()
                .filter_map(|op| match op {
                    Op::Append(b) => Some(b),
                    _ => None,
                })
                .collect()
        }
    }

    impl PlaybackResource for FakeResource {
        fn open(&mut self) -> Result<(), PlaybackError> {
            let mut s = self.0.borrow_mut();
            s.ops.push(Op::Open);
            if s.fail_open {
                return Err(PlaybackError::Open("codec unsupported".into()));
            }
            s.paused = true;
            Ok(())
        }

        fn append(&mut self, fragment: Bytes) -> Result<(), PlaybackError> {
            let mut s = self.0.borrow_mut();
            if s.reject_appends > 0 {
                s.reject_appends -= 1;
                return Err(PlaybackError::Append("quota exceeded".into()));
            }
            assert_eq!(s.in_flight, 0, "overlapping append");
            s.in_flight += 1;
            s.ops.push(Op::Append(fragment));
            Ok(())
        }

        fn is_paused(&self) -> bool {
            self.0.borrow().paused
        }

        fn play(&mut self) -> Result<(), PlaybackError> {
            let mut s = self.0.borrow_mut();
            s.ops.push(Op::Play);
            if s.play_fails {
                return Err(PlaybackError::Play("user gesture required".into()));
            }
            s.paused = false;
            Ok(())
        }

        fn close(&mut self) {
            self.0.borrow_mut().ops.push(Op::Close);
        }
    }

    fn chunk(s: &'static str) -> TurnEvent {
        TurnEvent::AudioChunk(Bytes::from_static(s.as_bytes()))
    }

    fn complete(ingestor: &mut PlaybackIngestor<FakeResource>, fake: &FakeResource) {
        fake.0.borrow_mut().in_flight -= 1;
        ingestor.on_notification(ResourceNotification::AppendComplete);
    }

    fn ready() -> (PlaybackIngestor<FakeResource>, FakeResource) {
        let fake = FakeResource::default();
        let mut ingestor = PlaybackIngestor::new(fake.clone());
        ingestor.on_event(&TurnEvent::AudioBegin);
        ingestor.on_notification(ResourceNotification::Opened);
        (ingestor, fake)
    }

    #[test]
    fn audio_begin_opens_lazily_once() {
        let fake = FakeResource::default();
        let mut ingestor = PlaybackIngestor::new(fake.clone());
        ingestor.on_event(&TurnEvent::Text("こんにちは。".into()));
        assert_eq!(ingestor.state(), BufferState::Uninitialized);

        ingestor.on_event(&TurnEvent::AudioBegin);
        assert_eq!(ingestor.state(), BufferState::Opening);
        ingestor.on_event(&TurnEvent::AudioBegin);
        assert_eq!(fake.ops(), vec![Op::Open]);

        ingestor.on_notification(ResourceNotification::Opened);
        assert_eq!(ingestor.state(), BufferState::Ready);
    }

    #[test]
    fn first_chunk_opens_without_audio_begin() {
        let fake = FakeResource::default();
        let mut ingestor = PlaybackIngestor::new(fake.clone());
        ingestor.on_event(&chunk("a"));
        assert_eq!(ingestor.state(), BufferState::Opening);
        assert_eq!(ingestor.queued(), 1);

        ingestor.on_notification(ResourceNotification::Opened);
        assert_eq!(fake.appended(), vec![Bytes::from_static(b"a")]);
        assert_eq!(ingestor.queued(), 0);
    }

    #[test]
    fn busy_buffer_drains_one_fragment_per_completion() {
        let (mut ingestor, fake) = ready();

        ingestor.on_event(&chunk("1"));
        ingestor.on_event(&chunk("2"));
        ingestor.on_event(&chunk("3"));
        assert!(ingestor.is_appending());
        assert_eq!(ingestor.queued(), 2);
        assert_eq!(fake.appended().len(), 1);

        complete(&mut ingestor, &fake);
        assert_eq!(fake.appended().len(), 2);
        assert_eq!(ingestor.queued(), 1);

        complete(&mut ingestor, &fake);
        complete(&mut ingestor, &fake);
        assert!(!ingestor.is_appending());
        assert_eq!(
            fake.appended(),
            vec![
                Bytes::from_static(b"1"),
                Bytes::from_static(b"2"),
                Bytes::from_static(b"3"),
            ]
        );
    }

    #[test]
    fn playback_starts_after_first_append_completes() {
        let (mut ingestor, fake) = ready();
        ingestor.on_event(&chunk("1"));
        assert!(!fake.ops().contains(&Op::Play));

        complete(&mut ingestor, &fake);
        ingestor.on_event(&chunk("2"));
        complete(&mut ingestor, &fake);

        let plays = fake.ops().iter().filter(|op| **op == Op::Play).count();
        assert_eq!(plays, 1);
    }

    #[test]
    fn play_failure_is_retried_on_next_append() {
        let (mut ingestor, fake) = ready();
        fake.0.borrow_mut().play_fails = true;

        ingestor.on_event(&chunk("1"));
        complete(&mut ingestor, &fake);
        assert!(fake.is_paused());

        fake.0.borrow_mut().play_fails = false;
        ingestor.on_event(&chunk("2"));
        complete(&mut ingestor, &fake);
        assert!(!fake.is_paused());

        let plays = fake.ops().iter().filter(|op| **op == Op::Play).count();
        assert_eq!(plays, 2);
    }

    #[test]
    fn open_failure_degrades_to_text_only() {
        let fake = FakeResource::default();
        fake.0.borrow_mut().fail_open = true;
        let mut ingestor = PlaybackIngestor::new(fake.clone());

        ingestor.on_event(&TurnEvent::AudioBegin);
        ingestor.on_event(&chunk("1"));
        ingestor.on_event(&TurnEvent::AudioEnd);
        ingestor.on_event(&TurnEvent::AudioBegin);

        assert_eq!(ingestor.state(), BufferState::Closed);
        assert_eq!(ingestor.queued(), 0);
        assert_eq!(fake.ops(), vec![Op::Open]);
    }

    #[test]
    fn rejected_append_drops_fragment_and_continues() {
        let (mut ingestor, fake) = ready();
        fake.0.borrow_mut().reject_appends = 1;

        ingestor.on_event(&chunk("bad"));
        assert!(!ingestor.is_appending());
        ingestor.on_event(&chunk("good"));

        assert_eq!(fake.appended(), vec![Bytes::from_static(b"good")]);
    }

    #[test]
    fn resource_error_clears_flag_and_drains_next() {
        let (mut ingestor, fake) = ready();
        ingestor.on_event(&chunk("1"));
        ingestor.on_event(&chunk("2"));

        fake.0.borrow_mut().in_flight -= 1;
        ingestor.on_notification(ResourceNotification::Error("decode error".into()));

        assert_eq!(ingestor.state(), BufferState::Ready);
        assert_eq!(fake.appended().len(), 2);
    }

    #[test]
    fn buffer_persists_across_turns() {
        let (mut ingestor, fake) = ready();
        ingestor.on_event(&chunk("1"));
        complete(&mut ingestor, &fake);
        ingestor.on_event(&TurnEvent::AudioEnd);
        ingestor.on_event(&TurnEvent::TurnComplete);
        assert_eq!(ingestor.state(), BufferState::Ready);

        ingestor.on_event(&TurnEvent::AudioBegin);
        ingestor.on_event(&chunk("2"));
        let opens = fake.ops().iter().filter(|op| **op == Op::Open).count();
        assert_eq!(opens, 1);
        assert_eq!(fake.appended().len(), 2);
    }

    #[test]
    fn closed_notification_discards_queue() {
        let (mut ingestor, _fake) = ready();
        ingestor.on_event(&chunk("1"));
        ingestor.on_event(&chunk("2"));

        ingestor.on_notification(ResourceNotification::Closed);
        assert_eq!(ingestor.state(), BufferState::Closed);
        assert_eq!(ingestor.queued(), 0);

        ingestor.on_event(&chunk("3"));
        assert_eq!(ingestor.queued(), 0);
    }

    #[test]
    fn drained_only_after_last_completion() {
        let fake = FakeResource::default();
        let mut ingestor = PlaybackIngestor::new(fake.clone());
        assert!(ingestor.is_drained());

        ingestor.on_event(&chunk("1"));
        ingestor.on_event(&chunk("2"));
        assert!(!ingestor.is_drained());

        ingestor.on_notification(ResourceNotification::Opened);
        complete(&mut ingestor, &fake);
        assert!(!ingestor.is_drained());
        complete(&mut ingestor, &fake);
        assert!(ingestor.is_drained());
        assert_eq!(ingestor.into_resource().appended().len(), 2);
    }

    #[test]
    fn shutdown_closes_resource_once() {
        let (mut ingestor, fake) = ready();
        ingestor.shutdown();
        ingestor.shutdown();
        let closes = fake.ops().iter().filter(|op| **op == Op::Close).count();
        assert_eq!(closes, 1);
    }

    #[test]
    fn shutdown_before_open_still_closes() {
        let fake = FakeResource::default();
        let mut ingestor = PlaybackIngestor::new(fake.clone());
        ingestor.shutdown();
        assert_eq!(ingestor.state(), BufferState::Closed);
        assert_eq!(fake.ops(), vec![Op::Close]);
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use super::{EventHandler, HostEvent, PlaybackHost, Subscribers, SubscriptionId, TrackInfo};
use crate::analysis::AnalysisSet;
use crate::error::HostError;

/// Scripted host for unit tests.
pub(crate) struct FakeHost {
    pub position_ms: Mutex<f64>,
    pub playing: Mutex<bool>,
    pub track: Mutex<Option<TrackInfo>>,
    /// `None` makes every fetch fail.
    pub analysis: Mutex<Option<AnalysisSet>>,
    pub ready: Mutex<bool>,
    /// How long each fetch blocks.
    pub fetch_delay: Mutex<Duration>,
    pub fetches: AtomicUsize,
    pub subscribers: Subscribers,
}

impl FakeHost {
    pub fn new(analysis: Option<AnalysisSet>) -> Self {
        Self {
            position_ms: Mutex::new(0.0),
            playing: Mutex::new(false),
            track: Mutex::new(Some(TrackInfo {
                id: "fake-track".into(),
                artwork: None,
            })),
            analysis: Mutex::new(analysis),
            ready: Mutex::new(true),
            fetch_delay: Mutex::new(Duration::ZERO),
            fetches: AtomicUsize::new(0),
            subscribers: Subscribers::new(),
        }
    }

    pub fn set_position(&self, ms: f64) {
        *self.position_ms.lock().unwrap() = ms;
    }

    pub fn set_playing(&self, playing: bool) {
        *self.playing.lock().unwrap() = playing;
    }

    pub fn emit(&self, event: HostEvent) {
        self.subscribers.emit(event);
    }
}

impl PlaybackHost for FakeHost {
    fn is_ready(&self) -> bool {
        *self.ready.lock().unwrap()
    }

    fn position_ms(&self) -> f64 {
        *self.position_ms.lock().unwrap()
    }

    fn is_playing(&self) -> bool {
        *self.playing.lock().unwrap()
    }

    fn current_track(&self) -> Option<TrackInfo> {
        self.track.lock().unwrap().clone()
    }

    fn fetch_analysis(&self, track_id: &str) -> Result<AnalysisSet, HostError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.fetch_delay.lock().unwrap();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        self.analysis
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| HostError::NotFound(track_id.to_string()))
    }

    fn subscribe(&self, event: HostEvent, handler: EventHandler) -> SubscriptionId {
        self.subscribers.subscribe(event, handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.unsubscribe(id);
    }
}

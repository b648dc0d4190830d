use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use super::{EventHandler, HostEvent, PlaybackHost, Subscribers, SubscriptionId, TrackInfo};
use crate::analysis::AnalysisSet;
use crate::error::HostError;
use crate::source::SourceRef;

struct Track {
    info: TrackInfo,
    analysis: SourceRef,
}

struct Clock {
    /// Position when playback last paused or seeked (ms).
    base_ms: f64,
    /// Set while playing.
    resumed_at: Option<Instant>,
}

impl Clock {
    fn position_ms(&self) -> f64 {
        match self.resumed_at {
            Some(at) => self.base_ms + at.elapsed().as_secs_f64() * 1000.0,
            None => self.base_ms,
        }
    }
}

struct State {
    track: Option<Track>,
    clock: Clock,
    ready: bool,
}

/// A simulated player that replays one track at a time from analysis files.
///
/// The clock is wall-clock driven while playing. Track changes and
/// play/pause transitions notify subscribers after the state is updated.
pub struct ReplayHost {
    state: Mutex<State>,
    subscribers: Subscribers,
}

impl Default for ReplayHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                track: None,
                clock: Clock {
                    base_ms: 0.0,
                    resumed_at: None,
                },
                ready: true,
            }),
            subscribers: Subscribers::new(),
        }
    }

    /// Load a track, rewind to zero and notify `TrackChanged`. Play state is kept.
    pub fn load_track(&self, info: TrackInfo, analysis: SourceRef) {
        {
            let mut state = self.lock();
            log::info!("Replay host loading track {} (analysis: {})", info.id, analysis);
            state.track = Some(Track { info, analysis });
            state.clock.base_ms = 0.0;
            if state.clock.resumed_at.is_some() {
                state.clock.resumed_at = Some(Instant::now());
            }
        }
        self.subscribers.emit(HostEvent::TrackChanged);
    }

    pub fn play(&self) {
        let changed = {
            let mut state = self.lock();
            if state.clock.resumed_at.is_none() {
                state.clock.resumed_at = Some(Instant::now());
                true
            } else {
                false
            }
        };
        if changed {
            self.subscribers.emit(HostEvent::PlayPauseToggled);
        }
    }

    pub fn pause(&self) {
        let changed = {
            let mut state = self.lock();
            let position = state.clock.position_ms();
            match state.clock.resumed_at.take() {
                Some(_) => {
                    state.clock.base_ms = position;
                    true
                }
                None => false,
            }
        };
        if changed {
            self.subscribers.emit(HostEvent::PlayPauseToggled);
        }
    }

    pub fn toggle(&self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn seek(&self, position_ms: f64) {
        let mut state = self.lock();
        state.clock.base_ms = position_ms.max(0.0);
        if state.clock.resumed_at.is_some() {
            state.clock.resumed_at = Some(Instant::now());
        }
    }

    /// Simulate the host UI appearing or disappearing.
    pub fn set_ready(&self, ready: bool) {
        self.lock().ready = ready;
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PlaybackHost for ReplayHost {
    fn is_ready(&self) -> bool {
        self.lock().ready
    }

    fn position_ms(&self) -> f64 {
        self.lock().clock.position_ms()
    }

    fn is_playing(&self) -> bool {
        self.lock().clock.resumed_at.is_some()
    }

    fn current_track(&self) -> Option<TrackInfo> {
        self.lock().track.as_ref().map(|t| t.info.clone())
    }

    fn fetch_analysis(&self, track_id: &str) -> Result<AnalysisSet, HostError> {
        let source = {
            let state = self.lock();
            match &state.track {
                Some(track) if track.info.id == track_id => track.analysis.clone(),
                _ => return Err(HostError::NotFound(track_id.to_string())),
            }
        };
        // Load outside the lock so position polling never waits on I/O.
        let bytes = source.load_bytes().map_err(|source| HostError::Fetch {
            track_id: track_id.to_string(),
            source,
        })?;
        AnalysisSet::from_json(bytes)
    }

    fn subscribe(&self, event: HostEvent, handler: EventHandler) -> SubscriptionId {
        self.subscribers.subscribe(event, handler)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.unsubscribe(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const ANALYSIS: &str = r#"{"segments": [{"start": 0, "duration": 4, "loudness_max": -8,
        "pitches": [1,0,0,0,0,0,0,0,0,0,0,0]}], "beats": [{"start": 0, "duration": 0.5}]}"#;

    fn host_with_track(dir: &tempfile::TempDir) -> ReplayHost {
        let path = dir.path().join("track.json");
        std::fs::write(&path, ANALYSIS).unwrap();
        let host = ReplayHost::new();
        host.load_track(
            TrackInfo {
                id: "track-1".into(),
                artwork: None,
            },
            SourceRef::Path(path),
        );
        host
    }

    #[test]
    fn fetches_analysis_for_current_track_only() {
        let dir = tempfile::tempdir().unwrap();
        let host = host_with_track(&dir);

        let analysis = host.fetch_analysis("track-1").unwrap();
        assert_eq!(analysis.segments().len(), 1);
        assert!(matches!(
            host.fetch_analysis("other"),
            Err(HostError::NotFound(_))
        ));
    }

    #[test]
    fn missing_analysis_file_is_a_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let host = ReplayHost::new();
        host.load_track(
            TrackInfo {
                id: "t".into(),
                artwork: None,
            },
            SourceRef::Path(dir.path().join("missing.json")),
        );
        assert!(matches!(host.fetch_analysis("t"), Err(HostError::Fetch { .. })));
    }

    #[test]
    fn paused_clock_holds_position() {
        let dir = tempfile::tempdir().unwrap();
        let host = host_with_track(&dir);
        host.seek(1500.0);
        assert!(!host.is_playing());
        assert_eq!(host.position_ms(), 1500.0);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(host.position_ms(), 1500.0);
    }

    #[test]
    fn playing_clock_advances_and_pause_freezes() {
        let dir = tempfile::tempdir().unwrap();
        let host = host_with_track(&dir);
        host.play();
        std::thread::sleep(std::time::Duration::from_millis(20));
        host.pause();
        let frozen = host.position_ms();
        assert!(frozen >= 20.0);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(host.position_ms(), frozen);
    }

    #[test]
    fn transitions_notify_subscribers() {
        let dir = tempfile::tempdir().unwrap();
        let host = host_with_track(&dir);
        let toggles = Arc::new(AtomicUsize::new(0));
        let tracks = Arc::new(AtomicUsize::new(0));

        let t = toggles.clone();
        host.subscribe(HostEvent::PlayPauseToggled, Box::new(move |_| {
            t.fetch_add(1, Ordering::SeqCst);
        }));
        let c = tracks.clone();
        host.subscribe(HostEvent::TrackChanged, Box::new(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        host.play();
        host.play(); // already playing
        host.toggle();
        host.load_track(
            TrackInfo {
                id: "track-2".into(),
                artwork: None,
            },
            SourceRef::Path(dir.path().join("track.json")),
        );

        assert_eq!(toggles.load(Ordering::SeqCst), 2);
        assert_eq!(tracks.load(Ordering::SeqCst), 1);
        assert_eq!(host.position_ms(), 0.0);
        assert_eq!(host.current_track().unwrap().id, "track-2");
    }
}

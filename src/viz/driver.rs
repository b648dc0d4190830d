use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{BarPhysics, BarState, IntensityVector, VisualStateMapper};
use crate::analysis::{AnalysisSet, TrackAnalysisCache};
use crate::color::ColorSample;
use crate::config::Config;
use crate::host::PlaybackHost;
use crate::surface::BarSurface;

/// Results delivered to the frame loop by refresh workers.
#[derive(Debug)]
pub enum Update {
    Analysis {
        generation: u64,
        track_id: Option<String>,
        analysis: Option<Arc<AnalysisSet>>,
    },
    Color {
        generation: u64,
        color: ColorSample,
    },
}

/// Per-frame work: poll the host, map, smooth, draw.
///
/// Owns the bar state exclusively. Refresh results arrive over a channel and
/// are applied at the start of a frame, so a frame always sees one complete
/// analysis and one complete color.
pub struct AnimationDriver<S> {
    host: Arc<dyn PlaybackHost>,
    surface: S,
    mapper: VisualStateMapper,
    physics: BarPhysics,
    bars: BarState,
    cache: TrackAnalysisCache,
    color_generation: u64,
    updates: Receiver<Update>,
    reference_frame_ms: f64,
    last_tick_ms: Option<f64>,
    frames: u64,
}

impl<S: BarSurface> AnimationDriver<S> {
    pub fn new(host: Arc<dyn PlaybackHost>, surface: S, config: &Config, updates: Receiver<Update>) -> Self {
        let mapper = VisualStateMapper::new(config.mapper.clone());
        let bars = BarState::at_rest(config.mapper.baseline);
        Self {
            host,
            surface,
            mapper,
            physics: BarPhysics::new(config.physics.clone()),
            bars,
            cache: TrackAnalysisCache::new(),
            color_generation: 0,
            updates,
            reference_frame_ms: config.physics.reference_frame_ms,
            last_tick_ms: None,
            frames: 0,
        }
    }

    /// Run one frame at `time_ms` (milliseconds on any monotonic clock).
    pub fn tick(&mut self, time_ms: f64) -> IntensityVector {
        self.apply_updates();

        let playing = self.host.is_playing();
        let position_secs = self.host.position_ms() / 1000.0;
        self.bars.target = self
            .mapper
            .compute_target(position_secs, self.cache.current(), playing);

        let frame_ms = self
            .last_tick_ms
            .map_or(self.reference_frame_ms, |last| time_ms - last);
        self.last_tick_ms = Some(time_ms);

        let shown = self.physics.step(&mut self.bars, playing, time_ms, frame_ms);
        self.surface.set_scales(&shown);
        self.frames += 1;
        shown
    }

    fn apply_updates(&mut self) {
        loop {
            match self.updates.try_recv() {
                Ok(Update::Analysis {
                    generation,
                    track_id,
                    analysis,
                }) => {
                    self.cache.install(generation, track_id.as_deref(), analysis);
                }
                Ok(Update::Color { generation, color }) => {
                    if generation < self.color_generation {
                        log::debug!("Discarding stale color (generation {})", generation);
                        continue;
                    }
                    self.color_generation = generation;
                    self.surface.set_color(&color);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    pub fn bars(&self) -> &BarState {
        &self.bars
    }

    pub fn cache(&self) -> &TrackAnalysisCache {
        &self.cache
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}

/// A background thread ticking a driver at a fixed rate until stopped.
///
/// `stop` joins the thread, so once it returns no further frame runs.
pub struct FrameLoop<S> {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<AnimationDriver<S>>>,
}

impl<S: BarSurface + Send + 'static> FrameLoop<S> {
    pub fn start(mut driver: AnimationDriver<S>, fps: u32) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let interval = Duration::from_secs_f64(1.0 / fps.max(1) as f64);

        let handle = thread::Builder::new()
            .name("islandviz-frames".to_string())
            .spawn(move || {
                log::info!("Frame loop started ({} fps)", fps);
                let started = Instant::now();
                let mut next = started;
                loop {
                    driver.tick(started.elapsed().as_secs_f64() * 1000.0);

                    next += interval;
                    let now = Instant::now();
                    if next < now {
                        // Fell behind; don't try to catch up with a burst.
                        next = now;
                    }
                    match stop_rx.recv_timeout(next - now) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                log::info!("Frame loop stopped after {} frames", driver.frames());
                driver
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }
}

impl<S> FrameLoop<S> {
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop ticking and hand the driver back. `None` if the loop thread panicked.
    pub fn stop(mut self) -> Option<AnimationDriver<S>> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Option<AnimationDriver<S>> {
        if let Some(tx) = self.stop_tx.take() {
            // The loop may already have exited; a closed channel is fine.
            let _ = tx.send(());
        }
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(driver) => Some(driver),
            Err(_) => {
                log::error!("Frame loop thread panicked");
                None
            }
        }
    }
}

impl<S> Drop for FrameLoop<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Beat, Segment};
    use crate::color::Rgb;
    use crate::host::fake::FakeHost;
    use crate::surface::RecordingSurface;

    fn analysis() -> Arc<AnalysisSet> {
        Arc::new(
            AnalysisSet::new(
                vec![Segment {
                    start: 10.0,
                    duration: 2.0,
                    loudness_max: -20.0,
                    pitches: [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 0.8, 0.7, 0.6],
                }],
                vec![Beat {
                    start: 10.0,
                    duration: 1.0,
                }],
            )
            .unwrap(),
        )
    }

    fn driver(host: Arc<FakeHost>) -> (AnimationDriver<RecordingSurface>, Sender<Update>) {
        let (tx, rx) = mpsc::channel();
        let driver = AnimationDriver::new(host, RecordingSurface::default(), &Config::default(), rx);
        (driver, tx)
    }

    fn color(r: u8) -> ColorSample {
        ColorSample {
            rgb: Rgb::new(r, 0, 0),
            glow_alpha: 0x88,
        }
    }

    #[test]
    fn paused_host_keeps_bars_at_rest() {
        let host = Arc::new(FakeHost::new(None));
        let (mut driver, _tx) = driver(host);
        for i in 0..10 {
            assert_eq!(driver.tick(i as f64 * 16.7), [0.2; 6]);
        }
        assert_eq!(driver.surface().frames.len(), 10);
    }

    #[test]
    fn playing_without_analysis_shows_baseline_plus_breath() {
        let host = Arc::new(FakeHost::new(None));
        host.set_playing(true);
        let (mut driver, _tx) = driver(host);
        let shown = driver.tick(0.0);
        assert_eq!(driver.bars().target, [0.2; 6]);
        assert!(shown.iter().all(|&v| v >= 0.2 && v <= 0.23 + 1e-6));
    }

    #[test]
    fn installed_analysis_drives_targets() {
        let host = Arc::new(FakeHost::new(None));
        host.set_playing(true);
        host.set_position(10_500.0);
        let (mut driver, tx) = driver(host);

        tx.send(Update::Analysis {
            generation: 1,
            track_id: Some("fake-track".into()),
            analysis: Some(analysis()),
        })
        .unwrap();
        driver.tick(0.0);

        assert!((driver.bars().target[0] - 0.1875).abs() < 1e-5);
        // 0.2 + (0.1875 - 0.2) * 0.08: falling toward a target below the floor
        assert_eq!(driver.bars().current[0], 0.2);
        // 0.2 + ((0.3 + 0.15) * 0.75 - 0.2) * 0.6
        assert!((driver.bars().current[1] - 0.2825).abs() < 1e-5);
        assert_eq!(driver.cache().track_id(), Some("fake-track"));
    }

    #[test]
    fn stale_updates_are_dropped() {
        let host = Arc::new(FakeHost::new(None));
        let (mut driver, tx) = driver(host);

        tx.send(Update::Color { generation: 2, color: color(200) }).unwrap();
        tx.send(Update::Color { generation: 1, color: color(100) }).unwrap();
        tx.send(Update::Analysis {
            generation: 2,
            track_id: Some("new".into()),
            analysis: None,
        })
        .unwrap();
        tx.send(Update::Analysis {
            generation: 1,
            track_id: Some("old".into()),
            analysis: Some(analysis()),
        })
        .unwrap();
        driver.tick(0.0);

        assert_eq!(driver.surface().colors, vec![color(200)]);
        assert_eq!(driver.cache().track_id(), Some("new"));
        assert!(driver.cache().current().is_none());
    }

    #[test]
    fn frame_loop_ticks_until_stopped() {
        let host = Arc::new(FakeHost::new(None));
        let (driver, _tx) = driver(host);
        let frame_loop = FrameLoop::start(driver, 200).unwrap();
        assert!(frame_loop.is_running());
        thread::sleep(Duration::from_millis(60));

        let driver = frame_loop.stop().unwrap();
        let frames = driver.frames();
        assert!(frames >= 2, "only {} frames", frames);
        assert_eq!(driver.surface().frames.len() as u64, frames);
    }
}

use super::{IntensityVector, BAR_COUNT};
use crate::config::PhysicsConfig;

/// The displayed and desired bar heights. Only the frame loop writes these.
#[derive(Clone, Debug, PartialEq)]
pub struct BarState {
    pub current: IntensityVector,
    pub target: IntensityVector,
}

impl BarState {
    pub fn at_rest(level: f32) -> Self {
        Self {
            current: [level; BAR_COUNT],
            target: [level; BAR_COUNT],
        }
    }
}

/// Attack/decay smoothing with a small "breath" oscillation on top.
///
/// Rising bars chase their target quickly, falling bars drift down slowly.
/// By default the rates are applied once per frame regardless of frame
/// length, which matches a 60 Hz display. With `normalize_frame_time` the
/// rate is rescaled to the measured interval.
#[derive(Clone, Debug)]
pub struct BarPhysics {
    config: PhysicsConfig,
}

impl Default for BarPhysics {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl BarPhysics {
    pub fn new(config: PhysicsConfig) -> Self {
        Self { config }
    }

    pub fn floor(&self) -> f32 {
        self.config.floor
    }

    /// Advance `bars.current` one frame toward `bars.target` and return the
    /// values to display at `time_ms`.
    pub fn step(&self, bars: &mut BarState, is_playing: bool, time_ms: f64, frame_ms: f64) -> IntensityVector {
        self.smooth(&mut bars.current, &bars.target, frame_ms);
        self.display(&bars.current, is_playing, time_ms)
    }

    pub fn smooth(&self, current: &mut IntensityVector, target: &IntensityVector, frame_ms: f64) {
        for (cur, &tgt) in current.iter_mut().zip(target.iter()) {
            let attacking = tgt > *cur;
            let rate = self.rate(attacking, frame_ms);
            *cur += (tgt - *cur) * rate;
            *cur = cur.max(self.config.floor);
        }
    }

    pub fn display(&self, current: &IntensityVector, is_playing: bool, time_ms: f64) -> IntensityVector {
        let mut shown = [0.0; BAR_COUNT];
        for (i, (out, &cur)) in shown.iter_mut().zip(current.iter()).enumerate() {
            *out = (cur + self.breath(i, is_playing, time_ms)).max(self.config.floor);
        }
        shown
    }

    /// Per-bar phase-shifted sine; zero while paused.
    pub fn breath(&self, bar: usize, is_playing: bool, time_ms: f64) -> f32 {
        if !is_playing {
            return 0.0;
        }
        let phase = time_ms / self.config.breath_period_ms + bar as f64;
        phase.sin() as f32 * self.config.breath_amplitude
    }

    fn rate(&self, attacking: bool, frame_ms: f64) -> f32 {
        let base = if attacking { self.config.attack } else { self.config.decay };
        if !self.config.normalize_frame_time || !frame_ms.is_finite() || frame_ms < 0.0 {
            return base;
        }
        let frames = frame_ms / self.config.reference_frame_ms;
        (1.0 - (1.0 - base as f64).powf(frames)) as f32
    }
}

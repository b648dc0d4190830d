use super::{IntensityVector, BAR_COUNT};
use crate::analysis::{AnalysisSet, Beat};
use crate::config::MapperConfig;

/// Maps playback position and track analysis to per-bar targets.
///
/// Pure: the same inputs always give the same vector.
#[derive(Clone, Debug)]
pub struct VisualStateMapper {
    config: MapperConfig,
}

impl Default for VisualStateMapper {
    fn default() -> Self {
        Self::new(MapperConfig::default())
    }
}

impl VisualStateMapper {
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    pub fn baseline(&self) -> IntensityVector {
        [self.config.baseline; BAR_COUNT]
    }

    pub fn compute_target(
        &self,
        position_secs: f64,
        analysis: Option<&AnalysisSet>,
        is_playing: bool,
    ) -> IntensityVector {
        let analysis = match analysis {
            Some(a) if is_playing => a,
            _ => return self.baseline(),
        };
        let segment = match analysis.segment_at(position_secs) {
            Some(s) => s,
            None => return self.baseline(),
        };

        let boost = beat_impact(analysis.beat_at(position_secs), position_secs) * self.config.beat_boost;
        let loudness = self.loudness(segment.loudness_max);

        let mut target = [0.0; BAR_COUNT];
        for (bar, &pitch_class) in target.iter_mut().zip(self.config.pitch_channels.iter()) {
            // An unchecked config can name a pitch class past the vector.
            let pitch = match segment.pitches.get(pitch_class) {
                Some(p) => p.clamp(0.0, 1.0),
                None => return self.baseline(),
            };
            *bar = (pitch + boost) * loudness;
        }
        target
    }

    /// Peak loudness (dB) as a multiplier, never below `loudness_floor`.
    pub fn loudness(&self, loudness_max: f32) -> f32 {
        let scaled = (loudness_max + self.config.loudness_offset_db) / self.config.loudness_range_db;
        scaled.max(self.config.loudness_floor)
    }
}

/// Linear pulse: 1 at the beat onset falling to 0 at its end; 0 with no beat.
pub fn beat_impact(beat: Option<&Beat>, position_secs: f64) -> f32 {
    match beat {
        Some(b) if b.duration > 0.0 => {
            (1.0 - (position_secs - b.start) / b.duration).clamp(0.0, 1.0) as f32
        }
        _ => 0.0,
    }
}

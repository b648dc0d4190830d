use serde::Deserialize;

use crate::error::{AnalysisError, HostError};
use crate::viz::PITCH_CLASSES;

/// A time-bounded slice of pre-analyzed audio.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    /// Start time (seconds)
    pub start: f64,
    /// Duration (seconds, > 0)
    pub duration: f64,
    /// Peak loudness (dB, typically -60..0)
    pub loudness_max: f32,
    /// Relative energy of each pitch class, C first (0.0-1.0)
    pub pitches: [f32; PITCH_CLASSES],
}

/// A rhythmic pulse window.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Beat {
    pub start: f64,
    pub duration: f64,
}

trait Interval {
    fn start(&self) -> f64;
    fn duration(&self) -> f64;

    fn contains(&self, position: f64) -> bool {
        position >= self.start() && position < self.start() + self.duration()
    }
}

impl Interval for Segment {
    fn start(&self) -> f64 { self.start }
    fn duration(&self) -> f64 { self.duration }
}

impl Interval for Beat {
    fn start(&self) -> f64 { self.start }
    fn duration(&self) -> f64 { self.duration }
}

/// The interval whose half-open `[start, start + duration)` window holds `position`.
fn find_at<T: Interval>(items: &[T], position: f64) -> Option<&T> {
    let idx = items.partition_point(|item| item.start() <= position);
    if idx == 0 {
        return None;
    }
    let candidate = &items[idx - 1];
    candidate.contains(position).then_some(candidate)
}

/// Segments and beats for one track, validated on construction and never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisSet {
    segments: Vec<Segment>,
    beats: Vec<Beat>,
}

impl AnalysisSet {
    pub fn new(segments: Vec<Segment>, beats: Vec<Beat>) -> Result<Self, AnalysisError> {
        if segments.is_empty() {
            return Err(AnalysisError::NoSegments);
        }

        for (index, seg) in segments.iter().enumerate() {
            if !seg.start.is_finite()
                || !seg.duration.is_finite()
                || !seg.loudness_max.is_finite()
                || seg.pitches.iter().any(|p| !p.is_finite())
            {
                return Err(AnalysisError::NonFinite { what: "segment", index });
            }
            if seg.duration <= 0.0 {
                return Err(AnalysisError::BadDuration { what: "segment", index });
            }
            if index > 0 && seg.start < segments[index - 1].start {
                return Err(AnalysisError::Unsorted { what: "segment", index });
            }
        }

        // Zero-length beats are tolerated: their window is empty and never matches.
        for (index, beat) in beats.iter().enumerate() {
            if !beat.start.is_finite() || !beat.duration.is_finite() {
                return Err(AnalysisError::NonFinite { what: "beat", index });
            }
            if beat.duration < 0.0 {
                return Err(AnalysisError::BadDuration { what: "beat", index });
            }
            if index > 0 && beat.start < beats[index - 1].start {
                return Err(AnalysisError::Unsorted { what: "beat", index });
            }
        }

        Ok(Self { segments, beats })
    }

    /// Parse an audio-analysis JSON document. Unknown fields are ignored.
    pub fn from_json(json: impl AsRef<[u8]>) -> Result<Self, HostError> {
        let raw: RawAnalysis = serde_json::from_slice(json.as_ref())?;
        Ok(raw.into_analysis()?)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn beats(&self) -> &[Beat] {
        &self.beats
    }

    pub fn segment_at(&self, position: f64) -> Option<&Segment> {
        find_at(&self.segments, position)
    }

    pub fn beat_at(&self, position: f64) -> Option<&Beat> {
        find_at(&self.beats, position)
    }

    /// End of the last segment (seconds).
    pub fn duration(&self) -> f64 {
        self.segments
            .last()
            .map_or(0.0, |s| s.start + s.duration)
    }
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    segments: Vec<RawSegment>,
    #[serde(default)]
    beats: Vec<Beat>,
}

#[derive(Debug, Deserialize)]
struct RawSegment {
    start: f64,
    duration: f64,
    loudness_max: f32,
    pitches: Vec<f32>,
}

impl RawAnalysis {
    fn into_analysis(self) -> Result<AnalysisSet, AnalysisError> {
        let segments = self
            .segments
            .into_iter()
            .enumerate()
            .map(|(index, raw)| {
                let pitches: [f32; PITCH_CLASSES] = raw
                    .pitches
                    .as_slice()
                    .try_into()
                    .map_err(|_| AnalysisError::PitchCount { index, len: raw.pitches.len() })?;
                Ok(Segment {
                    start: raw.start,
                    duration: raw.duration,
                    loudness_max: raw.loudness_max,
                    pitches,
                })
            })
            .collect::<Result<Vec<_>, AnalysisError>>()?;

        AnalysisSet::new(segments, self.beats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: f64, duration: f64) -> Segment {
        Segment {
            start,
            duration,
            loudness_max: -10.0,
            pitches: [0.5; PITCH_CLASSES],
        }
    }

    fn beat(start: f64, duration: f64) -> Beat {
        Beat { start, duration }
    }

    #[test]
    fn parses_analysis_json() {
        let json = r#"{
            "meta": {"analyzer_version": "4.0.0"},
            "beats": [{"start": 0.5, "duration": 0.5, "confidence": 0.8}],
            "segments": [
                {"start": 0.0, "duration": 1.0, "confidence": 1.0, "loudness_start": -30.0,
                 "loudness_max": -12.5, "loudness_max_time": 0.1,
                 "pitches": [1.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 0.95, 0.05],
                 "timbre": [1.0, 2.0]}
            ]
        }"#;
        let analysis = AnalysisSet::from_json(json).unwrap();
        assert_eq!(analysis.segments().len(), 1);
        assert_eq!(analysis.segments()[0].loudness_max, -12.5);
        assert_eq!(analysis.segments()[0].pitches[11], 0.05);
        assert_eq!(analysis.beats(), &[beat(0.5, 0.5)]);
    }

    #[test]
    fn missing_beats_default_to_empty() {
        let json = r#"{"segments": [{"start": 0, "duration": 2, "loudness_max": -5,
            "pitches": [0,0,0,0,0,0,0,0,0,0,0,0]}]}"#;
        let analysis = AnalysisSet::from_json(json).unwrap();
        assert!(analysis.beats().is_empty());
        assert_eq!(analysis.duration(), 2.0);
    }

    #[test]
    fn empty_or_missing_segments_rejected() {
        assert!(matches!(
            AnalysisSet::from_json(r#"{"beats": []}"#),
            Err(HostError::Analysis(AnalysisError::NoSegments))
        ));
        assert!(matches!(
            AnalysisSet::from_json(r#"{"segments": []}"#),
            Err(HostError::Analysis(AnalysisError::NoSegments))
        ));
        assert!(matches!(
            AnalysisSet::from_json("not json"),
            Err(HostError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_wrong_pitch_count() {
        let json = r#"{"segments": [{"start": 0, "duration": 1, "loudness_max": -5,
            "pitches": [0.1, 0.2]}]}"#;
        assert!(matches!(
            AnalysisSet::from_json(json),
            Err(HostError::Analysis(AnalysisError::PitchCount { index: 0, len: 2 }))
        ));
    }

    #[test]
    fn validation_rules() {
        assert_eq!(
            AnalysisSet::new(vec![segment(1.0, 1.0), segment(0.5, 1.0)], vec![]),
            Err(AnalysisError::Unsorted { what: "segment", index: 1 })
        );
        assert_eq!(
            AnalysisSet::new(vec![segment(0.0, 0.0)], vec![]),
            Err(AnalysisError::BadDuration { what: "segment", index: 0 })
        );
        assert_eq!(
            AnalysisSet::new(vec![segment(f64::NAN, 1.0)], vec![]),
            Err(AnalysisError::NonFinite { what: "segment", index: 0 })
        );
        assert_eq!(
            AnalysisSet::new(vec![segment(0.0, 1.0)], vec![beat(1.0, 0.5), beat(0.0, 0.5)]),
            Err(AnalysisError::Unsorted { what: "beat", index: 1 })
        );
        assert!(AnalysisSet::new(vec![segment(0.0, 1.0)], vec![beat(0.0, 0.0)]).is_ok());
    }

    #[test]
    fn lookup_uses_half_open_windows() {
        let analysis = AnalysisSet::new(
            vec![segment(0.0, 1.0), segment(1.0, 1.0), segment(2.5, 0.5)],
            vec![beat(0.0, 0.5), beat(1.0, 0.5)],
        )
        .unwrap();

        assert_eq!(analysis.segment_at(0.0).unwrap().start, 0.0);
        assert_eq!(analysis.segment_at(0.999).unwrap().start, 0.0);
        assert_eq!(analysis.segment_at(1.0).unwrap().start, 1.0);
        // gap between 2.0 and 2.5
        assert!(analysis.segment_at(2.2).is_none());
        assert_eq!(analysis.segment_at(2.5).unwrap().start, 2.5);
        assert!(analysis.segment_at(3.0).is_none());
        assert!(analysis.segment_at(-0.1).is_none());

        assert!(analysis.beat_at(0.25).is_some());
        assert!(analysis.beat_at(0.5).is_none());
        assert_eq!(analysis.beat_at(1.2).unwrap().start, 1.0);
        assert!(analysis.beat_at(5.0).is_none());
    }

    #[test]
    fn zero_length_beat_never_matches() {
        let analysis =
            AnalysisSet::new(vec![segment(0.0, 2.0)], vec![beat(1.0, 0.0)]).unwrap();
        assert!(analysis.beat_at(1.0).is_none());
    }

    #[test]
    fn sample_analysis_covers_twenty_seconds() {
        let analysis = AnalysisSet::from_json(include_str!("../../demos/analysis.json")).unwrap();
        assert!(analysis.duration() >= 20.0);
        assert_eq!(analysis.beats().len(), 40);
        assert!(analysis.segment_at(19.9).is_some());
    }
}

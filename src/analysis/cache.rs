use std::sync::Arc;

use super::AnalysisSet;
use crate::host::PlaybackHost;

/// The analysis of the active track, or nothing.
///
/// Installs are whole-set replacements of an `Arc`, so a reader holding a
/// snapshot always sees one complete set. Every install carries the
/// generation of the refresh that produced it; older generations are ignored.
#[derive(Debug, Default)]
pub struct TrackAnalysisCache {
    current: Option<Arc<AnalysisSet>>,
    track_id: Option<String>,
    generation: u64,
}

impl TrackAnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch and install the analysis for `track_id`, blocking until the host answers.
    ///
    /// Synchronous convenience path. The mounted visualizer fetches on a worker
    /// with [`fetch_analysis`] and hands the result to [`install`](Self::install)
    /// on the frame thread.
    pub fn refresh(&mut self, host: &dyn PlaybackHost, track_id: &str) -> Option<Arc<AnalysisSet>> {
        let generation = self.generation + 1;
        let analysis = fetch_analysis(host, track_id);
        self.install(generation, Some(track_id), analysis);
        self.snapshot()
    }

    /// Replace the cached set. Returns `false` if a newer refresh already landed.
    pub fn install(
        &mut self,
        generation: u64,
        track_id: Option<&str>,
        analysis: Option<Arc<AnalysisSet>>,
    ) -> bool {
        if generation < self.generation {
            log::debug!(
                "Discarding stale analysis (generation {} < {})",
                generation,
                self.generation
            );
            return false;
        }
        self.generation = generation;
        self.track_id = track_id.map(str::to_string);
        self.current = analysis;
        true
    }

    pub fn snapshot(&self) -> Option<Arc<AnalysisSet>> {
        self.current.clone()
    }

    pub fn current(&self) -> Option<&AnalysisSet> {
        self.current.as_deref()
    }

    pub fn track_id(&self) -> Option<&str> {
        self.track_id.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Ask the host for `track_id`'s analysis; failures are logged and become `None`.
pub fn fetch_analysis(host: &dyn PlaybackHost, track_id: &str) -> Option<Arc<AnalysisSet>> {
    match host.fetch_analysis(track_id) {
        Ok(analysis) => {
            log::info!(
                "Loaded analysis for {}: {} segments, {} beats, {:.1}s",
                track_id,
                analysis.segments().len(),
                analysis.beats().len(),
                analysis.duration()
            );
            Some(Arc::new(analysis))
        }
        Err(e) => {
            log::warn!("Audio analysis unavailable for {}: {}", track_id, e);
            None
        }
    }
}

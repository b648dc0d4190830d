pub mod events;
pub mod replay;

#[cfg(test)]
pub(crate) mod fake;

use crate::analysis::AnalysisSet;
use crate::error::HostError;
use crate::source::SourceRef;

pub use events::{EventHandler, HostEvent, Subscribers, SubscriptionId};

/// The track the host is currently playing.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackInfo {
    pub id: String,
    pub artwork: Option<SourceRef>,
}

/// Playback and track-analysis provider.
///
/// Everything the visualizer knows about the player goes through this trait.
/// `position_ms` and `is_playing` are polled once per frame; `fetch_analysis`
/// may block and is only ever called from refresh workers.
pub trait PlaybackHost: Send + Sync {
    /// Whether the host UI is ready to accept the bar container.
    fn is_ready(&self) -> bool {
        true
    }

    /// Playback position in milliseconds; resets on track change.
    fn position_ms(&self) -> f64;

    fn is_playing(&self) -> bool;

    fn current_track(&self) -> Option<TrackInfo>;

    fn fetch_analysis(&self, track_id: &str) -> Result<AnalysisSet, HostError>;

    fn subscribe(&self, event: HostEvent, handler: EventHandler) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}

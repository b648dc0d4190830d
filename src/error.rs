use thiserror::Error;

/// Failures reported by a playback host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("playback host is unavailable")]
    Unavailable,
    #[error("no analysis available for track {0}")]
    NotFound(String),
    #[error("failed to fetch analysis for track {track_id}: {source}")]
    Fetch {
        track_id: String,
        source: SourceError,
    },
    #[error("malformed analysis payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Structural problems found while validating an analysis payload.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("analysis contains no segments")]
    NoSegments,
    #[error("{what} {index} starts before the previous one")]
    Unsorted { what: &'static str, index: usize },
    #[error("{what} {index} has an invalid duration")]
    BadDuration { what: &'static str, index: usize },
    #[error("segment {index} has {len} pitch values, expected 12")]
    PitchCount { index: usize, len: usize },
    #[error("non-finite value in {what} {index}")]
    NonFinite { what: &'static str, index: usize },
}

/// Failures loading bytes from a file path or URL.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to download {url}: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },
}

#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("no artwork reference available")]
    Missing,
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("failed to decode artwork: {0}")]
    Decode(#[from] image::ImageError),
    #[error("artwork has no pixels")]
    Empty,
}

#[derive(Debug, Error)]
pub enum MountError {
    #[error("playback host not ready after {attempts} attempts")]
    HostNotReady { attempts: u32 },
    #[error("bar surface was lost by a previous mount")]
    SurfaceLost,
    #[error("failed to spawn frame loop: {0}")]
    Spawn(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

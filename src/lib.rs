//! Audio-reactive bar indicator driven by pre-computed track analysis and
//! tinted with the average color of the track artwork.

pub mod analysis;
pub mod color;
pub mod config;
pub mod error;
pub mod host;
pub mod source;
pub mod surface;
pub mod visualizer;
pub mod viz;

pub use analysis::{AnalysisSet, Beat, Segment, TrackAnalysisCache};
pub use color::{ColorSample, ColorSampler, Rgb};
pub use config::Config;
pub use host::{HostEvent, PlaybackHost, TrackInfo};
pub use source::SourceRef;
pub use surface::BarSurface;
pub use visualizer::Visualizer;
pub use viz::{AnimationDriver, BarPhysics, IntensityVector, VisualStateMapper, BAR_COUNT};

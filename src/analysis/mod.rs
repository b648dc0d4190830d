pub mod cache;
pub mod model;

pub use cache::TrackAnalysisCache;
pub use model::{AnalysisSet, Beat, Segment};

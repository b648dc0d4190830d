pub mod driver;
pub mod mapper;
pub mod physics;

pub use driver::{AnimationDriver, FrameLoop, Update};
pub use mapper::VisualStateMapper;
pub use physics::{BarPhysics, BarState};

/// Number of bars in the indicator.
pub const BAR_COUNT: usize = 6;

/// Length of a segment's pitch vector.
pub const PITCH_CLASSES: usize = 12;

/// One scale factor per bar.
pub type IntensityVector = [f32; BAR_COUNT];

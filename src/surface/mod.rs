pub mod style;
pub mod terminal;

pub use terminal::TerminalSurface;

use crate::color::ColorSample;
use crate::viz::IntensityVector;

/// Where the bars end up: a container of `BAR_COUNT` elements, each taking a
/// vertical scale per frame, plus a color and glow pair.
pub trait BarSurface {
    /// Called once when the visualizer mounts.
    fn attach(&mut self) {}

    fn set_scales(&mut self, scales: &IntensityVector);

    fn set_color(&mut self, color: &ColorSample);

    /// Called once when the visualizer unmounts.
    fn detach(&mut self) {}
}

impl<S: BarSurface + ?Sized> BarSurface for Box<S> {
    fn attach(&mut self) {
        (**self).attach()
    }

    fn set_scales(&mut self, scales: &IntensityVector) {
        (**self).set_scales(scales)
    }

    fn set_color(&mut self, color: &ColorSample) {
        (**self).set_color(color)
    }

    fn detach(&mut self) {
        (**self).detach()
    }
}

/// Keeps everything written to it. Handy for tests and headless runs.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    pub attached: bool,
    pub frames: Vec<IntensityVector>,
    pub colors: Vec<ColorSample>,
}

impl BarSurface for RecordingSurface {
    fn attach(&mut self) {
        self.attached = true;
    }

    fn set_scales(&mut self, scales: &IntensityVector) {
        self.frames.push(*scales);
    }

    fn set_color(&mut self, color: &ColorSample) {
        self.colors.push(*color);
    }

    fn detach(&mut self) {
        self.attached = false;
    }
}

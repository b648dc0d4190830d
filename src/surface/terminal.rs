use indicatif::{ProgressBar, ProgressStyle};

use super::style::{css_glow, css_rgb};
use super::BarSurface;
use crate::color::ColorSample;
use crate::viz::IntensityVector;

const GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Scale drawn as a full-height glyph.
const FULL_SCALE: f32 = 1.3;

/// Draws the bars as block glyphs on an indicatif line.
pub struct TerminalSurface {
    bar: ProgressBar,
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new_spinner())
    }

    /// A surface that draws nothing; for tests.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_style(
            ProgressStyle::with_template("[{elapsed_precise}] {msg}  {prefix}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        Self { bar }
    }

    pub fn message(&self) -> String {
        self.bar.message()
    }

    pub fn prefix(&self) -> String {
        self.bar.prefix()
    }
}

pub fn render_glyphs(scales: &IntensityVector) -> String {
    scales
        .iter()
        .map(|&s| {
            let level = (s / FULL_SCALE).clamp(0.0, 1.0) * (GLYPHS.len() - 1) as f32;
            GLYPHS[level.round() as usize]
        })
        .collect()
}

impl BarSurface for TerminalSurface {
    fn attach(&mut self) {
        self.bar.reset_elapsed();
    }

    fn set_scales(&mut self, scales: &IntensityVector) {
        self.bar.set_message(render_glyphs(scales));
        self.bar.tick();
    }

    fn set_color(&mut self, color: &ColorSample) {
        self.bar.set_prefix(format!("{} glow {}", css_rgb(color.rgb), css_glow(color)));
    }

    fn detach(&mut self) {
        self.bar.finish();
    }
}

use image::{imageops, DynamicImage, GenericImageView};

use super::{parse_hex, ColorSample, Rgb};
use crate::config::ColorConfig;
use crate::error::ArtworkError;
use crate::source::SourceRef;

const DEFAULT_FALLBACK: Rgb = Rgb::new(0x1d, 0xb9, 0x54);

/// Derives a single representative color from track artwork.
///
/// The image is shrunk to one pixel with an area-averaging resize and that
/// pixel is the color. Very dark results are lifted so the bars stay visible
/// on dark themes. Any failure yields the fallback color instead of an error.
#[derive(Clone, Debug)]
pub struct ColorSampler {
    fallback: Rgb,
    dark_threshold: u16,
    dark_boost: u8,
    glow_alpha: u8,
}

impl Default for ColorSampler {
    fn default() -> Self {
        Self::new(&ColorConfig::default())
    }
}

impl ColorSampler {
    pub fn new(config: &ColorConfig) -> Self {
        let fallback = parse_hex(&config.fallback).unwrap_or_else(|| {
            log::warn!("Invalid fallback color '{}', using #1db954", config.fallback);
            DEFAULT_FALLBACK
        });
        Self {
            fallback,
            dark_threshold: config.dark_threshold,
            dark_boost: config.dark_boost,
            glow_alpha: config.glow_alpha,
        }
    }

    /// Blocking: loads and decodes the artwork. Never fails.
    pub fn sample(&self, artwork: Option<&SourceRef>) -> ColorSample {
        match self.try_sample(artwork) {
            Ok(sample) => sample,
            Err(ArtworkError::Missing) => {
                log::debug!("No artwork, using fallback color");
                self.fallback_sample()
            }
            Err(e) => {
                log::warn!("Artwork color extraction failed: {}", e);
                self.fallback_sample()
            }
        }
    }

    pub fn try_sample(&self, artwork: Option<&SourceRef>) -> Result<ColorSample, ArtworkError> {
        let source = artwork.ok_or(ArtworkError::Missing)?;
        let bytes = source.load_bytes()?;
        let image = image::load_from_memory(&bytes)?;
        let sample = self.sample_image(&image)?;
        log::debug!("Sampled {:?} from {}", sample.rgb, source);
        Ok(sample)
    }

    pub fn sample_image(&self, image: &DynamicImage) -> Result<ColorSample, ArtworkError> {
        let average = average_pixel(image).ok_or(ArtworkError::Empty)?;
        Ok(self.with_glow(self.lift_dark(average)))
    }

    pub fn fallback_sample(&self) -> ColorSample {
        self.with_glow(self.fallback)
    }

    fn lift_dark(&self, rgb: Rgb) -> Rgb {
        if rgb.sum() >= self.dark_threshold {
            return rgb;
        }
        Rgb::new(
            rgb.r.saturating_add(self.dark_boost),
            rgb.g.saturating_add(self.dark_boost),
            rgb.b.saturating_add(self.dark_boost),
        )
    }

    fn with_glow(&self, rgb: Rgb) -> ColorSample {
        ColorSample {
            rgb,
            glow_alpha: self.glow_alpha,
        }
    }
}

/// Area-averaged color of the whole image, or `None` if it has no pixels.
pub fn average_pixel(image: &DynamicImage) -> Option<Rgb> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }
    let one = imageops::thumbnail(&image.to_rgba8(), 1, 1);
    let [r, g, b, _] = one.get_pixel(0, 0).0;
    Some(Rgb::new(r, g, b))
}

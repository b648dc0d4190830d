pub mod sampler;

pub use sampler::ColorSampler;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn sum(self) -> u16 {
        self.r as u16 + self.g as u16 + self.b as u16
    }
}

/// Bar tint plus its translucent glow variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorSample {
    pub rgb: Rgb,
    /// Opacity of the glow (0-255); the glow reuses `rgb`.
    pub glow_alpha: u8,
}

/// Parse `#rrggbb` (the leading `#` is optional).
pub fn parse_hex(s: &str) -> Option<Rgb> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
}

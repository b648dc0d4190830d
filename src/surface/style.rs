//! CSS values for a DOM-backed bar container.

use crate::color::{ColorSample, Rgb};
use crate::viz::BAR_COUNT;

pub const CONTAINER_ID: &str = "dynamic-island-viz";
pub const BAR_CLASS: &str = "viz-pill";
pub const COLOR_VAR: &str = "--viz-color";
pub const GLOW_VAR: &str = "--viz-glow";

/// `transform` value for one bar.
pub fn scale_transform(scale: f32) -> String {
    format!("scaleY({:.4})", scale)
}

pub fn css_rgb(rgb: Rgb) -> String {
    format!("rgb({}, {}, {})", rgb.r, rgb.g, rgb.b)
}

/// Glow as `#rrggbbaa`.
pub fn css_glow(color: &ColorSample) -> String {
    let Rgb { r, g, b } = color.rgb;
    format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, color.glow_alpha)
}

/// The two custom properties set on the container, in order.
pub fn color_properties(color: &ColorSample) -> [(&'static str, String); 2] {
    [
        (COLOR_VAR, css_rgb(color.rgb)),
        (GLOW_VAR, css_glow(color)),
    ]
}

/// Stylesheet for the container and its pills, starting in `fallback`.
pub fn stylesheet(fallback: &ColorSample, rest_scale: f32) -> String {
    let Rgb { r, g, b } = fallback.rgb;
    format!(
        r#"#{id} {{
    display: flex; align-items: center; justify-content: center;
    gap: 3px; height: 20px; width: 40px;
    margin-right: 12px; margin-left: 8px;
    {color_var}: {color};
    {glow_var}: rgba({r}, {g}, {b}, 0.4);
}}
.{class} {{
    width: 3px; height: 100%;
    background-color: var({color_var});
    border-radius: 10px;
    transform-origin: center;
    transform: {rest};
    will-change: transform;
    transition: background-color 0.8s ease;
    box-shadow: 0 0 10px var({glow_var});
}}
"#,
        id = CONTAINER_ID,
        class = BAR_CLASS,
        color_var = COLOR_VAR,
        glow_var = GLOW_VAR,
        color = css_rgb(fallback.rgb),
        rest = scale_transform(rest_scale),
    )
}

/// Container markup with one pill per bar.
pub fn container_markup() -> String {
    let pills = format!(r#"<div class="{}"></div>"#, BAR_CLASS).repeat(BAR_COUNT);
    format!(r#"<div id="{}">{}</div>"#, CONTAINER_ID, pills)
}

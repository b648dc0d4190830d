use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::viz::{BAR_COUNT, PITCH_CLASSES};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mapper: MapperConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub color: ColorConfig,
    #[serde(default)]
    pub driver: DriverConfig,
}

/// Constants for turning a segment and beat into bar targets.
#[derive(Debug, Clone, Deserialize)]
pub struct MapperConfig {
    #[serde(default = "default_baseline")]
    pub baseline: f32,
    #[serde(default = "default_beat_boost")]
    pub beat_boost: f32,
    #[serde(default = "default_loudness_offset_db")]
    pub loudness_offset_db: f32,
    #[serde(default = "default_loudness_range_db")]
    pub loudness_range_db: f32,
    #[serde(default = "default_loudness_floor")]
    pub loudness_floor: f32,
    /// Pitch classes (0 = C) shown by each bar, left to right.
    #[serde(default = "default_pitch_channels")]
    pub pitch_channels: [usize; BAR_COUNT],
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhysicsConfig {
    #[serde(default = "default_attack")]
    pub attack: f32,
    #[serde(default = "default_decay")]
    pub decay: f32,
    #[serde(default = "default_floor")]
    pub floor: f32,
    #[serde(default = "default_breath_amplitude")]
    pub breath_amplitude: f32,
    #[serde(default = "default_breath_period_ms")]
    pub breath_period_ms: f64,
    /// Scale attack/decay by the real frame interval instead of assuming 60 Hz.
    #[serde(default)]
    pub normalize_frame_time: bool,
    #[serde(default = "default_reference_frame_ms")]
    pub reference_frame_ms: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColorConfig {
    #[serde(default = "default_fallback")]
    pub fallback: String,
    #[serde(default = "default_dark_threshold")]
    pub dark_threshold: u16,
    #[serde(default = "default_dark_boost")]
    pub dark_boost: u8,
    #[serde(default = "default_glow_alpha")]
    pub glow_alpha: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_mount_retry_ms")]
    pub mount_retry_ms: u64,
    #[serde(default = "default_mount_attempts")]
    pub mount_attempts: u32,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            baseline: default_baseline(),
            beat_boost: default_beat_boost(),
            loudness_offset_db: default_loudness_offset_db(),
            loudness_range_db: default_loudness_range_db(),
            loudness_floor: default_loudness_floor(),
            pitch_channels: default_pitch_channels(),
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            attack: default_attack(),
            decay: default_decay(),
            floor: default_floor(),
            breath_amplitude: default_breath_amplitude(),
            breath_period_ms: default_breath_period_ms(),
            normalize_frame_time: false,
            reference_frame_ms: default_reference_frame_ms(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            fallback: default_fallback(),
            dark_threshold: default_dark_threshold(),
            dark_boost: default_dark_boost(),
            glow_alpha: default_glow_alpha(),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            mount_retry_ms: default_mount_retry_ms(),
            mount_attempts: default_mount_attempts(),
        }
    }
}

fn default_baseline() -> f32 { 0.2 }
fn default_beat_boost() -> f32 { 0.3 }
fn default_loudness_offset_db() -> f32 { 35.0 }
fn default_loudness_range_db() -> f32 { 20.0 }
fn default_loudness_floor() -> f32 { 0.4 }
fn default_pitch_channels() -> [usize; BAR_COUNT] { [0, 2, 4, 7, 9, 11] }
fn default_attack() -> f32 { 0.6 }
fn default_decay() -> f32 { 0.08 }
fn default_floor() -> f32 { 0.2 }
fn default_breath_amplitude() -> f32 { 0.03 }
fn default_breath_period_ms() -> f64 { 50.0 }
fn default_reference_frame_ms() -> f64 { 1000.0 / 60.0 }
fn default_fallback() -> String { "#1db954".into() }
fn default_dark_threshold() -> u16 { 50 }
fn default_dark_boost() -> u8 { 60 }
fn default_glow_alpha() -> u8 { 0x88 }
fn default_fps() -> u32 { 60 }
fn default_mount_retry_ms() -> u64 { 500 }
fn default_mount_attempts() -> u32 { 20 }

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if let Some(&idx) = self.mapper.pitch_channels.iter().find(|&&i| i >= PITCH_CLASSES) {
            return invalid(format!("pitch channel {} is out of range 0-11", idx));
        }
        if !(self.mapper.loudness_range_db.is_finite() && self.mapper.loudness_range_db > 0.0) {
            return invalid("mapper.loudness_range_db must be positive".into());
        }
        for (name, rate) in [("attack", self.physics.attack), ("decay", self.physics.decay)] {
            if !(rate > 0.0 && rate <= 1.0) {
                return invalid(format!("physics.{} must be in (0, 1], got {}", name, rate));
            }
        }
        if !self.physics.floor.is_finite() || !self.mapper.baseline.is_finite() {
            return invalid("physics.floor and mapper.baseline must be finite".into());
        }
        if !(self.physics.breath_period_ms > 0.0 && self.physics.reference_frame_ms > 0.0) {
            return invalid("physics periods must be positive".into());
        }
        if crate::color::parse_hex(&self.color.fallback).is_none() {
            return invalid(format!("color.fallback '{}' is not a #rrggbb color", self.color.fallback));
        }
        if self.driver.fps == 0 {
            return invalid("driver.fps must be at least 1".into());
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Explicit path first, then `./islandviz.toml`, then the per-user config dirs.
pub fn discover_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("islandviz.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("islandviz").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("islandviz").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

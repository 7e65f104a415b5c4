mod plugin;

use std::path::Path;
use std::time::Duration;

use bevy::{asset::Asset, prelude::*, reflect::TypePath};
pub use plugin::ConfigPlugin;
use serde::{Deserialize, Deserializer, de};

use crate::error::ConfigError;
use crate::field::{
  DEFAULT_DECAY, DEFAULT_GRID_SIZE, DEFAULT_POWER_CAP, DEFAULT_RADIUS_DIVISOR, DEFAULT_SEED_RANGE,
};
use crate::scroll::{DEFAULT_LINE_HEIGHT, DEFAULT_SCROLL_DURATION};
use crate::viewport::DEFAULT_RESIZE_DEBOUNCE;

/// Default path of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "assets/config/effect.config.toml";

#[derive(Asset, TypePath, Deserialize, Debug, Clone, Default)]
pub struct EffectConfig {
  #[serde(default)]
  pub window: WindowConfig,
  #[serde(default)]
  pub page: PageConfig,
  /// The image element to distort. Required at runtime; optional here so a
  /// missing section is reported as a configuration error instead of a
  /// parse error.
  pub target: Option<TargetConfig>,
  #[serde(default)]
  pub field: FieldConfig,
  #[serde(default)]
  pub render: RenderConfig,
  #[serde(default)]
  pub viewport: ViewportConfig,
  #[serde(default)]
  pub scroll: ScrollConfig,
}

impl EffectConfig {
  /// Parses and validates a TOML document.
  pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
  }

  /// Reads, parses and validates a config file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    let config = Self::from_toml_str(&source)?;
    log::debug!("Loaded effect config from {}", path.display());
    Ok(config)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    validate_target(self.target.as_ref())?;
    self.page.validate()?;
    self.field.validate()?;
    self.render.validate()?;
    self.scroll.validate()
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct WindowConfig {
  pub width: u32,
  pub height: u32,
  pub title: String,
}

impl Default for WindowConfig {
  fn default() -> Self {
    Self {
      width: 1280,
      height: 800,
      title: "Liquid Pixels".into(),
    }
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PageConfig {
  /// Document height in logical pixels; sets the scroll extent.
  pub height: f32,
  #[serde(deserialize_with = "deserialize_hex_color")]
  pub background: [f32; 3],
}

impl Default for PageConfig {
  fn default() -> Self {
    Self {
      height: 2400.0,
      background: [0.055, 0.055, 0.055],
    }
  }
}

impl PageConfig {
  fn validate(&self) -> Result<(), ConfigError> {
    non_negative("page.height", self.height)
  }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TargetConfig {
  /// Image path relative to the asset directory.
  pub image: String,
  /// Left edge; centered in the viewport when absent.
  #[serde(default)]
  pub left: Option<f32>,
  pub top: f32,
  pub width: f32,
  /// Height; derived from the image aspect ratio when absent.
  #[serde(default)]
  pub height: Option<f32>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct FieldConfig {
  /// Grid edge length in cells.
  pub size: u32,
  /// Per-tick decay for cells and pointer velocity, in `(0, 1]`.
  pub decay: f32,
  /// Injection radius is `size / radius_divisor` grid units.
  pub radius_divisor: f32,
  /// Falloff power cap at the pointer's own cell.
  pub power_cap: f32,
  /// Upper bounds of the two seeding channels.
  pub seed_range: [f32; 2],
  /// Fixed RNG seed; entropy-seeded when absent.
  pub seed: Option<u64>,
}

impl Default for FieldConfig {
  fn default() -> Self {
    Self {
      size: DEFAULT_GRID_SIZE,
      decay: DEFAULT_DECAY,
      radius_divisor: DEFAULT_RADIUS_DIVISOR,
      power_cap: DEFAULT_POWER_CAP,
      seed_range: DEFAULT_SEED_RANGE.to_array(),
      seed: None,
    }
  }
}

impl FieldConfig {
  /// Injection radius in grid units.
  pub fn radius(&self) -> f32 {
    self.size as f32 / self.radius_divisor
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.size == 0 || self.size > 1024 {
      return Err(invalid("field.size", format!("{} not in 1..=1024", self.size)));
    }
    if !(self.decay > 0.0 && self.decay <= 1.0) {
      return Err(invalid("field.decay", format!("{} not in (0, 1]", self.decay)));
    }
    positive("field.radius_divisor", self.radius_divisor)?;
    positive("field.power_cap", self.power_cap)?;
    non_negative("field.seed_range[0]", self.seed_range[0])?;
    non_negative("field.seed_range[1]", self.seed_range[1])
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RenderConfig {
  /// Displacement strength in UV units per field unit.
  pub strength: f32,
  /// Plane subdivisions per side.
  pub segments: u32,
  /// Cap on the window scale factor.
  pub max_pixel_ratio: f32,
}

impl Default for RenderConfig {
  fn default() -> Self {
    Self {
      strength: 0.5,
      segments: 25,
      max_pixel_ratio: 2.0,
    }
  }
}

impl RenderConfig {
  fn validate(&self) -> Result<(), ConfigError> {
    if !self.strength.is_finite() {
      return Err(invalid("render.strength", "must be finite".into()));
    }
    if self.segments == 0 {
      return Err(invalid("render.segments", "must be at least 1".into()));
    }
    positive("render.max_pixel_ratio", self.max_pixel_ratio)
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ViewportConfig {
  pub resize_debounce_ms: u64,
}

impl Default for ViewportConfig {
  fn default() -> Self {
    Self {
      resize_debounce_ms: DEFAULT_RESIZE_DEBOUNCE.as_millis() as u64,
    }
  }
}

impl ViewportConfig {
  pub fn resize_debounce(&self) -> Duration {
    Duration::from_millis(self.resize_debounce_ms)
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ScrollConfig {
  /// Ease duration in seconds; 0 disables smoothing.
  pub duration: f32,
  pub wheel_multiplier: f32,
  /// Pixels per line for line-based wheel devices.
  pub line_height: f32,
}

impl Default for ScrollConfig {
  fn default() -> Self {
    Self {
      duration: DEFAULT_SCROLL_DURATION,
      wheel_multiplier: 1.0,
      line_height: DEFAULT_LINE_HEIGHT,
    }
  }
}

impl ScrollConfig {
  fn validate(&self) -> Result<(), ConfigError> {
    non_negative("scroll.duration", self.duration)?;
    if !self.wheel_multiplier.is_finite() {
      return Err(invalid("scroll.wheel_multiplier", "must be finite".into()));
    }
    non_negative("scroll.line_height", self.line_height)
  }
}

fn validate_target(target: Option<&TargetConfig>) -> Result<(), ConfigError> {
  let target = target.ok_or(ConfigError::MissingTarget)?;
  if target.image.trim().is_empty() {
    return Err(ConfigError::EmptyImagePath);
  }
  positive("target.width", target.width)?;
  if !target.top.is_finite() {
    return Err(invalid("target.top", "must be finite".into()));
  }
  if target.left.is_some_and(|left| !left.is_finite()) {
    return Err(invalid("target.left", "must be finite".into()));
  }
  if let Some(height) = target.height {
    positive("target.height", height)?;
  }
  Ok(())
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
  ConfigError::InvalidValue { field, reason }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
  if value.is_finite() && value > 0.0 {
    Ok(())
  } else {
    Err(invalid(field, format!("{} must be positive", value)))
  }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
  if value.is_finite() && value >= 0.0 {
    Ok(())
  } else {
    Err(invalid(field, format!("{} must be non-negative", value)))
  }
}

fn deserialize_hex_color<'de, D>(deserializer: D) -> Result<[f32; 3], D::Error>
where
  D: Deserializer<'de>,
{
  let s: String = Deserialize::deserialize(deserializer)?;
  let s = s.trim_start_matches('#');
  if s.len() != 6 {
    return Err(de::Error::custom("hex color must be 6 characters"));
  }
  let r = u8::from_str_radix(&s[0..2], 16).map_err(de::Error::custom)?;
  let g = u8::from_str_radix(&s[2..4], 16).map_err(de::Error::custom)?;
  let b = u8::from_str_radix(&s[4..6], 16).map_err(de::Error::custom)?;
  Ok([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0])
}

#[derive(Resource)]
pub struct ConfigHandle(pub Handle<EffectConfig>);

/// Active configuration. Replaced wholesale on hot reload; systems react via
/// change detection.
#[derive(Resource, Debug, Clone)]
pub struct ConfigLoaded {
  pub window: WindowConfig,
  pub page: PageConfig,
  pub target: Option<TargetConfig>,
  pub field: FieldConfig,
  pub render: RenderConfig,
  pub viewport: ViewportConfig,
  pub scroll: ScrollConfig,
}

impl ConfigLoaded {
  /// The target element section, or the configuration error for its absence.
  pub fn target(&self) -> Result<&TargetConfig, ConfigError> {
    validate_target(self.target.as_ref())?;
    self.target.as_ref().ok_or(ConfigError::MissingTarget)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    validate_target(self.target.as_ref())?;
    self.page.validate()?;
    self.field.validate()?;
    self.render.validate()?;
    self.scroll.validate()
  }

  pub fn background(&self) -> Color {
    let [r, g, b] = self.page.background;
    Color::srgb(r, g, b)
  }
}

impl From<EffectConfig> for ConfigLoaded {
  fn from(config: EffectConfig) -> Self {
    Self {
      window: config.window,
      page: config.page,
      target: config.target,
      field: config.field,
      render: config.render,
      viewport: config.viewport,
      scroll: config.scroll,
    }
  }
}

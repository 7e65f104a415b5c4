//! Error types for configuration and effect startup.

use std::io;

/// The source image could not be loaded.
#[derive(Debug, Clone)]
pub struct AssetLoadError {
  pub path: String,
  pub reason: String,
}

impl std::fmt::Display for AssetLoadError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "failed to load image '{}': {}", self.path, self.reason)
  }
}

impl std::error::Error for AssetLoadError {}

/// Invalid or unreadable configuration.
#[derive(Debug)]
pub enum ConfigError {
  Io(io::Error),
  Parse(toml::de::Error),
  MissingTarget,
  EmptyImagePath,
  InvalidValue { field: &'static str, reason: String },
}

impl From<io::Error> for ConfigError {
  fn from(err: io::Error) -> Self {
    Self::Io(err)
  }
}

impl From<toml::de::Error> for ConfigError {
  fn from(err: toml::de::Error) -> Self {
    Self::Parse(err)
  }
}

impl std::fmt::Display for ConfigError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Io(e) => write!(f, "I/O error: {}", e),
      Self::Parse(e) => write!(f, "parse error: {}", e),
      Self::MissingTarget => write!(f, "no [target] element configured"),
      Self::EmptyImagePath => write!(f, "target.image must not be empty"),
      Self::InvalidValue { field, reason } => write!(f, "invalid {}: {}", field, reason),
    }
  }
}

impl std::error::Error for ConfigError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Io(e) => Some(e),
      Self::Parse(e) => Some(e),
      _ => None,
    }
  }
}

/// Terminal failure of the effect instance.
#[derive(Debug)]
pub enum EffectError {
  AssetLoad(AssetLoadError),
  Config(ConfigError),
}

impl From<AssetLoadError> for EffectError {
  fn from(err: AssetLoadError) -> Self {
    Self::AssetLoad(err)
  }
}

impl From<ConfigError> for EffectError {
  fn from(err: ConfigError) -> Self {
    Self::Config(err)
  }
}

impl std::fmt::Display for EffectError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::AssetLoad(e) => write!(f, "asset load error: {}", e),
      Self::Config(e) => write!(f, "configuration error: {}", e),
    }
  }
}

impl std::error::Error for EffectError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::AssetLoad(e) => Some(e),
      Self::Config(e) => Some(e),
    }
  }
}

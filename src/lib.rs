//! Pointer-velocity driven pixel displacement for an image on a scrolling
//! page.
//!
//! A coarse grid of 2D offsets decays every frame and is pushed around by the
//! pointer's velocity near its position. A shader samples the image through
//! that grid, so moving the pointer over the image smears its pixels in blocky
//! cells that settle back over time.
//!
//! ```no_run
//! use bevy::prelude::*;
//! use liquid_pixels::{ConfigLoaded, ConfigPlugin, EffectConfig, LiquidPixelsPlugin};
//!
//! let config = EffectConfig::load("assets/config/effect.config.toml").unwrap();
//! App::new()
//!   .add_plugins(DefaultPlugins)
//!   .insert_resource(ConfigLoaded::from(config))
//!   .add_plugins(ConfigPlugin { watch: None })
//!   .add_plugins(LiquidPixelsPlugin)
//!   .run();
//! ```

pub mod config;
pub mod effect;
pub mod error;
pub mod field;
pub mod page;
pub mod pointer;
pub mod render;
pub mod scroll;
pub mod viewport;
#[cfg(feature = "visual_debug")]
pub mod visual_debug;

pub use config::{ConfigLoaded, ConfigPlugin, EffectConfig};
pub use effect::{
  DisposeEffect, DistortionEffect, EffectFailure, EffectSet, EffectState, LiquidPixelsPlugin,
  SourceImage,
};
pub use error::{AssetLoadError, ConfigError, EffectError};
pub use field::DisplacementField;
pub use page::TargetElement;
pub use pointer::PointerVelocityTracker;
pub use render::{
  DistortionBlit, DistortionCamera, DistortionMaterial, DistortionPlane, DistortionRenderer,
};
pub use scroll::SmoothScroll;
pub use viewport::{Placement, ViewportProjector};

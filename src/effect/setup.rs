use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::loading::fail;
use super::{DistortionEffect, EffectState, EffectTuning, SourceImage};
use crate::config::ConfigLoaded;
use crate::error::{ConfigError, EffectError};
use crate::field::DisplacementField;
use crate::page::{TargetElement, scroll_limit};
use crate::render::{DistortionMaterial, DistortionRenderer};
use crate::scroll::SmoothScroll;
use crate::viewport::{ResizeDebounce, ViewportProjector};

/// Viewport in logical pixels, falling back to the configured window size.
pub(super) fn viewport_size(window: Option<&Window>, config: &ConfigLoaded) -> Vec2 {
  match window {
    Some(window) => Vec2::new(window.width(), window.height()),
    None => Vec2::new(config.window.width as f32, config.window.height as f32),
  }
}

/// Pixels rendered per logical pixel: the window's pixel ratio, capped at
/// `render.max_pixel_ratio`.
pub(super) fn render_scale(window: Option<&Window>, config: &ConfigLoaded) -> f32 {
  window
    .map_or(1.0, Window::scale_factor)
    .min(config.render.max_pixel_ratio)
}

#[allow(clippy::too_many_arguments)]
pub(super) fn initialize_effect(
  mut commands: Commands,
  config: Res<ConfigLoaded>,
  source: Res<SourceImage>,
  element: Res<TargetElement>,
  windows: Query<&Window, With<PrimaryWindow>>,
  mut images: ResMut<Assets<Image>>,
  mut meshes: ResMut<Assets<Mesh>>,
  mut materials: ResMut<Assets<DistortionMaterial>>,
  mut next_state: ResMut<NextState<EffectState>>,
) {
  let window = windows.single().ok();
  let viewport = viewport_size(window, &config);

  let mut rng = match config.field.seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_os_rng(),
  };
  let size = config.field.size;
  let field = DisplacementField::seeded(
    size,
    size,
    Vec2::from_array(config.field.seed_range),
    &mut rng,
  );

  let scroll = SmoothScroll::new(
    config.scroll.duration,
    scroll_limit(config.page.height, viewport.y),
  );
  let mut projector = ViewportProjector::new(viewport);
  projector.capture_bounds(element.client_rect(viewport.x, scroll.value()), scroll.value());

  let Some(placement) = projector.placement(scroll.value()) else {
    let error = ConfigError::InvalidValue {
      field: "target",
      reason: format!("no layout box for {}", source.path),
    };
    fail(&mut commands, &mut next_state, EffectError::from(error));
    return;
  };

  let tuning = EffectTuning::from_config(&config, &field);
  let renderer = DistortionRenderer::initialize(
    &mut commands,
    &mut images,
    &mut meshes,
    &mut materials,
    source.handle.clone(),
    &field,
    config.render.segments,
    tuning.strength,
    viewport,
    render_scale(window, &config),
    placement,
  );

  info!(
    "Liquid pixels running: {}x{} field, viewport {}x{}, element {:?}",
    field.width(),
    field.height(),
    viewport.x,
    viewport.y,
    projector.bounds()
  );

  commands.insert_resource(renderer);
  commands.insert_resource(DistortionEffect::new(
    field,
    projector,
    scroll,
    ResizeDebounce::new(viewport.x, config.viewport.resize_debounce()),
    tuning,
  ));
  next_state.set(EffectState::Running);
}

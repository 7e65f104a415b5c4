use bevy::ecs::message::MessageReader;
use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::{CursorMoved, PrimaryWindow, WindowResized};

use super::setup::{render_scale, viewport_size};
use super::{DistortionEffect, SourceImage};
use crate::config::ConfigLoaded;
use crate::page::{TargetElement, scroll_limit};
use crate::render::{
  DistortionBlit, DistortionCamera, DistortionMaterial, DistortionPlane, DistortionRenderer,
};

/// Wheel input in page pixels, positive scrolling down the page.
pub(crate) fn wheel_delta(unit: MouseScrollUnit, y: f32, line_height: f32, multiplier: f32) -> f32 {
  let pixels = match unit {
    MouseScrollUnit::Line => y * line_height,
    MouseScrollUnit::Pixel => y,
  };
  -pixels * multiplier
}

pub(super) fn advance_scroll(
  mut effect: ResMut<DistortionEffect>,
  mut wheel: MessageReader<MouseWheel>,
  config: Res<ConfigLoaded>,
  time: Res<Time>,
) {
  for event in wheel.read() {
    let delta = wheel_delta(
      event.unit,
      event.y,
      config.scroll.line_height,
      config.scroll.wheel_multiplier,
    );
    effect.scroll.scroll_by(delta);
  }

  let previous = effect.scroll.value();
  let current = effect.scroll.advance(time.delta_secs());
  // Sub-pixel scroll steps don't move the plane.
  if previous.round() != current.round() {
    effect.mark_placement_dirty();
  }
}

pub(super) fn watch_resize(
  mut effect: ResMut<DistortionEffect>,
  mut resized: MessageReader<WindowResized>,
  primary: Query<Entity, With<PrimaryWindow>>,
  time: Res<Time>,
) {
  let primary = primary.single().ok();
  for event in resized.read() {
    if primary.is_some_and(|window| window != event.window) {
      continue;
    }
    effect.resize.on_resize(event.width, time.elapsed());
  }
}

pub(super) fn apply_resize(
  mut effect: ResMut<DistortionEffect>,
  time: Res<Time>,
  windows: Query<&Window, With<PrimaryWindow>>,
  element: Res<TargetElement>,
  config: Res<ConfigLoaded>,
  renderer: Res<DistortionRenderer>,
  mut cameras: Query<&mut Projection, With<DistortionCamera>>,
) {
  if !effect.resize.poll(time.elapsed()) {
    return;
  }

  let viewport = viewport_size(windows.single().ok(), &config);
  let effect = &mut *effect;
  effect.projector.set_viewport(viewport);
  effect
    .scroll
    .set_limit(scroll_limit(config.page.height, viewport.y));
  let scroll = effect.scroll.value();
  effect
    .projector
    .capture_bounds(element.client_rect(viewport.x, scroll), scroll);
  effect.mark_placement_dirty();
  renderer.update_projection(viewport, &mut cameras);

  debug!(
    "Viewport resized to {}x{}, element {:?}",
    viewport.x,
    viewport.y,
    effect.projector.bounds()
  );
}

pub(super) fn track_pointer(
  mut effect: ResMut<DistortionEffect>,
  mut cursor: MessageReader<CursorMoved>,
) {
  for event in cursor.read() {
    let scroll = effect.scroll.value();
    if let Some(normalized) = effect.projector.normalize(event.position, scroll) {
      effect.pointer.on_pointer_move(normalized);
    }
  }
}

pub(super) fn tick_field(mut effect: ResMut<DistortionEffect>) {
  effect.tick();
}

pub(super) fn render_frame(
  mut effect: ResMut<DistortionEffect>,
  renderer: Res<DistortionRenderer>,
  mut images: ResMut<Assets<Image>>,
  mut materials: ResMut<Assets<DistortionMaterial>>,
  mut planes: Query<&mut Transform, With<DistortionPlane>>,
) {
  let placement = effect.take_placement();
  renderer.render_frame(
    placement,
    &effect.field,
    effect.tuning.strength,
    &mut images,
    &mut materials,
    &mut planes,
  );
}

/// Applies reloaded tunables and target layout. The grid size and source
/// image are fixed for the lifetime of the effect.
pub(super) fn apply_config_changes(
  config: Res<ConfigLoaded>,
  mut effect: ResMut<DistortionEffect>,
  mut element: ResMut<TargetElement>,
  source: Res<SourceImage>,
  images: Res<Assets<Image>>,
) {
  if !config.is_changed() {
    return;
  }

  let effect = &mut *effect;
  if config.field.size != effect.field.width() {
    warn!(
      "field.size changed to {}; restart to resize the {}x{} field",
      config.field.size,
      effect.field.width(),
      effect.field.height()
    );
  }
  effect.tuning = super::EffectTuning::from_config(&config, &effect.field);
  effect.scroll.set_duration(config.scroll.duration);
  let viewport = effect.projector.viewport();
  effect
    .scroll
    .set_limit(scroll_limit(config.page.height, viewport.y));
  effect.resize.set_delay(config.viewport.resize_debounce());

  if let Ok(target) = config.target() {
    if target.image != source.path {
      warn!(
        "target.image changed to {}; restart to load it in place of {}",
        target.image, source.path
      );
    }
    let intrinsic = images
      .get(&source.handle)
      .map(Image::size)
      .unwrap_or(UVec2::ZERO);
    let relaid = TargetElement::from_config(target, intrinsic);
    if relaid != *element {
      *element = relaid;
      let scroll = effect.scroll.value();
      effect
        .projector
        .capture_bounds(element.client_rect(viewport.x, scroll), scroll);
      effect.mark_placement_dirty();
      debug!("Target element moved to {:?}", effect.projector.bounds());
    }
  }
  debug!("Effect tuning: {:?}", effect.tuning);
}

/// Keeps the offscreen target at the viewport size times the window's pixel
/// ratio, capped at `render.max_pixel_ratio`. Layout stays in logical pixels.
pub(super) fn sync_render_target(
  effect: Res<DistortionEffect>,
  config: Res<ConfigLoaded>,
  windows: Query<&Window, With<PrimaryWindow>>,
  mut renderer: ResMut<DistortionRenderer>,
  mut images: ResMut<Assets<Image>>,
  mut blits: Query<&mut Sprite, With<DistortionBlit>>,
) {
  let window = windows.single().ok();
  let scale = render_scale(window, &config);
  let viewport = effect.projector.viewport();
  if renderer.resize_target(viewport, scale, &mut images, &mut blits) {
    debug!(
      "Render target {}x{} (pixel ratio {:?}, capped at {})",
      renderer.target_size.x,
      renderer.target_size.y,
      window.map(Window::scale_factor),
      config.render.max_pixel_ratio
    );
  }
}

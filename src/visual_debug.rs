//! Debug overlay and tuning panel.
//!
//! F3 toggles per-cell displacement vectors drawn over the plane. The egui
//! panel shows effect state and lets decay and strength be adjusted live;
//! the next config reload overwrites those edits.

use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPlugin, EguiPrimaryContextPass, egui};

use crate::effect::{DistortionEffect, EffectSet, EffectState};
use crate::render::DistortionPlane;

/// Field vectors are drawn this many times longer than the UV offset they
/// cause, relative to the plane size.
const VECTOR_SCALE: f32 = 4.0;

#[derive(Resource, Default)]
pub struct FieldOverlay {
  pub enabled: bool,
}

pub struct VisualDebugPlugin;

impl Plugin for VisualDebugPlugin {
  fn build(&self, app: &mut App) {
    if !app.is_plugin_added::<EguiPlugin>() {
      app.add_plugins(EguiPlugin::default());
    }
    app
      .init_resource::<FieldOverlay>()
      .add_systems(
        Update,
        (toggle_overlay, draw_field_vectors.after(EffectSet)).chain(),
      )
      .add_systems(EguiPrimaryContextPass, tuning_panel);
  }
}

/// F3: toggle the field vector overlay
fn toggle_overlay(keyboard: Res<ButtonInput<KeyCode>>, mut overlay: ResMut<FieldOverlay>) {
  if keyboard.just_pressed(KeyCode::F3) {
    overlay.enabled = !overlay.enabled;
    info!(
      "Field overlay {}",
      if overlay.enabled { "ENABLED" } else { "DISABLED" }
    );
  }
}

fn draw_field_vectors(
  mut gizmos: Gizmos,
  overlay: Res<FieldOverlay>,
  effect: Option<Res<DistortionEffect>>,
  planes: Query<&Transform, With<DistortionPlane>>,
) {
  if !overlay.enabled {
    return;
  }
  let Some(effect) = effect else { return };
  let Ok(transform) = planes.single() else {
    return;
  };

  let origin = transform.translation.truncate();
  let size = transform.scale.truncate();
  let field = &effect.field;
  let cell_size = size / Vec2::new(field.width() as f32, field.height() as f32);
  let strength = effect.tuning.strength;

  for row in 0..field.height() {
    for col in 0..field.width() {
      let offset = field.cell(col, row);
      if offset.length_squared() < 1e-6 {
        continue;
      }
      // Rows run bottom-up, matching the plane's y-up UVs.
      let center = origin - size / 2.0 + (Vec2::new(col as f32, row as f32) + 0.5) * cell_size;
      let tip = center + offset * strength * size * VECTOR_SCALE / field.width() as f32;
      gizmos.line_2d(center, tip, Color::srgb(1.0, 1.0, 0.0));
    }
  }

  // Element outline
  gizmos.rect_2d(
    Isometry2d::from_translation(origin),
    size,
    Color::srgb(0.0, 1.0, 0.0),
  );
}

fn tuning_panel(
  mut contexts: EguiContexts,
  state: Res<State<EffectState>>,
  effect: Option<ResMut<DistortionEffect>>,
  mut overlay: ResMut<FieldOverlay>,
) {
  let Ok(ctx) = contexts.ctx_mut() else {
    return;
  };

  egui::Window::new("Liquid Pixels")
    .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
    .default_width(220.0)
    .resizable(false)
    .show(ctx, |ui| {
      ui.label(format!("State: {:?}", state.get()));

      let Some(mut effect) = effect else {
        return;
      };
      ui.label(format!(
        "Scroll: {:.0} / {:.0}",
        effect.scroll.value(),
        effect.scroll.limit()
      ));
      let velocity = effect.pointer.velocity();
      ui.label(format!("Velocity: ({:.4}, {:.4})", velocity.x, velocity.y));
      ui.label(format!("Max offset: {:.4}", effect.field.max_magnitude()));

      ui.separator();
      ui.add(egui::Slider::new(&mut effect.tuning.decay, 0.5..=1.0).text("Decay"));
      ui.add(egui::Slider::new(&mut effect.tuning.strength, 0.0..=2.0).text("Strength"));
      ui.checkbox(&mut overlay.enabled, "Field vectors (F3)");
    });
}

//! Effect orchestration.
//!
//! `Loading → Initialized → Running`, with `Failed` and `Disposed` as terminal
//! states. While running, one chained pass per frame turns input state into
//! GPU-visible changes:
//!
//! 1. wheel input advances the smoothed scroll,
//! 2. width changes arm the resize debounce; a fired debounce recomputes
//!    bounds, placement and the camera projection, and the offscreen target
//!    follows the viewport and the capped pixel ratio,
//! 3. cursor movement over the element updates pointer velocity,
//! 4. the field decays, takes the pointer impulse, and pointer velocity
//!    decays,
//! 5. the field is uploaded and placement applied when it changed.

mod dispose;
mod loading;
mod setup;
mod systems;

use bevy::ecs::message::Message;
use bevy::input::mouse::MouseWheel;
use bevy::prelude::*;
use bevy::window::{CursorMoved, WindowResized};

use crate::config::ConfigLoaded;
use crate::error::EffectError;
use crate::field::DisplacementField;
use crate::pointer::PointerVelocityTracker;
use crate::render::DistortionRenderPlugin;
use crate::scroll::SmoothScroll;
use crate::viewport::{Placement, ResizeDebounce, ViewportProjector};

/// Lifecycle of the effect instance.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EffectState {
  /// Waiting for the source image; bounds depend on its size.
  #[default]
  Loading,
  /// Scene, plane and material are built and bounds captured (one frame).
  Initialized,
  /// Per-frame tick loop.
  Running,
  /// Startup failed; see [`EffectFailure`].
  Failed,
  /// Resources released after [`DisposeEffect`] or app exit.
  Disposed,
}

/// System set containing the per-frame effect pass.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct EffectSet;

/// Request to release the effect's GPU resources and stop its systems.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct DisposeEffect;

/// Why the effect did not start.
#[derive(Resource, Debug)]
pub struct EffectFailure(pub EffectError);

/// The image being loaded for the target element.
#[derive(Resource, Debug, Clone)]
pub struct SourceImage {
  pub handle: Handle<Image>,
  pub path: String,
}

/// Tunables read every tick; replaced when the config reloads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectTuning {
  pub decay: f32,
  /// Injection radius in grid units.
  pub radius: f32,
  pub power_cap: f32,
  pub strength: f32,
}

impl EffectTuning {
  pub fn from_config(config: &ConfigLoaded, field: &DisplacementField) -> Self {
    Self {
      decay: config.field.decay,
      radius: field.radius_for(config.field.radius_divisor),
      power_cap: config.field.power_cap,
      strength: config.render.strength,
    }
  }
}

/// Composition root for the simulation side of the effect.
///
/// Input systems write producer state and the tick system is the only
/// consumer that turns it into field changes. Each field has one writer:
/// `pointer` (pointer system), `scroll` (scroll system), `projector` (setup,
/// resize and config systems), `resize` (resize systems), `field` (tick
/// system).
#[derive(Resource, Debug)]
pub struct DistortionEffect {
  pub field: DisplacementField,
  pub pointer: PointerVelocityTracker,
  pub projector: ViewportProjector,
  pub scroll: SmoothScroll,
  pub resize: ResizeDebounce,
  pub tuning: EffectTuning,
  placement_dirty: bool,
}

impl DistortionEffect {
  pub fn new(
    field: DisplacementField,
    projector: ViewportProjector,
    scroll: SmoothScroll,
    resize: ResizeDebounce,
    tuning: EffectTuning,
  ) -> Self {
    Self {
      field,
      pointer: PointerVelocityTracker::default(),
      projector,
      scroll,
      resize,
      tuning,
      placement_dirty: false,
    }
  }

  /// One simulation step: decay, then inject at the pointer (if it has
  /// entered the element), then decay pointer velocity.
  pub fn tick(&mut self) {
    let tuning = self.tuning;
    self.field.decay(tuning.decay);
    if let Some(position) = self.pointer.position() {
      self.field.inject_at(
        position,
        self.pointer.velocity(),
        tuning.radius,
        tuning.power_cap,
      );
    }
    self.pointer.decay_velocity(tuning.decay);
  }

  pub fn mark_placement_dirty(&mut self) {
    self.placement_dirty = true;
  }

  pub fn placement_dirty(&self) -> bool {
    self.placement_dirty
  }

  /// Current placement if it needs to be written this frame.
  pub fn take_placement(&mut self) -> Option<Placement> {
    if !std::mem::take(&mut self.placement_dirty) {
      return None;
    }
    self.projector.placement(self.scroll.value())
  }
}

/// Adds the liquid pixel effect for the image described by [`ConfigLoaded`].
///
/// Requires `StatesPlugin` (part of `DefaultPlugins`) and a `ConfigLoaded`
/// resource. Rendering is skipped when no `RenderPlugin` is present, which
/// keeps the simulation testable headless.
pub struct LiquidPixelsPlugin;

impl Plugin for LiquidPixelsPlugin {
  fn build(&self, app: &mut App) {
    app
      .add_plugins(DistortionRenderPlugin)
      .init_state::<EffectState>()
      .add_message::<DisposeEffect>()
      .add_message::<CursorMoved>()
      .add_message::<MouseWheel>()
      .add_message::<WindowResized>();

    app
      .add_systems(OnEnter(EffectState::Loading), loading::request_source_image)
      .add_systems(
        Update,
        loading::poll_source_image.run_if(in_state(EffectState::Loading)),
      )
      .add_systems(OnEnter(EffectState::Initialized), setup::initialize_effect);

    app.add_systems(
      Update,
      (
        systems::advance_scroll,
        systems::watch_resize,
        systems::apply_resize,
        systems::sync_render_target,
        systems::track_pointer,
        systems::tick_field,
        systems::render_frame,
      )
        .chain()
        .in_set(EffectSet)
        .run_if(in_state(EffectState::Running)),
    );

    app.add_systems(
      Update,
      (
        systems::apply_config_changes
          .before(EffectSet)
          .run_if(in_state(EffectState::Running)),
        dispose::dispose_on_request
          .after(EffectSet)
          .after(loading::poll_source_image),
      ),
    );
  }
}

//! Pointer velocity tracking in element-normalized coordinates.

use bevy::math::Vec2;

/// Tracks the pointer over the target element.
///
/// Velocity is only recomputed on move events; between events it decays once
/// per tick at the same rate as the displacement field, so an injected wake
/// fades out smoothly after the pointer stops.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerVelocityTracker {
  position: Option<Vec2>,
  previous: Vec2,
  velocity: Vec2,
}

impl PointerVelocityTracker {
  /// Records a move to `normalized` (element space, y-down, `[0,1]²`).
  ///
  /// The first move only establishes the reference position, so entering the
  /// element does not produce a velocity spike from an undefined origin.
  pub fn on_pointer_move(&mut self, normalized: Vec2) {
    if self.position.is_some() {
      self.velocity = normalized - self.previous;
    }
    self.position = Some(normalized);
    self.previous = normalized;
  }

  /// Applies one tick of exponential decay to the velocity.
  pub fn decay_velocity(&mut self, factor: f32) {
    self.velocity *= factor;
  }

  /// Last normalized position, `None` until the first move.
  pub fn position(&self) -> Option<Vec2> {
    self.position
  }

  pub fn velocity(&self) -> Vec2 {
    self.velocity
  }

  pub fn is_active(&self) -> bool {
    self.position.is_some()
  }
}

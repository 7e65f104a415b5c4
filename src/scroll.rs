//! Smoothed virtual scrolling.
//!
//! Wheel input moves a target offset immediately; the visible offset eases
//! toward it over a fixed duration with an exponential ease-out. Placement
//! reads only the eased value, so any damping lives here and not in the
//! projector.

/// Default ease duration in seconds.
pub const DEFAULT_SCROLL_DURATION: f32 = 0.9;

/// Pixels per wheel "line" for line-based scroll devices.
pub const DEFAULT_LINE_HEIGHT: f32 = 40.0;

/// Exponential ease-out, reaching exactly 1 at `t = 1`.
#[inline]
pub fn ease_out_expo(t: f32) -> f32 {
  if t >= 1.0 {
    1.0
  } else {
    (1.001 - 2.0_f32.powf(-10.0 * t)).min(1.0)
  }
}

#[derive(Debug, Clone)]
pub struct SmoothScroll {
  current: f32,
  target: f32,
  origin: f32,
  elapsed: f32,
  duration: f32,
  limit: f32,
}

impl SmoothScroll {
  /// `limit` is the maximum scroll offset (document height minus viewport
  /// height, never negative).
  pub fn new(duration: f32, limit: f32) -> Self {
    Self {
      current: 0.0,
      target: 0.0,
      origin: 0.0,
      elapsed: 0.0,
      duration,
      limit: limit.max(0.0),
    }
  }

  /// Current eased offset.
  pub fn value(&self) -> f32 {
    self.current
  }

  pub fn target(&self) -> f32 {
    self.target
  }

  pub fn limit(&self) -> f32 {
    self.limit
  }

  pub fn duration(&self) -> f32 {
    self.duration
  }

  pub fn is_animating(&self) -> bool {
    self.current != self.target
  }

  pub fn set_duration(&mut self, duration: f32) {
    self.duration = duration;
  }

  /// Updates the scroll extent, pulling the target back inside it.
  pub fn set_limit(&mut self, limit: f32) {
    self.limit = limit.max(0.0);
    if self.target > self.limit {
      self.scroll_to(self.limit);
    }
  }

  pub fn scroll_by(&mut self, delta: f32) {
    self.scroll_to(self.target + delta);
  }

  /// Starts a new ease from the current value toward `target`.
  pub fn scroll_to(&mut self, target: f32) {
    let target = target.clamp(0.0, self.limit);
    if target == self.target {
      return;
    }
    self.origin = self.current;
    self.target = target;
    self.elapsed = 0.0;
  }

  /// Advances the ease by `dt` seconds and returns the new value.
  pub fn advance(&mut self, dt: f32) -> f32 {
    if !self.is_animating() {
      return self.current;
    }
    self.elapsed += dt;
    let t = if self.duration > 0.0 {
      (self.elapsed / self.duration).clamp(0.0, 1.0)
    } else {
      1.0
    };
    self.current = self.origin + (self.target - self.origin) * ease_out_expo(t);
    if t >= 1.0 {
      self.current = self.target;
    }
    self.current
  }
}

impl Default for SmoothScroll {
  fn default() -> Self {
    Self::new(DEFAULT_SCROLL_DURATION, 0.0)
  }
}

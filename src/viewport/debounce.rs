//! Explicit debounce timer for coalescing resize bursts.

use std::time::Duration;

/// Quiet period after the last width change before recomputing layout.
pub const DEFAULT_RESIZE_DEBOUNCE: Duration = Duration::from_millis(50);

/// Trailing-edge debounce driven by an external clock.
///
/// Each `schedule` cancels the pending deadline and sets a new one; `poll`
/// fires at most once per burst.
#[derive(Debug, Clone)]
pub struct Debounce {
  delay: Duration,
  deadline: Option<Duration>,
}

impl Debounce {
  pub fn new(delay: Duration) -> Self {
    Self {
      delay,
      deadline: None,
    }
  }

  pub fn delay(&self) -> Duration {
    self.delay
  }

  pub fn set_delay(&mut self, delay: Duration) {
    self.delay = delay;
  }

  /// (Re)arms the timer relative to `now`.
  pub fn schedule(&mut self, now: Duration) {
    self.deadline = Some(now + self.delay);
  }

  pub fn cancel(&mut self) {
    self.deadline = None;
  }

  pub fn is_pending(&self) -> bool {
    self.deadline.is_some()
  }

  /// Returns `true` once when the deadline has passed.
  pub fn poll(&mut self, now: Duration) -> bool {
    match self.deadline {
      Some(deadline) if now >= deadline => {
        self.deadline = None;
        true
      }
      _ => false,
    }
  }
}

/// Resize watcher: only width changes arm the debounce.
#[derive(Debug, Clone)]
pub struct ResizeDebounce {
  last_width: f32,
  timer: Debounce,
}

impl ResizeDebounce {
  pub fn new(initial_width: f32, delay: Duration) -> Self {
    Self {
      last_width: initial_width,
      timer: Debounce::new(delay),
    }
  }

  /// Feeds a resize notification. Height-only changes are ignored.
  pub fn on_resize(&mut self, width: f32, now: Duration) {
    if width != self.last_width {
      self.last_width = width;
      self.timer.schedule(now);
    }
  }

  pub fn poll(&mut self, now: Duration) -> bool {
    self.timer.poll(now)
  }

  pub fn is_pending(&self) -> bool {
    self.timer.is_pending()
  }

  pub fn cancel(&mut self) {
    self.timer.cancel();
  }

  pub fn delay(&self) -> Duration {
    self.timer.delay()
  }

  pub fn set_delay(&mut self, delay: Duration) {
    self.timer.set_delay(delay);
  }
}

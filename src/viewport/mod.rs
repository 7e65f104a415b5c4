//! Viewport projection.
//!
//! Converts the target element's box (top-left origin, y-down, logical
//! pixels) into a plane placement in world space (centered origin, y-up, one
//! world unit per logical pixel). Bounds are stored in document space so the
//! plane stays glued to the element while the page scrolls.

mod debounce;

use bevy::math::{Rect, Vec2};
pub use debounce::{DEFAULT_RESIZE_DEBOUNCE, Debounce, ResizeDebounce};

/// Element box in document space (scroll-independent).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementBounds {
  pub left: f32,
  pub top: f32,
  pub width: f32,
  pub height: f32,
}

impl ElementBounds {
  /// Converts a viewport-relative client rect captured at `scroll` into
  /// document space.
  pub fn from_client_rect(rect: Rect, scroll: f32) -> Self {
    Self {
      left: rect.min.x,
      top: rect.min.y + scroll,
      width: rect.width(),
      height: rect.height(),
    }
  }

  /// Viewport-relative rect at the given scroll offset.
  pub fn client_rect(&self, scroll: f32) -> Rect {
    let top = self.top - scroll;
    Rect::new(self.left, top, self.left + self.width, top + self.height)
  }

  pub fn size(&self) -> Vec2 {
    Vec2::new(self.width, self.height)
  }

  /// Maps a viewport cursor position to `[0,1]²` element coordinates.
  ///
  /// Returns `None` outside the element or when the box is degenerate.
  pub fn normalize(&self, cursor: Vec2, scroll: f32) -> Option<Vec2> {
    if self.width <= 0.0 || self.height <= 0.0 {
      return None;
    }
    let rect = self.client_rect(scroll);
    if !rect.contains(cursor) {
      return None;
    }
    Some(Vec2::new(
      (cursor.x - rect.min.x) / self.width,
      (cursor.y - rect.min.y) / self.height,
    ))
  }
}

/// Plane transform derived from bounds, viewport and scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
  pub translation: Vec2,
  pub scale: Vec2,
}

/// Keeps the element bounds and viewport size needed to place the plane.
#[derive(Debug, Clone, Default)]
pub struct ViewportProjector {
  bounds: Option<ElementBounds>,
  viewport: Vec2,
}

impl ViewportProjector {
  pub fn new(viewport: Vec2) -> Self {
    Self {
      bounds: None,
      viewport,
    }
  }

  /// Stores the element box reported by the layout at the given scroll.
  pub fn capture_bounds(&mut self, client_rect: Rect, scroll: f32) {
    self.bounds = Some(ElementBounds::from_client_rect(client_rect, scroll));
  }

  pub fn bounds(&self) -> Option<ElementBounds> {
    self.bounds
  }

  pub fn set_viewport(&mut self, viewport: Vec2) {
    self.viewport = viewport;
  }

  pub fn viewport(&self) -> Vec2 {
    self.viewport
  }

  /// Plane center in world space.
  ///
  /// `x = left - vw/2 + w/2`, `y = scroll - top + vh/2 - h/2`.
  pub fn compute_placement(&self, scroll: f32) -> Option<Vec2> {
    let b = self.bounds?;
    Some(Vec2::new(
      b.left - self.viewport.x / 2.0 + b.width / 2.0,
      scroll - b.top + self.viewport.y / 2.0 - b.height / 2.0,
    ))
  }

  /// Plane scale: the unit quad stretched to the element's pixel size.
  pub fn compute_scale(&self) -> Option<Vec2> {
    self.bounds.map(|b| b.size())
  }

  pub fn placement(&self, scroll: f32) -> Option<Placement> {
    Some(Placement {
      translation: self.compute_placement(scroll)?,
      scale: self.compute_scale()?,
    })
  }

  /// Normalized pointer position over the element, if inside.
  pub fn normalize(&self, cursor: Vec2, scroll: f32) -> Option<Vec2> {
    self.bounds?.normalize(cursor, scroll)
  }
}

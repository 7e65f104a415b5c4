//! Virtual page layout for the target image element.
//!
//! The page is a vertically scrolling document measured in logical window
//! pixels. The element's width and top are configured; its height follows the
//! image's intrinsic aspect ratio unless set explicitly, so the layout is only
//! final once the image has loaded. Without an explicit `left` the element is
//! centered, which makes its box depend on the viewport width.

use bevy::math::{Rect, UVec2};
use bevy::prelude::Resource;

use crate::config::TargetConfig;

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct TargetElement {
  pub left: Option<f32>,
  pub top: f32,
  pub width: f32,
  pub height: f32,
}

impl TargetElement {
  /// Lays out the element once the image's pixel size is known.
  pub fn from_config(config: &TargetConfig, intrinsic: UVec2) -> Self {
    let height = config.height.unwrap_or_else(|| {
      if intrinsic.x == 0 {
        config.width
      } else {
        config.width * intrinsic.y as f32 / intrinsic.x as f32
      }
    });
    Self {
      left: config.left,
      top: config.top,
      width: config.width,
      height,
    }
  }

  /// Bounding box relative to the viewport, like a client rect query.
  pub fn client_rect(&self, viewport_width: f32, scroll: f32) -> Rect {
    let left = self
      .left
      .unwrap_or((viewport_width - self.width) / 2.0);
    let top = self.top - scroll;
    Rect::new(left, top, left + self.width, top + self.height)
  }
}

/// Maximum scroll offset for a document of `page_height` in a viewport of
/// `viewport_height`.
pub fn scroll_limit(page_height: f32, viewport_height: f32) -> f32 {
  (page_height - viewport_height).max(0.0)
}

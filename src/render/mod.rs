//! Rendering of the distorted image plane.
//!
//! The plane is a subdivided unit quad scaled to the element's pixel size.
//! Its material samples the source image at `uv - strength * field(uv)`,
//! where the field is the displacement grid uploaded as a small float
//! texture every frame. The plane is drawn into an offscreen image at a
//! capped pixel ratio, which a sprite then stretches over the window.

mod material;
mod pipeline;
mod renderer;

use bevy::prelude::*;
use bevy::sprite_render::Material2dPlugin;
pub use material::{DistortionMaterial, DistortionUniforms};
pub use pipeline::{
  create_field_texture, create_plane_mesh, create_render_target, render_target_size, upload_field,
};
pub use renderer::{
  BLIT_LAYER, DistortionBlit, DistortionBlitCamera, DistortionCamera, DistortionPlane,
  DistortionRenderer, placement_transform, viewport_projection,
};

/// Registers the distortion material and embeds its shader.
///
/// Without a `RenderPlugin` (headless tests) only the material asset type is
/// registered.
pub struct DistortionRenderPlugin;

impl Plugin for DistortionRenderPlugin {
  fn build(&self, app: &mut App) {
    if !app.is_plugin_added::<bevy::render::RenderPlugin>() {
      app.init_asset::<DistortionMaterial>();
      return;
    }

    // Embed the distortion shader
    bevy::asset::embedded_asset!(app, "shaders/distortion.wgsl");

    app.add_plugins(Material2dPlugin::<DistortionMaterial>::default());
  }
}

//! Material2d sampling the source image through the displacement field.

use bevy::prelude::*;
use bevy::render::render_resource::{AsBindGroup, ShaderType};
use bevy::shader::ShaderRef;
use bevy::sprite_render::{AlphaMode2d, Material2d};

/// Uniform data for the distortion shader.
#[derive(Clone, Copy, Debug, ShaderType)]
pub struct DistortionUniforms {
  /// UV offset per field unit (0.5 gives the reference look).
  pub strength: f32,
  // WebGL2 needs uniform structs padded to 16-byte multiples. The vec3
  // aligns to offset 16, so the struct is 32 bytes.
  pub _padding: Vec3,
}

impl DistortionUniforms {
  pub fn new(strength: f32) -> Self {
    Self {
      strength,
      _padding: Vec3::ZERO,
    }
  }
}

/// Material for the distorted image plane.
#[derive(Asset, TypePath, AsBindGroup, Clone)]
pub struct DistortionMaterial {
  /// Source image, default (linear) sampling.
  #[texture(0)]
  #[sampler(1)]
  pub source: Handle<Image>,

  /// Displacement field (Rg32Float). Float32 textures are not filterable, so
  /// the field is bound with a non-filtering sampler; the image itself uses
  /// nearest sampling, which gives the intended blocky cells.
  #[texture(2, sample_type = "float", filterable = false)]
  #[sampler(3, sampler_type = "non_filtering")]
  pub field: Handle<Image>,

  #[uniform(4)]
  pub uniforms: DistortionUniforms,
}

impl Material2d for DistortionMaterial {
  fn fragment_shader() -> ShaderRef {
    "embedded://liquid_pixels/render/shaders/distortion.wgsl".into()
  }

  fn alpha_mode(&self) -> AlphaMode2d {
    AlphaMode2d::Blend
  }
}

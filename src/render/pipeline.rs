//! Field texture creation/upload and the subdivided plane mesh.

use bevy::asset::RenderAssetUsages;
use bevy::image::ImageSampler;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use bevy::render::render_resource::{
  Extent3d, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
};

use crate::field::DisplacementField;

/// Creates an `Rg32Float` texture sized to the field, with nearest sampling,
/// and uploads the field's current values.
pub fn create_field_texture(images: &mut Assets<Image>, field: &DisplacementField) -> Handle<Image> {
  let size = Extent3d {
    width: field.width(),
    height: field.height(),
    depth_or_array_layers: 1,
  };

  let mut image = Image::new_fill(
    size,
    TextureDimension::D2,
    &[0; 8],
    TextureFormat::Rg32Float,
    RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
  );

  // Coarse cells are meant to stay blocky
  image.sampler = ImageSampler::nearest();
  upload_field(field, &mut image);

  images.add(image)
}

/// Copies the field into an existing texture of matching size.
pub fn upload_field(field: &DisplacementField, image: &mut Image) {
  if let Some(ref mut data) = image.data {
    if data.len() == field.texel_len() {
      field.write_texels(data);
    } else {
      warn!(
        "Field texture size mismatch: {} bytes, field needs {}",
        data.len(),
        field.texel_len()
      );
    }
  }
}

/// Offscreen size for a logical viewport rendered at `scale` pixels per
/// logical pixel.
pub fn render_target_size(viewport: Vec2, scale: f32) -> UVec2 {
  (viewport * scale).ceil().as_uvec2().max(UVec2::ONE)
}

fn target_extent(size: UVec2) -> Extent3d {
  Extent3d {
    width: size.x,
    height: size.y,
    depth_or_array_layers: 1,
  }
}

/// Creates the image the distortion camera renders into.
pub fn create_render_target(images: &mut Assets<Image>, size: UVec2) -> Handle<Image> {
  let extent = target_extent(size);
  let mut image = Image {
    texture_descriptor: TextureDescriptor {
      label: Some("distortion_target"),
      size: extent,
      dimension: TextureDimension::D2,
      format: TextureFormat::Rgba8UnormSrgb,
      mip_level_count: 1,
      sample_count: 1,
      usage: TextureUsages::TEXTURE_BINDING
        | TextureUsages::COPY_DST
        | TextureUsages::RENDER_ATTACHMENT,
      view_formats: &[],
    },
    ..default()
  };
  image.resize(extent);

  images.add(image)
}

/// Resizes a render target; contents are cleared by the next frame.
pub fn resize_render_target(image: &mut Image, size: UVec2) {
  image.resize(target_extent(size));
}

/// Unit plane centered on the origin, `segments × segments` quads, y-up UVs
/// (UV (0,0) at the bottom-left corner).
pub fn create_plane_mesh(segments: u32) -> Mesh {
  let segments = segments.max(1);
  let stride = segments + 1;

  let mut positions = Vec::with_capacity((stride * stride) as usize);
  let mut normals = Vec::with_capacity((stride * stride) as usize);
  let mut uvs = Vec::with_capacity((stride * stride) as usize);
  for j in 0..stride {
    let v = j as f32 / segments as f32;
    for i in 0..stride {
      let u = i as f32 / segments as f32;
      positions.push([u - 0.5, v - 0.5, 0.0]);
      normals.push([0.0, 0.0, 1.0]);
      uvs.push([u, v]);
    }
  }

  let mut indices = Vec::with_capacity((segments * segments * 6) as usize);
  for j in 0..segments {
    for i in 0..segments {
      let bl = j * stride + i;
      let br = bl + 1;
      let tl = bl + stride;
      let tr = tl + 1;
      indices.extend_from_slice(&[bl, br, tr, bl, tr, tl]);
    }
  }

  Mesh::new(
    PrimitiveTopology::TriangleList,
    RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
  )
  .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
  .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
  .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
  .with_inserted_indices(Indices::U32(indices))
}

//! Plane, camera and GPU resources for the distorted image.

use bevy::camera::visibility::RenderLayers;
use bevy::camera::{RenderTarget, ScalingMode};
use bevy::prelude::*;

use super::material::{DistortionMaterial, DistortionUniforms};
use super::pipeline::{
  create_field_texture, create_plane_mesh, create_render_target, render_target_size,
  resize_render_target, upload_field,
};
use crate::field::DisplacementField;
use crate::viewport::Placement;

/// Marker for the distorted image plane.
#[derive(Component)]
pub struct DistortionPlane;

/// Marker for the camera rendering the plane into the offscreen target.
#[derive(Component)]
pub struct DistortionCamera;

/// Marker for the sprite showing the offscreen target in the window.
#[derive(Component)]
pub struct DistortionBlit;

/// Marker for the camera drawing the blit sprite to the window.
#[derive(Component)]
pub struct DistortionBlitCamera;

/// Layer reserved for the blit sprite and its camera.
pub const BLIT_LAYER: usize = 31;

/// Render-side state of the effect.
///
/// The plane is drawn at `target_size` (logical viewport times the capped
/// pixel ratio) and stretched over the window, so GPU cost is bounded
/// independently of the display's pixel ratio. Released by
/// [`DistortionRenderer::dispose`].
#[derive(Resource, Debug)]
pub struct DistortionRenderer {
  pub source: Handle<Image>,
  pub field_texture: Handle<Image>,
  pub render_target: Handle<Image>,
  pub mesh: Handle<Mesh>,
  pub material: Handle<DistortionMaterial>,
  pub plane: Entity,
  pub camera: Entity,
  pub blit: Entity,
  pub blit_camera: Entity,
  pub target_size: UVec2,
}

/// Orthographic projection mapping one world unit to one logical pixel.
pub fn viewport_projection(viewport: Vec2) -> Projection {
  Projection::Orthographic(OrthographicProjection {
    scaling_mode: ScalingMode::Fixed {
      width: viewport.x,
      height: viewport.y,
    },
    ..OrthographicProjection::default_2d()
  })
}

pub fn placement_transform(placement: Placement) -> Transform {
  Transform::from_translation(placement.translation.extend(0.0))
    .with_scale(placement.scale.extend(1.0))
}

impl DistortionRenderer {
  /// Builds the plane mesh, field texture and material, and spawns the
  /// camera and plane.
  #[allow(clippy::too_many_arguments)]
  pub fn initialize(
    commands: &mut Commands,
    images: &mut Assets<Image>,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<DistortionMaterial>,
    source: Handle<Image>,
    field: &DisplacementField,
    segments: u32,
    strength: f32,
    viewport: Vec2,
    render_scale: f32,
    placement: Placement,
  ) -> Self {
    let field_texture = create_field_texture(images, field);
    let target_size = render_target_size(viewport, render_scale);
    let render_target = create_render_target(images, target_size);
    let mesh = meshes.add(create_plane_mesh(segments));
    let material = materials.add(DistortionMaterial {
      source: source.clone(),
      field: field_texture.clone(),
      uniforms: DistortionUniforms::new(strength),
    });

    // Projection must be set in the same spawn to prevent Camera2d's
    // required component defaults from overriding it
    let camera = commands
      .spawn((
        Name::new("DistortionCamera"),
        DistortionCamera,
        Camera2d,
        Camera {
          order: -1,
          target: RenderTarget::Image(render_target.clone().into()),
          ..default()
        },
        viewport_projection(viewport),
      ))
      .id();

    // Default 2D projection keeps one world unit per logical window pixel
    let blit_camera = commands
      .spawn((
        Name::new("DistortionBlitCamera"),
        DistortionBlitCamera,
        Camera2d,
        Camera {
          order: 0,
          ..default()
        },
        RenderLayers::layer(BLIT_LAYER),
      ))
      .id();

    let blit = commands
      .spawn((
        Name::new("DistortionBlit"),
        DistortionBlit,
        Sprite {
          image: render_target.clone(),
          custom_size: Some(viewport),
          ..default()
        },
        RenderLayers::layer(BLIT_LAYER),
      ))
      .id();

    let plane = commands
      .spawn((
        Name::new("DistortionPlane"),
        DistortionPlane,
        Mesh2d(mesh.clone()),
        MeshMaterial2d(material.clone()),
        placement_transform(placement),
        Visibility::default(),
      ))
      .id();

    debug!(
      "Distortion plane: {}x{} field, {} segments, placement {:?}, target {}x{}",
      field.width(),
      field.height(),
      segments,
      placement,
      target_size.x,
      target_size.y
    );

    Self {
      source,
      field_texture,
      render_target,
      mesh,
      material,
      plane,
      camera,
      blit,
      blit_camera,
      target_size,
    }
  }

  /// Uploads the field, refreshes the material and applies a new placement
  /// if one is given.
  pub fn render_frame(
    &self,
    placement: Option<Placement>,
    field: &DisplacementField,
    strength: f32,
    images: &mut Assets<Image>,
    materials: &mut Assets<DistortionMaterial>,
    transforms: &mut Query<&mut Transform, With<DistortionPlane>>,
  ) {
    if let Some(image) = images.get_mut(&self.field_texture) {
      upload_field(field, image);
    }

    // Touch material to force bind group refresh (Bevy workaround)
    if let Some(material) = materials.get_mut(&self.material) {
      material.uniforms.strength = strength;
    }

    if let Some(placement) = placement {
      if let Ok(mut transform) = transforms.get_mut(self.plane) {
        *transform = placement_transform(placement);
      }
    }
  }

  /// Points the camera at a new viewport size.
  pub fn update_projection(
    &self,
    viewport: Vec2,
    cameras: &mut Query<&mut Projection, With<DistortionCamera>>,
  ) {
    if let Ok(mut projection) = cameras.get_mut(self.camera) {
      *projection = viewport_projection(viewport);
    }
  }

  /// Matches the offscreen target to the viewport at `render_scale` and
  /// stretches the blit over the viewport. Returns whether the target was
  /// resized.
  pub fn resize_target(
    &mut self,
    viewport: Vec2,
    render_scale: f32,
    images: &mut Assets<Image>,
    blits: &mut Query<&mut Sprite, With<DistortionBlit>>,
  ) -> bool {
    if let Ok(mut sprite) = blits.get_mut(self.blit) {
      if sprite.custom_size != Some(viewport) {
        sprite.custom_size = Some(viewport);
      }
    }

    let size = render_target_size(viewport, render_scale);
    if size == self.target_size {
      return false;
    }
    if let Some(image) = images.get_mut(&self.render_target) {
      resize_render_target(image, size);
    }
    self.target_size = size;
    true
  }

  /// Despawns the plane and cameras and drops the GPU assets. The source image
  /// is freed once the caller removes this resource and its handle drops.
  pub fn dispose(
    &self,
    commands: &mut Commands,
    images: &mut Assets<Image>,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<DistortionMaterial>,
  ) {
    for entity in [self.plane, self.camera, self.blit, self.blit_camera] {
      if let Ok(mut entity) = commands.get_entity(entity) {
        entity.despawn();
      }
    }
    materials.remove(&self.material);
    meshes.remove(&self.mesh);
    images.remove(&self.field_texture);
    images.remove(&self.render_target);
    debug!("Distortion renderer disposed");
  }
}

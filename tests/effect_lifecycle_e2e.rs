//! E2E tests for the effect lifecycle.
//!
//! Runs the full plugin headless: image ready → plane placed → pointer
//! injects → resize re-places → dispose releases. Rendering is skipped
//! without a RenderPlugin, so assets are registered manually.
//!
//! Run: cargo test --test effect_lifecycle_e2e

use std::time::Duration;

use bevy::asset::RenderAssetUsages;
use bevy::camera::ScalingMode;
use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use bevy::window::{CursorMoved, PrimaryWindow, WindowResized, WindowResolution};
use liquid_pixels::{
  ConfigError, ConfigLoaded, DisposeEffect, DistortionBlit, DistortionCamera, DistortionEffect,
  DistortionMaterial, DistortionPlane, DistortionRenderer, EffectConfig, EffectError, EffectFailure,
  EffectState, LiquidPixelsPlugin, SourceImage,
};

const CONFIG: &str = r#"
[window]
width = 1000
height = 800

[page]
height = 3000.0

[target]
image = "images/portrait.png"
left = 50.0
top = 100.0
width = 200.0
height = 300.0

[field]
size = 16
seed_range = [0.0, 0.0]
seed = 7

[scroll]
duration = 0.0
"#;

/// Headless app with a 1000x800 primary window. The source image is added
/// to `Assets` directly when `image` is set, bypassing the asset server.
fn create_test_app(config: EffectConfig, image: bool) -> (App, Entity) {
  let mut app = App::new();
  app.add_plugins(MinimalPlugins);
  app.add_plugins(bevy::asset::AssetPlugin::default());
  app.add_plugins(StatesPlugin);
  app.init_asset::<Image>();
  app.init_asset::<Mesh>();
  app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(16)));

  let window = app
    .world_mut()
    .spawn((
      Window {
        resolution: WindowResolution::new(1000, 800),
        ..default()
      },
      PrimaryWindow,
    ))
    .id();

  if image {
    let source = Image::new_fill(
      Extent3d {
        width: 200,
        height: 300,
        depth_or_array_layers: 1,
      },
      TextureDimension::D2,
      &[255, 255, 255, 255],
      TextureFormat::Rgba8UnormSrgb,
      RenderAssetUsages::default(),
    );
    let handle = app.world_mut().resource_mut::<Assets<Image>>().add(source);
    app.insert_resource(SourceImage {
      handle,
      path: "images/portrait.png".into(),
    });
  }

  app.insert_resource(ConfigLoaded::from(config));
  app.add_plugins(LiquidPixelsPlugin);
  (app, window)
}

fn state(app: &App) -> EffectState {
  *app.world().resource::<State<EffectState>>().get()
}

fn run_until(app: &mut App, target: EffectState, max_frames: usize) {
  for _ in 0..max_frames {
    app.update();
    if state(app) == target {
      return;
    }
  }
  panic!("Expected {:?} within {} frames, got {:?}", target, max_frames, state(app));
}

fn running_app() -> (App, Entity) {
  let config = EffectConfig::from_toml_str(CONFIG).expect("Test config should parse");
  let (mut app, window) = create_test_app(config, true);
  run_until(&mut app, EffectState::Running, 10);
  (app, window)
}

fn plane_transform(app: &mut App) -> Transform {
  *app
    .world_mut()
    .query_filtered::<&Transform, With<DistortionPlane>>()
    .single(app.world())
    .expect("Plane should exist")
}

fn camera_width(app: &mut App) -> f32 {
  let projection = app
    .world_mut()
    .query_filtered::<&Projection, With<DistortionCamera>>()
    .single(app.world())
    .expect("Camera should exist");
  match projection {
    Projection::Orthographic(OrthographicProjection {
      scaling_mode: ScalingMode::Fixed { width, .. },
      ..
    }) => *width,
    other => panic!("Expected fixed orthographic projection, got {:?}", other),
  }
}

fn cursor(app: &mut App, window: Entity, x: f32, y: f32) {
  app.world_mut().write_message(CursorMoved {
    window,
    position: Vec2::new(x, y),
    delta: None,
  });
  app.update();
}

#[test]
fn plane_is_placed_over_element() {
  let (mut app, _) = running_app();
  app.update();

  // Element box (50, 100, 200x300) in a 1000x800 viewport.
  let transform = plane_transform(&mut app);
  assert_eq!(transform.translation.truncate(), Vec2::new(-350.0, 150.0));
  assert_eq!(transform.scale.truncate(), Vec2::new(200.0, 300.0));
  assert_eq!(camera_width(&mut app), 1000.0);
}

#[test]
fn pointer_motion_displaces_cells_near_pointer() {
  let (mut app, window) = running_app();

  // Enter at the element center, then move right by 0.1 of its width.
  cursor(&mut app, window, 150.0, 250.0);
  {
    let effect = app.world().resource::<DistortionEffect>();
    assert_eq!(effect.pointer.velocity(), Vec2::ZERO, "Entering should not spike");
    assert_eq!(effect.field.max_magnitude(), 0.0);
  }

  cursor(&mut app, window, 170.0, 250.0);
  let effect = app.world().resource::<DistortionEffect>();

  // Pointer at (0.6, 0.5) maps to grid (9.6, 8.0); radius is 16 / 6.
  let near = effect.field.cell(10, 8);
  let expected = 0.1 * (16.0 / 6.0 / 0.4);
  assert!(
    (near.x - expected).abs() < 1e-4,
    "Cell (10, 8) should gain {}, got {}",
    expected,
    near.x
  );
  assert!(near.y.abs() < 1e-6, "Horizontal motion should not touch y");
  assert_eq!(effect.field.cell(0, 0), Vec2::ZERO);
  assert_eq!(effect.field.cell(15, 15), Vec2::ZERO);

  // The same frame's field is what the texture holds.
  let renderer = app.world().resource::<DistortionRenderer>();
  let images = app.world().resource::<Assets<Image>>();
  let texture = images.get(&renderer.field_texture).expect("Field texture should exist");
  let data = texture.data.as_ref().expect("Field texture should keep CPU data");
  let offset = (10 + 16 * 8) * 8;
  let uploaded = f32::from_ne_bytes([
    data[offset],
    data[offset + 1],
    data[offset + 2],
    data[offset + 3],
  ]);
  assert_eq!(uploaded, near.x);
}

#[test]
fn displacement_fades_after_pointer_stops() {
  let (mut app, window) = running_app();
  cursor(&mut app, window, 150.0, 250.0);
  cursor(&mut app, window, 170.0, 250.0);
  let peak = app.world().resource::<DistortionEffect>().field.max_magnitude();

  for _ in 0..120 {
    app.update();
  }
  let settled = app.world().resource::<DistortionEffect>().field.max_magnitude();
  assert!(peak > 0.0);
  assert!(settled < peak * 0.01, "Expected decay from {} but got {}", peak, settled);
}

#[test]
fn cursor_outside_element_is_ignored() {
  let (mut app, window) = running_app();
  cursor(&mut app, window, 10.0, 10.0);
  cursor(&mut app, window, 900.0, 700.0);

  let effect = app.world().resource::<DistortionEffect>();
  assert!(!effect.pointer.is_active());
  assert_eq!(effect.field.max_magnitude(), 0.0);
}

#[test]
fn scrolling_moves_plane_up() {
  let (mut app, _) = running_app();
  app
    .world_mut()
    .resource_mut::<DistortionEffect>()
    .scroll
    .scroll_to(100.0);
  app.update();

  let transform = plane_transform(&mut app);
  assert_eq!(transform.translation.truncate(), Vec2::new(-350.0, 250.0));
}

#[test]
fn resize_replaces_plane_after_debounce() {
  let (mut app, window) = running_app();

  app
    .world_mut()
    .get_mut::<Window>(window)
    .expect("Window should exist")
    .resolution
    .set(1200.0, 800.0);
  app.world_mut().write_message(WindowResized {
    window,
    width: 1200.0,
    height: 800.0,
  });

  // Not applied before the debounce delay has passed.
  app.update();
  assert_eq!(plane_transform(&mut app).translation.x, -350.0);

  for _ in 0..10 {
    app.update();
  }
  let transform = plane_transform(&mut app);
  assert_eq!(transform.translation.truncate(), Vec2::new(-450.0, 150.0));
  assert_eq!(camera_width(&mut app), 1200.0);
}

fn wheel(app: &mut App, window: Entity, unit: MouseScrollUnit, y: f32) {
  app.world_mut().write_message(MouseWheel {
    unit,
    x: 0.0,
    y,
    window,
  });
  app.update();
}

#[test]
fn wheel_moves_plane_only_on_whole_pixel_steps() {
  let (mut app, window) = running_app();
  app.update();

  // 0.4px rounds to the same pixel; the plane keeps its placement.
  wheel(&mut app, window, MouseScrollUnit::Pixel, -0.4);
  assert!((app.world().resource::<DistortionEffect>().scroll.value() - 0.4).abs() < 1e-6);
  assert_eq!(plane_transform(&mut app).translation.y, 150.0);

  // 0.8px rounds to 1; placement is rewritten from the exact offset.
  wheel(&mut app, window, MouseScrollUnit::Pixel, -0.4);
  let y = plane_transform(&mut app).translation.y;
  assert!((y - 150.8).abs() < 1e-4, "Expected 150.8, got {}", y);

  // One line down is 40px.
  wheel(&mut app, window, MouseScrollUnit::Line, -1.0);
  let y = plane_transform(&mut app).translation.y;
  assert!((y - 190.8).abs() < 1e-4, "Expected 190.8, got {}", y);
}

#[test]
fn wheel_scroll_is_clamped_to_page() {
  let (mut app, window) = running_app();
  wheel(&mut app, window, MouseScrollUnit::Pixel, 500.0);
  assert_eq!(app.world().resource::<DistortionEffect>().scroll.value(), 0.0);

  // Page 3000 in an 800px viewport scrolls at most 2200px.
  wheel(&mut app, window, MouseScrollUnit::Pixel, -5000.0);
  assert_eq!(app.world().resource::<DistortionEffect>().scroll.value(), 2200.0);
  assert_eq!(plane_transform(&mut app).translation.y, 2350.0);
}

#[test]
fn high_pixel_ratio_caps_render_target_not_layout() {
  let (mut app, window) = running_app();
  app.update();
  assert_eq!(
    app.world().resource::<DistortionRenderer>().target_size,
    UVec2::new(1000, 800)
  );

  {
    let mut window = app
      .world_mut()
      .get_mut::<Window>(window)
      .expect("Window should exist");
    window.resolution.set_physical_resolution(3000, 2400);
    window.resolution.set_scale_factor(3.0);
  }
  for _ in 0..5 {
    app.update();
  }

  let window = app.world().get::<Window>(window).expect("Window should exist");
  assert_eq!(window.resolution.scale_factor_override(), None);
  assert_eq!((window.width(), window.height()), (1000.0, 800.0));

  // Default cap is 2: 1000x800 logical renders at 2000x1600.
  let renderer = app.world().resource::<DistortionRenderer>();
  assert_eq!(renderer.target_size, UVec2::new(2000, 1600));
  let target = app
    .world()
    .resource::<Assets<Image>>()
    .get(&renderer.render_target)
    .expect("Render target should exist");
  assert_eq!(target.size(), UVec2::new(2000, 1600));

  let blit = app
    .world_mut()
    .query_filtered::<&Sprite, With<DistortionBlit>>()
    .single(app.world())
    .expect("Blit sprite should exist")
    .custom_size;
  assert_eq!(blit, Some(Vec2::new(1000.0, 800.0)));

  let transform = plane_transform(&mut app);
  assert_eq!(transform.translation.truncate(), Vec2::new(-350.0, 150.0));
  assert_eq!(transform.scale.truncate(), Vec2::new(200.0, 300.0));
  assert_eq!(camera_width(&mut app), 1000.0);
}

#[test]
fn config_reload_applies_tunables_and_layout() {
  let (mut app, _) = running_app();
  app.update();

  {
    let mut config = app.world_mut().resource_mut::<ConfigLoaded>();
    config.field.decay = 0.8;
    config.field.size = 32;
    config.render.strength = 0.25;
    config.scroll.duration = 0.5;
    config.page.height = 2000.0;
    config.viewport.resize_debounce_ms = 100;
    if let Some(target) = config.target.as_mut() {
      target.top = 200.0;
    }
  }
  app.update();

  let effect = app.world().resource::<DistortionEffect>();
  assert_eq!(effect.tuning.decay, 0.8);
  assert_eq!(effect.tuning.strength, 0.25);
  assert_eq!(effect.scroll.duration(), 0.5);
  assert_eq!(effect.scroll.limit(), 1200.0);
  assert_eq!(effect.resize.delay(), Duration::from_millis(100));
  assert_eq!(effect.field.width(), 16, "Field size is fixed after startup");

  // Element moved down 100px: y = 0 - 200 + 400 - 150.
  assert_eq!(plane_transform(&mut app).translation.truncate(), Vec2::new(-350.0, 50.0));
}

#[test]
fn missing_target_fails_with_config_error() {
  let (mut app, _) = create_test_app(EffectConfig::default(), false);
  run_until(&mut app, EffectState::Failed, 5);

  let failure = app
    .world()
    .get_resource::<EffectFailure>()
    .expect("Failure should be recorded");
  assert!(
    matches!(failure.0, EffectError::Config(ConfigError::MissingTarget)),
    "Unexpected failure: {}",
    failure.0
  );
  assert!(app.world().get_resource::<DistortionEffect>().is_none());
}

#[test]
fn unreadable_image_fails_with_asset_error() {
  let mut config = EffectConfig::from_toml_str(CONFIG).expect("Test config should parse");
  if let Some(target) = config.target.as_mut() {
    target.image = "images/does_not_exist.png".into();
  }
  let (mut app, _) = create_test_app(config, false);

  // Asset IO runs on the task pools; give it real time.
  for _ in 0..300 {
    app.update();
    if state(&app) != EffectState::Loading {
      break;
    }
    std::thread::sleep(Duration::from_millis(10));
  }

  assert_eq!(state(&app), EffectState::Failed);
  let failure = app.world().resource::<EffectFailure>();
  match &failure.0 {
    EffectError::AssetLoad(err) => assert_eq!(err.path, "images/does_not_exist.png"),
    other => panic!("Expected asset load failure, got {}", other),
  }
}

#[test]
fn dispose_releases_scene_and_assets() {
  let (mut app, _) = running_app();
  let material = app.world().resource::<DistortionRenderer>().material.clone();
  let target = app.world().resource::<DistortionRenderer>().render_target.clone();

  app.world_mut().write_message(DisposeEffect);
  run_until(&mut app, EffectState::Disposed, 3);
  app.update();

  let world = app.world_mut();
  assert_eq!(
    world.query_filtered::<(), With<DistortionPlane>>().iter(world).count(),
    0
  );
  assert_eq!(
    world.query_filtered::<(), With<DistortionCamera>>().iter(world).count(),
    0
  );
  assert_eq!(
    world.query_filtered::<(), With<DistortionBlit>>().iter(world).count(),
    0
  );
  assert!(world.get_resource::<DistortionRenderer>().is_none());
  assert!(world.get_resource::<DistortionEffect>().is_none());
  assert!(world.resource::<Assets<DistortionMaterial>>().get(&material).is_none());
  assert!(world.resource::<Assets<Image>>().get(&target).is_none());

  // Tick systems no longer run.
  app.update();
  assert_eq!(state(&app), EffectState::Disposed);
}

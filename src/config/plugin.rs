#[cfg(not(target_family = "wasm"))]
use bevy::{asset::AssetEvent, ecs::message::MessageReader};
use bevy::{prelude::*, window::PrimaryWindow};
#[cfg(not(target_family = "wasm"))]
use bevy_common_assets::toml::TomlAssetPlugin;

#[cfg(not(target_family = "wasm"))]
use super::{ConfigHandle, EffectConfig};
use super::ConfigLoaded;

/// Hot reload and window/background appliers for [`ConfigLoaded`].
///
/// The initial `ConfigLoaded` must be inserted by the caller; the binary
/// reads it from disk before building the window.
pub struct ConfigPlugin {
  /// Path inside the asset directory to watch, e.g.
  /// `config/effect.config.toml`. `None` disables hot reload.
  pub watch: Option<String>,
}

impl Plugin for ConfigPlugin {
  fn build(&self, app: &mut App) {
    // Native: asset-based config with hot-reload
    #[cfg(not(target_family = "wasm"))]
    if let Some(path) = self.watch.clone() {
      app
        .add_plugins(TomlAssetPlugin::<EffectConfig>::new(&["config.toml"]))
        .insert_resource(ConfigWatchPath(path))
        .add_systems(PreStartup, load_config_asset)
        .add_systems(Update, watch_config_changes);
    }

    app.add_systems(
      Update,
      (
        update_window_on_config_change,
        update_clear_color_on_config_change,
      ),
    );
  }
}

#[cfg(not(target_family = "wasm"))]
#[derive(Resource)]
struct ConfigWatchPath(String);

#[cfg(not(target_family = "wasm"))]
fn load_config_asset(
  mut commands: Commands,
  asset_server: Res<AssetServer>,
  path: Res<ConfigWatchPath>,
) {
  let handle: Handle<EffectConfig> = asset_server.load(path.0.clone());
  commands.insert_resource(ConfigHandle(handle));
}

#[cfg(not(target_family = "wasm"))]
fn watch_config_changes(
  mut commands: Commands,
  config_handle: Option<Res<ConfigHandle>>,
  mut messages: MessageReader<AssetEvent<EffectConfig>>,
  configs: Res<Assets<EffectConfig>>,
) {
  let Some(config_handle) = config_handle else {
    return;
  };
  for event in messages.read() {
    if let AssetEvent::Modified { id } = event {
      if config_handle.0.id() == *id {
        if let Some(config) = configs.get(&config_handle.0) {
          match config.validate() {
            Ok(()) => {
              info!("Config reloaded!");
              commands.insert_resource(ConfigLoaded::from(config.clone()));
            }
            Err(err) => warn!("Ignoring invalid config reload: {}", err),
          }
        }
      }
    }
  }
}

fn update_window_on_config_change(
  config: Res<ConfigLoaded>,
  mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
  if config.is_changed() && !config.is_added() {
    if let Ok(mut window) = windows.single_mut() {
      window
        .resolution
        .set(config.window.width as f32, config.window.height as f32);
      window.title.clone_from(&config.window.title);
    }
  }
}

fn update_clear_color_on_config_change(config: Res<ConfigLoaded>, mut commands: Commands) {
  if config.is_changed() {
    commands.insert_resource(ClearColor(config.background()));
  }
}

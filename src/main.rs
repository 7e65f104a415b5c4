use bevy::{prelude::*, window::WindowResolution};
#[cfg(not(target_family = "wasm"))]
use clap::Parser;
use liquid_pixels::{ConfigLoaded, ConfigPlugin, EffectConfig, LiquidPixelsPlugin};
#[cfg(not(target_family = "wasm"))]
use liquid_pixels::config::DEFAULT_CONFIG_PATH;

/// Liquid pixel distortion over a scrolling image.
#[cfg(not(target_family = "wasm"))]
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
  /// Config file. Hot-reloaded when it lives under `assets/`.
  #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
  config: String,

  /// Image path (relative to `assets/`), overriding `target.image`.
  #[arg(long)]
  image: Option<String>,

  /// Fixed seed for the initial field.
  #[arg(long)]
  seed: Option<u64>,
}

fn main() -> AppExit {
  // WASM: set up panic hook for better error messages
  #[cfg(target_family = "wasm")]
  console_error_panic_hook::set_once();

  #[cfg(not(target_family = "wasm"))]
  let (config, watch) = {
    let cli = Cli::parse();
    let mut config = match EffectConfig::load(&cli.config) {
      Ok(config) => config,
      Err(err) => {
        eprintln!("Failed to load {}: {}", cli.config, err);
        return AppExit::error();
      }
    };
    if let Some(image) = cli.image {
      match config.target.as_mut() {
        Some(target) => target.image = image,
        None => {
          eprintln!("--image needs a [target] section in {}", cli.config);
          return AppExit::error();
        }
      }
    }
    if cli.seed.is_some() {
      config.field.seed = cli.seed;
    }
    if let Err(err) = config.validate() {
      eprintln!("Invalid config {}: {}", cli.config, err);
      return AppExit::error();
    }
    let watch = cli
      .config
      .strip_prefix("assets/")
      .map(str::to_string);
    (config, watch)
  };

  // WASM: embed config at compile time (no filesystem access)
  #[cfg(target_family = "wasm")]
  let (config, watch) = {
    let source = include_str!("../assets/config/effect.config.toml");
    match EffectConfig::from_toml_str(source) {
      Ok(config) => (config, None),
      Err(err) => {
        error!("Invalid embedded config: {}", err);
        return AppExit::error();
      }
    }
  };

  let mut app = App::new();

  app.add_plugins(DefaultPlugins.set(WindowPlugin {
    primary_window: Some(Window {
      resolution: WindowResolution::new(config.window.width, config.window.height),
      title: config.window.title.clone(),
      // WASM: draw into the page's canvas and follow its size
      #[cfg(target_family = "wasm")]
      canvas: Some("#liquid-pixels".to_string()),
      #[cfg(target_family = "wasm")]
      fit_canvas_to_parent: true,
      ..default()
    }),
    ..default()
  }));

  app
    .insert_resource(ConfigLoaded::from(config))
    .add_plugins(ConfigPlugin { watch })
    .add_plugins(LiquidPixelsPlugin);

  #[cfg(feature = "visual_debug")]
  app.add_plugins(liquid_pixels::visual_debug::VisualDebugPlugin);

  app.run()
}

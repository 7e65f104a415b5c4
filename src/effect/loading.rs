use bevy::asset::LoadState;
use bevy::prelude::*;

use super::{EffectFailure, EffectState, SourceImage};
use crate::config::ConfigLoaded;
use crate::error::{AssetLoadError, EffectError};
use crate::page::TargetElement;

/// Where the source image stands this frame.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SourceStatus {
  Pending,
  Ready(UVec2),
  Failed(String),
}

impl SourceStatus {
  /// An image in `Assets` wins over the server's load state, so images added
  /// directly (not through the server) count as ready.
  pub(crate) fn classify(size: Option<UVec2>, state: &LoadState) -> Self {
    if let Some(size) = size {
      return Self::Ready(size);
    }
    match state {
      LoadState::Failed(err) => Self::Failed(err.to_string()),
      _ => Self::Pending,
    }
  }
}

/// Logs the error, records it and parks the effect in `Failed`.
pub(crate) fn fail(
  commands: &mut Commands,
  next_state: &mut NextState<EffectState>,
  error: EffectError,
) {
  error!("Liquid pixels failed to start: {}", error);
  commands.insert_resource(EffectFailure(error));
  next_state.set(EffectState::Failed);
}

pub(super) fn request_source_image(
  mut commands: Commands,
  config: Res<ConfigLoaded>,
  asset_server: Res<AssetServer>,
  existing: Option<Res<SourceImage>>,
  mut next_state: ResMut<NextState<EffectState>>,
) {
  if let Err(err) = config.validate() {
    fail(&mut commands, &mut next_state, err.into());
    return;
  }
  if existing.is_some() {
    return;
  }
  let target = match config.target() {
    Ok(target) => target,
    Err(err) => {
      fail(&mut commands, &mut next_state, err.into());
      return;
    }
  };

  info!("Loading target image {}", target.image);
  let handle: Handle<Image> = asset_server.load(target.image.clone());
  commands.insert_resource(SourceImage {
    handle,
    path: target.image.clone(),
  });
}

pub(super) fn poll_source_image(
  mut commands: Commands,
  config: Res<ConfigLoaded>,
  source: Option<Res<SourceImage>>,
  images: Res<Assets<Image>>,
  asset_server: Res<AssetServer>,
  mut next_state: ResMut<NextState<EffectState>>,
) {
  let Some(source) = source else {
    return;
  };

  let size = images.get(&source.handle).map(Image::size);
  let state = if size.is_some() {
    LoadState::Loaded
  } else {
    asset_server.load_state(&source.handle)
  };

  match SourceStatus::classify(size, &state) {
    SourceStatus::Pending => {}
    SourceStatus::Ready(size) => {
      let Ok(target) = config.target() else {
        return;
      };
      let element = TargetElement::from_config(target, size);
      debug!(
        "Image {} is {}x{}, element {:?}",
        source.path, size.x, size.y, element
      );
      commands.insert_resource(element);
      next_state.set(EffectState::Initialized);
    }
    SourceStatus::Failed(reason) => {
      let error = AssetLoadError {
        path: source.path.clone(),
        reason,
      };
      fail(&mut commands, &mut next_state, error.into());
    }
  }
}

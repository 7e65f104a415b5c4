use bevy::ecs::message::MessageReader;
use bevy::prelude::*;

use super::{DisposeEffect, DistortionEffect, EffectState, SourceImage};
use crate::page::TargetElement;
use crate::render::{DistortionMaterial, DistortionRenderer};

/// Releases everything the effect created on [`DisposeEffect`] or app exit.
/// Safe in any state; a second request is ignored.
#[allow(clippy::too_many_arguments)]
pub(super) fn dispose_on_request(
  mut commands: Commands,
  mut requests: MessageReader<DisposeEffect>,
  mut exits: MessageReader<AppExit>,
  state: Res<State<EffectState>>,
  mut next_state: ResMut<NextState<EffectState>>,
  renderer: Option<Res<DistortionRenderer>>,
  mut images: ResMut<Assets<Image>>,
  mut meshes: ResMut<Assets<Mesh>>,
  mut materials: ResMut<Assets<DistortionMaterial>>,
) {
  let requested = requests.read().count() > 0;
  let exiting = exits.read().count() > 0;
  if !(requested || exiting) || *state.get() == EffectState::Disposed {
    return;
  }

  if let Some(renderer) = renderer {
    renderer.dispose(&mut commands, &mut images, &mut meshes, &mut materials);
    commands.remove_resource::<DistortionRenderer>();
  }
  commands.remove_resource::<DistortionEffect>();
  commands.remove_resource::<TargetElement>();
  commands.remove_resource::<SourceImage>();
  next_state.set(EffectState::Disposed);

  info!("Liquid pixels disposed (from {:?})", state.get());
}

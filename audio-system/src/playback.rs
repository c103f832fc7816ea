use std::collections::HashMap;

use audio_backend::{AudioBackend, ChannelHandle, SoundHandle};
use glam::Vec3;

use crate::descriptor::{SoundDescriptor, SoundId};
use crate::error::{BackendFailure, BackendResultExt, PlayError, StopError};

/// A looping sound with a live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveLoop {
    pub channel: ChannelHandle,
    pub is_3d: bool,
}

/// What gets applied to a channel while it is still paused.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSetup {
    pub volume: f32,
    /// Position and velocity in backend units, for 3D sounds.
    pub attributes: Option<(Vec3, Vec3)>,
    pub reverb_wet: f32,
}

/// Tracks which looping sounds are audible.
///
/// One-shots are started and forgotten; only loops get an entry, and an entry
/// exists exactly while its channel is live.
#[derive(Debug, Default)]
pub struct PlaybackRegistry {
    loops: HashMap<SoundId, ActiveLoop>,
}

impl PlaybackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `sound` paused, configure it, then unpause.
    ///
    /// If any configuration step fails the channel is stopped so nothing is
    /// left half-configured and audible.
    pub fn play<B: AudioBackend>(
        &mut self,
        backend: &mut B,
        sound: SoundHandle,
        descriptor: &SoundDescriptor,
        setup: ChannelSetup,
    ) -> Result<ChannelHandle, PlayError> {
        let id = descriptor.id();
        if descriptor.is_loop() && self.loops.contains_key(id) {
            tracing::warn!(sound = id, "play: loop is already playing");
            return Err(PlayError::AlreadyPlaying(id.to_string()));
        }

        let channel = backend.play_sound(sound, true).during("play_sound")?;
        if let Err(err) = configure_and_unpause(backend, channel, setup) {
            if let Err(stop) = backend.stop_channel(channel) {
                tracing::warn!(sound = id, %channel, error = %stop, "could not stop misconfigured channel");
            }
            return Err(err.into());
        }

        if descriptor.is_loop() {
            self.loops
                .insert(id.to_string(), ActiveLoop { channel, is_3d: descriptor.is_3d() });
        }
        tracing::info!(sound = id, %channel, looping = descriptor.is_loop(), "start_playback");
        Ok(channel)
    }

    /// Stop a playing loop and forget it.
    ///
    /// A channel the backend already ended counts as stopped.
    pub fn stop<B: AudioBackend>(&mut self, backend: &mut B, id: &str) -> Result<(), StopError> {
        let Some(active) = self.loops.get(id).copied() else {
            tracing::warn!(sound = id, "stop: sound is not playing");
            return Err(StopError::NotPlaying(id.to_string()));
        };
        match backend.stop_channel(active.channel).during("stop_channel") {
            Ok(()) => {}
            Err(err) if err.is_invalid_handle() => {
                tracing::debug!(sound = id, channel = %active.channel, "channel had already ended");
            }
            Err(err) => return Err(err.into()),
        }
        self.loops.remove(id);
        tracing::info!(sound = id, channel = %active.channel, "stop_playback");
        Ok(())
    }

    pub fn is_playing(&self, id: &str) -> bool {
        self.loops.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<ActiveLoop> {
        self.loops.get(id).copied()
    }

    pub fn channel(&self, id: &str) -> Option<ChannelHandle> {
        self.loops.get(id).map(|l| l.channel)
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Drop entries whose channel the backend no longer plays. Returns the pruned ids.
    pub fn prune_ended<B: AudioBackend>(&mut self, backend: &B) -> Vec<SoundId> {
        let mut ended = Vec::new();
        self.loops.retain(|id, active| {
            let alive = match backend.is_channel_playing(active.channel) {
                Ok(playing) => playing,
                Err(err) if err.is_invalid_handle() => false,
                Err(err) => {
                    tracing::warn!(sound = %id, channel = %active.channel, error = %err, "channel query failed");
                    true
                }
            };
            if !alive {
                ended.push(id.clone());
            }
            alive
        });
        for id in &ended {
            tracing::debug!(sound = %id, "loop channel ended");
        }
        ended
    }

    /// Stop every loop. Entries are cleared even when the backend refuses;
    /// the first failure other than an already-ended channel is returned.
    pub fn stop_all<B: AudioBackend>(&mut self, backend: &mut B) -> Result<(), BackendFailure> {
        let mut first_err = None;
        for (id, active) in self.loops.drain() {
            match backend.stop_channel(active.channel).during("stop_channel") {
                Ok(()) => {}
                Err(err) if err.is_invalid_handle() => {}
                Err(err) => {
                    tracing::warn!(sound = %id, channel = %active.channel, error = %err, "stop failed during teardown");
                    first_err.get_or_insert(err);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

fn configure_and_unpause<B: AudioBackend>(
    backend: &mut B,
    channel: ChannelHandle,
    setup: ChannelSetup,
) -> Result<(), BackendFailure> {
    backend
        .set_channel_volume(channel, setup.volume)
        .during("set_channel_volume")?;
    if let Some((position, velocity)) = setup.attributes {
        backend
            .set_channel_3d_attributes(channel, position, velocity)
            .during("set_channel_3d_attributes")?;
    }
    if setup.reverb_wet > 0.0 {
        backend
            .set_channel_reverb_wet(channel, setup.reverb_wet)
            .during("set_channel_reverb_wet")?;
    }
    backend
        .set_channel_paused(channel, false)
        .during("set_channel_paused")
}

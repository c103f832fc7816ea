//! The caller-facing facade.
//!
//! `AudioEngine` owns the backend and every cache in front of it. Only one
//! engine may be live per process; constructing a second one fails until the
//! first is dropped.

use std::sync::atomic::{AtomicBool, Ordering};

use audio_backend::{
    AudioBackend, BankHandle, ChannelHandle, EventDescriptionInfo, ReverbHandle,
};
use glam::Vec3;

use crate::config::EngineConfig;
use crate::descriptor::SoundDescriptor;
use crate::error::{
    BackendFailure, BackendResultExt, EngineError, FadeError, LoadError, LookupError, PlayError,
    SpatialError, StopError,
};
use crate::events::{EventRegistry, DEFAULT_INSTANCE};
use crate::fade::{FadeOutcome, FadeScheduler};
use crate::mute::MuteController;
use crate::playback::{ChannelSetup, PlaybackRegistry};
use crate::resource_cache::{LoadOutcome, ResourceCache};
use crate::spacialiser::{ListenerPose, Spatialiser};

static ENGINE_LIVE: AtomicBool = AtomicBool::new(false);

pub struct AudioEngine<B: AudioBackend> {
    backend: B,
    config: EngineConfig,
    spatial: Spatialiser,
    fades: FadeScheduler,
    sounds: ResourceCache,
    playback: PlaybackRegistry,
    events: EventRegistry,
    mute: MuteController,
    reverb: Option<ReverbHandle>,
    initialized: bool,
}

impl<B: AudioBackend> AudioEngine<B> {
    /// Take ownership of `backend`. Nothing is sent to it until [`init`](Self::init).
    pub fn new(backend: B, config: EngineConfig) -> Result<Self, EngineError> {
        if ENGINE_LIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("refusing to construct a second audio engine");
            return Err(EngineError::AlreadyConstructed);
        }
        let spatial = Spatialiser::new(config.distance_factor, config.min_distance, config.max_distance);
        let fades = FadeScheduler::new(config.fade_floor_samples);
        Ok(Self {
            backend,
            config,
            spatial,
            fades,
            sounds: ResourceCache::new(),
            playback: PlaybackRegistry::new(),
            events: EventRegistry::new(),
            mute: MuteController::new(),
            reverb: None,
            initialized: false,
        })
    }

    /// Bring up the backend and rebuild all state from scratch.
    ///
    /// Calling this on a live engine tears it down first.
    pub fn init(&mut self) -> Result<(), EngineError> {
        if self.initialized {
            self.deactivate()?;
        }
        self.sounds = ResourceCache::new();
        self.playback = PlaybackRegistry::new();
        self.events = EventRegistry::new();
        self.mute = MuteController::new();
        self.spatial = Spatialiser::new(
            self.config.distance_factor,
            self.config.min_distance,
            self.config.max_distance,
        );

        let backend_config = self.config.backend_config();
        self.backend
            .initialize(&backend_config)
            .during("initialize")?;

        if let Err(err) = self.configure_scene() {
            if let Err(shutdown) = self.backend.shutdown() {
                tracing::warn!(error = %shutdown, "backend shutdown after failed init");
            }
            return Err(err.into());
        }

        self.initialized = true;
        tracing::info!(
            max_channels = backend_config.max_channels,
            sample_rate = backend_config.sample_rate,
            distance_factor = backend_config.distance_factor,
            "audio engine initialized"
        );
        Ok(())
    }

    fn configure_scene(&mut self) -> Result<(), BackendFailure> {
        self.spatial
            .set_listener_pose(&mut self.backend, self.config.listener)?;
        if let Some(zone) = &self.config.reverb {
            let df = self.spatial.distance_factor();
            let reverb = self
                .backend
                .create_reverb_zone(zone.position * df, zone.min_distance * df, zone.max_distance * df, zone.preset)
                .during("create_reverb_zone")?;
            tracing::debug!(%reverb, preset = ?zone.preset, "reverb zone created");
            self.reverb = Some(reverb);
        }
        Ok(())
    }

    /// Stop everything, release every backend resource and shut the backend down.
    ///
    /// Teardown continues past individual failures; the first one is returned.
    pub fn deactivate(&mut self) -> Result<(), EngineError> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;
        let mut first_err = self.playback.stop_all(&mut self.backend).err();
        if let Err(err) = self.events.release_all(&mut self.backend) {
            first_err.get_or_insert(err);
        }
        if let Err(err) = self.sounds.release_all(&mut self.backend) {
            first_err.get_or_insert(err);
        }
        if let Some(reverb) = self.reverb.take() {
            if let Err(err) = self
                .backend
                .release_reverb_zone(reverb)
                .during("release_reverb_zone")
            {
                first_err.get_or_insert(err);
            }
        }
        if let Err(err) = self.backend.shutdown().during("shutdown") {
            first_err.get_or_insert(err);
        }
        tracing::info!("audio engine deactivated");
        first_err.map_or(Ok(()), |err| Err(err.into()))
    }

    /// Pump the backend once and forget loops whose channel has ended.
    ///
    /// Fades and 3D changes become audible here.
    pub fn update(&mut self) -> Result<(), EngineError> {
        if !self.initialized {
            return Err(EngineError::NotInitialized);
        }
        self.backend.update().during("update")?;
        self.playback.prune_ended(&self.backend);
        Ok(())
    }

    pub fn load_sound(&mut self, descriptor: &mut SoundDescriptor) -> Result<LoadOutcome, LoadError> {
        let bounds = self.spatial.min_max_distance();
        self.sounds.load(&mut self.backend, descriptor, bounds)
    }

    /// Start a loaded sound. Loops are tracked until stopped; one-shots are not.
    pub fn play_sound(&mut self, descriptor: &SoundDescriptor) -> Result<ChannelHandle, PlayError> {
        let handle = match self.sounds.handle(descriptor.id()) {
            Some(handle) if descriptor.is_loaded() => handle,
            _ => {
                tracing::warn!(sound = descriptor.id(), "play: sound is not loaded");
                return Err(PlayError::NotLoaded(descriptor.id().to_string()));
            }
        };
        let setup = ChannelSetup {
            volume: descriptor.volume(),
            attributes: descriptor
                .is_3d()
                .then(|| self.spatial.source_attributes(descriptor.position())),
            reverb_wet: descriptor.reverb_amount(),
        };
        self.playback
            .play(&mut self.backend, handle, descriptor, setup)
    }

    pub fn stop_sound(&mut self, id: &str) -> Result<(), StopError> {
        self.playback.stop(&mut self.backend, id)
    }

    pub fn sound_is_playing(&self, id: &str) -> bool {
        self.playback.is_playing(id)
    }

    /// Ramp a playing loop to `new_volume` over `fade_samples` samples.
    ///
    /// On success the descriptor remembers `new_volume` as the source level of
    /// the next fade.
    pub fn update_loop_volume(
        &mut self,
        descriptor: &mut SoundDescriptor,
        new_volume: f32,
        fade_samples: u64,
    ) -> Result<FadeOutcome, FadeError> {
        let Some(channel) = self.playback.channel(descriptor.id()) else {
            tracing::warn!(sound = descriptor.id(), "fade: sound is not playing");
            return Err(FadeError::NotPlaying(descriptor.id().to_string()));
        };
        let outcome = self.fades.ramp(
            &mut self.backend,
            channel,
            descriptor.volume(),
            new_volume,
            fade_samples,
        )?;
        descriptor.set_volume(new_volume);
        Ok(outcome)
    }

    /// Push the descriptor's current position to its playing channel.
    pub fn update_3d_position(&mut self, descriptor: &SoundDescriptor) -> Result<(), SpatialError> {
        let id = descriptor.id();
        let Some(active) = self.playback.get(id) else {
            tracing::warn!(sound = id, "3D update: sound is not playing");
            return Err(SpatialError::NotPlaying(id.to_string()));
        };
        if !active.is_3d {
            tracing::warn!(sound = id, "3D update: sound is not positional");
            return Err(SpatialError::NotPositional(id.to_string()));
        }
        self.spatial
            .push_source(&mut self.backend, active.channel, descriptor.position())?;
        tracing::trace!(sound = id, position = ?descriptor.position(), "source moved");
        Ok(())
    }

    pub fn set_listener_pose(&mut self, position: Vec3, forward: Vec3, up: Vec3) -> Result<(), SpatialError> {
        self.spatial
            .set_listener_pose(&mut self.backend, ListenerPose { position, forward, up })?;
        Ok(())
    }

    /// Last listener pose sent to the backend, position in backend units.
    pub fn listener_pose(&self) -> ListenerPose {
        self.spatial.listener_pose()
    }

    /// Length of a loaded sound in milliseconds, 0 when unknown.
    pub fn length_ms(&self, id: &str) -> u32 {
        self.sounds.length_ms(id)
    }

    pub fn load_bank(&mut self, path: &str) -> Result<BankHandle, LoadError> {
        self.events.load_bank(&mut self.backend, path)
    }

    /// Create a new instance of `name` and return its index.
    pub fn load_event(&mut self, name: &str, params: &[(&str, f32)]) -> Result<usize, LoadError> {
        self.events.load_event(&mut self.backend, name, params)
    }

    pub fn set_event_param(&mut self, name: &str, param: &str, value: f32) -> Result<(), LookupError> {
        self.set_event_instance_param(name, DEFAULT_INSTANCE, param, value)
    }

    pub fn set_event_instance_param(
        &mut self,
        name: &str,
        index: usize,
        param: &str,
        value: f32,
    ) -> Result<(), LookupError> {
        self.events
            .set_param(&mut self.backend, name, index, param, value)
    }

    pub fn play_event(&mut self, name: &str) -> Result<(), LookupError> {
        self.play_event_instance(name, DEFAULT_INSTANCE)
    }

    pub fn play_event_instance(&mut self, name: &str, index: usize) -> Result<(), LookupError> {
        self.events.play(&mut self.backend, name, index)
    }

    pub fn stop_event(&mut self, name: &str) -> Result<(), LookupError> {
        self.stop_event_instance(name, DEFAULT_INSTANCE)
    }

    pub fn stop_event_instance(&mut self, name: &str, index: usize) -> Result<(), LookupError> {
        self.events.stop(&mut self.backend, name, index)
    }

    pub fn event_is_playing(&self, name: &str) -> bool {
        self.event_instance_is_playing(name, DEFAULT_INSTANCE)
    }

    pub fn event_instance_is_playing(&self, name: &str, index: usize) -> bool {
        self.events.is_playing(&self.backend, name, index)
    }

    pub fn set_event_volume(&mut self, name: &str, volume: f32) -> Result<(), LookupError> {
        self.set_event_instance_volume(name, DEFAULT_INSTANCE, volume)
    }

    pub fn set_event_instance_volume(&mut self, name: &str, index: usize, volume: f32) -> Result<(), LookupError> {
        self.events
            .set_volume(&mut self.backend, name, index, volume)
    }

    pub fn event_info(&self, name: &str) -> Result<EventDescriptionInfo, LookupError> {
        self.events.info(&self.backend, name)
    }

    pub fn event_instance_count(&self, name: &str) -> usize {
        self.events.instance_count(name)
    }

    pub fn mute(&mut self) -> Result<(), EngineError> {
        Ok(self.mute.mute(&mut self.backend)?)
    }

    pub fn unmute(&mut self) -> Result<(), EngineError> {
        Ok(self.mute.unmute(&mut self.backend)?)
    }

    pub fn is_muted(&self) -> bool {
        self.mute.is_muted()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn loaded_sound_count(&self) -> usize {
        self.sounds.len()
    }

    pub fn playing_loop_count(&self) -> usize {
        self.playback.len()
    }

    pub fn bank_count(&self) -> usize {
        self.events.bank_count()
    }

    pub fn event_count(&self) -> usize {
        self.events.event_count()
    }
}

impl<B: AudioBackend> Drop for AudioEngine<B> {
    fn drop(&mut self) {
        if let Err(err) = self.deactivate() {
            tracing::error!(error = %err, "audio engine teardown failed");
        }
        ENGINE_LIVE.store(false, Ordering::Release);
    }
}

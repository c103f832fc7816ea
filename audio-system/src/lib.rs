//! Playback front end over an opaque [`AudioBackend`](audio_backend::AudioBackend).
//!
//! This crate keeps the books: which sounds are resident, which loops are
//! audible, which event instances exist, where the listener stands. Mixing,
//! decoding and spatial math stay in the backend, which only advances when
//! [`AudioEngine::update`] is called.

pub mod config;
pub mod descriptor;
pub mod engine;
mod error;
pub mod events;
pub mod fade;
pub mod mute;
pub mod playback;
pub mod resource_cache;
mod spacialiser;

pub use config::{EngineConfig, ReverbZoneConfig};
pub use descriptor::{SoundDescriptor, SoundId};
pub use engine::AudioEngine;
pub use error::{
    BackendFailure, ConfigError, EngineError, FadeError, LoadError, LookupError, PlayError,
    SpatialError, StopError,
};
pub use events::{EventBinding, EventRegistry, DEFAULT_EVENT_VOLUME, DEFAULT_INSTANCE};
pub use fade::{ms_to_samples, FadeJob, FadeOutcome, FadeScheduler, AUDIO_SAMPLE_RATE};
pub use mute::MuteController;
pub use playback::{ActiveLoop, ChannelSetup, PlaybackRegistry};
pub use resource_cache::{CachedSound, LoadOutcome, ResourceCache};
pub use spacialiser::{ListenerPose, Spatialiser};

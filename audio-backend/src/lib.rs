//! Capability surface of the native audio backend.
//!
//! The playback front end never talks to a mixer directly. Everything it needs
//! (sound creation, channel control, fade points, the DSP clock, listener
//! attributes and bank-driven events) goes through the [`AudioBackend`] trait,
//! so the native engine stays an opaque collaborator.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// The mock backend implementation lives in `src/mock_backend.rs`.
#[cfg(feature = "mock-audio")]
pub mod mock_backend;

#[cfg(feature = "mock-audio")]
pub use mock_backend::{BackendCall, MockAudioBackend, MockChannel, MockEventInstance};

/// A specialized error type for audio backend failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("backend is not initialized")]
    NotInitialized,
    #[error("invalid handle: {0}")]
    InvalidHandle(String),
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("event not found: {0}")]
    EventNotFound(String),
    #[error("parameter not found: {0}")]
    ParameterNotFound(String),
    #[error("native call failed with code {code}: {message}")]
    Native { code: i32, message: String },
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    /// True when the handle the call referred to has expired (e.g. a channel
    /// that finished playing and was reclaimed by the backend).
    pub fn is_invalid_handle(&self) -> bool {
        matches!(self, BackendError::InvalidHandle(_))
    }
}

macro_rules! backend_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

backend_handle!(
    /// A sound resource created from a file.
    SoundHandle
);
backend_handle!(
    /// One currently-playing stream of a sound.
    ChannelHandle
);
backend_handle!(
    /// A loaded bank file.
    BankHandle
);
backend_handle!(
    /// A bank-defined event template.
    EventDescriptionHandle
);
backend_handle!(
    /// A playable instantiation of an event description.
    EventInstanceHandle
);
backend_handle!(
    /// A positional reverb zone.
    ReverbHandle
);

/// Mode flags used when creating a sound resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SoundMode {
    pub looping: bool,
    pub positional: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpeakerMode {
    Mono,
    #[default]
    Stereo,
    Quad,
    Surround51,
    Surround71,
}

/// Environmental reverb presets understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReverbPreset {
    Off,
    #[default]
    Generic,
    Room,
    Hallway,
    Cave,
    Arena,
    Underwater,
}

/// Stop policy for event instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMode {
    /// Let the event run its authored release/fade-out over subsequent updates.
    AllowFadeOut,
    Immediate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPlaybackState {
    Starting,
    Playing,
    Sustaining,
    Stopping,
    Stopped,
}

impl EventPlaybackState {
    /// Whether the instance is audible or about to be.
    pub fn is_active(self) -> bool {
        !matches!(self, EventPlaybackState::Stopped)
    }
}

/// Summary of an event description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDescriptionInfo {
    pub parameter_count: usize,
    pub is_3d: bool,
    pub is_oneshot: bool,
    pub is_valid: bool,
}

/// Settings applied when the backend system is initialized.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub max_channels: u32,
    pub sample_rate: u32,
    pub speaker_mode: SpeakerMode,
    pub doppler_scale: f32,
    pub distance_factor: f32,
    pub rolloff_scale: f32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            max_channels: 1024,
            sample_rate: 44_100,
            speaker_mode: SpeakerMode::Stereo,
            doppler_scale: 1.0,
            distance_factor: 1.0,
            rolloff_scale: 1.0,
        }
    }
}

/// The core trait defining the audio backend's contract.
///
/// Handles returned by the backend stay owned by it; callers only hold the
/// opaque ids. Any call made with a handle the backend has already reclaimed
/// returns [`BackendError::InvalidHandle`].
pub trait AudioBackend {
    fn initialize(&mut self, config: &BackendConfig) -> Result<(), BackendError>;
    fn shutdown(&mut self) -> Result<(), BackendError>;
    fn is_initialized(&self) -> bool;
    /// Advance the mixer: fade envelopes progress and finished channels are reclaimed.
    fn update(&mut self) -> Result<(), BackendError>;
    fn set_master_mute(&mut self, muted: bool) -> Result<(), BackendError>;

    fn create_sound(&mut self, path: &str, mode: SoundMode) -> Result<SoundHandle, BackendError>;
    fn set_sound_min_max_distance(&mut self, sound: SoundHandle, min: f32, max: f32) -> Result<(), BackendError>;
    fn sound_length_ms(&self, sound: SoundHandle) -> Result<u32, BackendError>;
    fn release_sound(&mut self, sound: SoundHandle) -> Result<(), BackendError>;

    fn play_sound(&mut self, sound: SoundHandle, paused: bool) -> Result<ChannelHandle, BackendError>;
    fn set_channel_paused(&mut self, channel: ChannelHandle, paused: bool) -> Result<(), BackendError>;
    fn set_channel_volume(&mut self, channel: ChannelHandle, volume: f32) -> Result<(), BackendError>;
    fn set_channel_3d_attributes(&mut self, channel: ChannelHandle, position: Vec3, velocity: Vec3) -> Result<(), BackendError>;
    fn set_channel_reverb_wet(&mut self, channel: ChannelHandle, wet: f32) -> Result<(), BackendError>;
    /// Monotonic sample clock of the channel's parent mix.
    fn channel_dsp_clock(&self, channel: ChannelHandle) -> Result<u64, BackendError>;
    fn add_fade_point(&mut self, channel: ChannelHandle, clock: u64, volume: f32) -> Result<(), BackendError>;
    fn stop_channel(&mut self, channel: ChannelHandle) -> Result<(), BackendError>;
    fn is_channel_playing(&self, channel: ChannelHandle) -> Result<bool, BackendError>;

    fn set_listener_attributes(
        &mut self,
        listener: usize,
        position: Vec3,
        velocity: Vec3,
        forward: Vec3,
        up: Vec3,
    ) -> Result<(), BackendError>;
    fn create_reverb_zone(
        &mut self,
        position: Vec3,
        min_distance: f32,
        max_distance: f32,
        preset: ReverbPreset,
    ) -> Result<ReverbHandle, BackendError>;
    fn release_reverb_zone(&mut self, reverb: ReverbHandle) -> Result<(), BackendError>;

    fn load_bank(&mut self, path: &str) -> Result<BankHandle, BackendError>;
    fn unload_bank(&mut self, bank: BankHandle) -> Result<(), BackendError>;
    fn event_description(&self, name: &str) -> Result<EventDescriptionHandle, BackendError>;
    fn event_description_info(&self, description: EventDescriptionHandle) -> Result<EventDescriptionInfo, BackendError>;
    fn create_event_instance(&mut self, description: EventDescriptionHandle) -> Result<EventInstanceHandle, BackendError>;
    fn release_event_instance(&mut self, instance: EventInstanceHandle) -> Result<(), BackendError>;
    fn set_event_parameter(&mut self, instance: EventInstanceHandle, name: &str, value: f32) -> Result<(), BackendError>;
    fn set_event_volume(&mut self, instance: EventInstanceHandle, volume: f32) -> Result<(), BackendError>;
    fn start_event(&mut self, instance: EventInstanceHandle) -> Result<(), BackendError>;
    fn stop_event(&mut self, instance: EventInstanceHandle, mode: StopMode) -> Result<(), BackendError>;
    fn event_playback_state(&self, instance: EventInstanceHandle) -> Result<EventPlaybackState, BackendError>;
}

/// Runtime helper to determine if the `mock-audio` feature was enabled at
/// compile time for this crate. Call from dependent crates/tests to confirm
/// which backend variant was compiled.
pub fn is_mock_backend_enabled() -> bool {
    cfg!(feature = "mock-audio")
}

//! Shared fixtures for the cross-crate scenario tests.

use audio_backend::{BackendCall, ChannelHandle, MockAudioBackend};
use audio_system::{AudioEngine, EngineConfig};

pub const MASTER_BANK: &str = "Master.bank";

/// A mock backend with the scene's bank catalog and asset lengths.
pub fn scene_backend() -> MockAudioBackend {
    MockAudioBackend::new()
        .with_bank(MASTER_BANK, &["Explosion", "Footsteps", "Ambience/Wind"])
        .with_sound_length("explosion.wav", 1_800)
        .with_sound_length("ambient.ogg", 45_000)
        .fail_on_path("corrupt.wav")
}

/// A live engine over [`scene_backend`]. Callers must hold the serial lock.
pub fn engine_with(config: EngineConfig) -> AudioEngine<MockAudioBackend> {
    let mut engine = AudioEngine::new(scene_backend(), config).expect("construct engine");
    engine.init().expect("init engine");
    engine
}

pub fn engine() -> AudioEngine<MockAudioBackend> {
    engine_with(EngineConfig::default())
}

/// Fade points issued to `channel`, in call order.
pub fn fade_points(calls: &[BackendCall], channel: ChannelHandle) -> Vec<(u64, f32)> {
    calls
        .iter()
        .filter_map(|c| match c {
            BackendCall::AddFadePoint { channel: ch, clock, volume } if *ch == channel => {
                Some((*clock, *volume))
            }
            _ => None,
        })
        .collect()
}

pub fn count_calls(calls: &[BackendCall], pred: impl Fn(&BackendCall) -> bool) -> usize {
    calls.iter().filter(|&c| pred(c)).count()
}

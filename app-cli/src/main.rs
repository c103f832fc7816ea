use std::path::PathBuf;

use anyhow::{Context, Result};
use audio_backend::{BackendCall, MockAudioBackend};
use audio_system::{ms_to_samples, AudioEngine, EngineConfig, SoundDescriptor, DEFAULT_EVENT_VOLUME};
use clap::Parser;
use glam::Vec3;
use tracing_subscriber::EnvFilter;

/// Drive a scripted scene through the playback front end against the
/// journaling backend and report what the backend was asked to do.
#[derive(Parser)]
struct Args {
    /// RON engine config; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Frames to simulate
    #[arg(long, default_value_t = 120)]
    frames: u32,
    /// Length of the ambience fade-out in milliseconds
    #[arg(long, default_value_t = 500)]
    fade_ms: u32,
    /// Also print every backend call in order
    #[arg(long)]
    trace_calls: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading engine config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let sample_rate = config.sample_rate;

    let backend = MockAudioBackend::new()
        .with_bank("Master.bank", &["Explosion", "Ambience/Wind"])
        .with_sound_length("ambient.ogg", 60_000)
        .with_sound_length("explosion.wav", 1_800);
    let mut engine = AudioEngine::new(backend, config).context("constructing audio engine")?;
    engine.init().context("initializing audio engine")?;

    let mut ambient = SoundDescriptor::new("ambient.ogg")
        .looping(true)
        .spatial(true)
        .with_volume(0.8)
        .with_reverb(0.2)
        .with_position(Vec3::new(0.0, 0.0, 5.0));
    let mut explosion = SoundDescriptor::new("explosion.wav")
        .spatial(true)
        .with_position(Vec3::new(3.0, 0.0, 3.0));
    engine.load_sound(&mut ambient).context("loading ambience")?;
    engine.load_sound(&mut explosion).context("loading explosion")?;
    engine.load_bank("Master.bank").context("loading bank")?;
    engine
        .load_event("Ambience/Wind", &[("Strength", 0.3)])
        .context("loading wind event")?;
    engine
        .set_event_volume("Ambience/Wind", DEFAULT_EVENT_VOLUME)
        .context("setting wind volume")?;

    engine.play_sound(&ambient).context("playing ambience")?;
    engine.play_event("Ambience/Wind").context("playing wind")?;

    let fade_at = args.frames * 2 / 3;
    for frame in 0..args.frames {
        // listener walks a slow circle around the origin
        let angle = frame as f32 * 0.05;
        let position = Vec3::new(angle.cos() * 2.0, 0.0, angle.sin() * 2.0);
        engine
            .set_listener_pose(position, (-position).normalize_or_zero(), Vec3::Y)
            .context("moving listener")?;

        if frame == args.frames / 3 {
            engine.play_sound(&explosion).context("playing explosion")?;
            tracing::info!(frame, "explosion fired");
            engine
                .set_event_param("Ambience/Wind", "Strength", 0.9)
                .context("gusting wind")?;
        }
        if frame == fade_at && engine.sound_is_playing(ambient.id()) {
            let outcome = engine
                .update_loop_volume(&mut ambient, 0.0, ms_to_samples(args.fade_ms, sample_rate))
                .context("fading ambience")?;
            tracing::info!(frame, fade_ms = args.fade_ms, ?outcome, "ambience fade issued");
        }
        if engine.sound_is_playing(ambient.id()) {
            ambient.set_3d_coords(0.0, 0.0, 5.0 - frame as f32 * 0.02);
            engine.update_3d_position(&ambient).context("moving ambience")?;
        }

        engine.update().context("pumping backend")?;
    }

    if engine.sound_is_playing(ambient.id()) {
        engine.stop_sound(ambient.id()).context("stopping ambience")?;
    }
    engine.stop_event("Ambience/Wind").context("stopping wind")?;
    engine.update().context("pumping backend")?;

    report(engine.backend(), args.trace_calls);
    tracing::info!(
        sounds = engine.loaded_sound_count(),
        banks = engine.bank_count(),
        events = engine.event_count(),
        ambience_ms = engine.length_ms(ambient.id()),
        "scene finished"
    );
    engine.deactivate().context("shutting down audio engine")?;
    Ok(())
}

fn report(backend: &MockAudioBackend, trace_calls: bool) {
    let calls = backend.calls();
    if trace_calls {
        for call in calls {
            println!("{call:?}");
        }
    }
    let count = |pred: fn(&BackendCall) -> bool| calls.iter().filter(|&c| pred(c)).count();
    println!("backend calls: {}", calls.len());
    println!("  updates:          {}", count(|c| matches!(c, BackendCall::Update)));
    println!("  channels started: {}", count(|c| matches!(c, BackendCall::PlaySound { .. })));
    println!("  fade points:      {}", count(|c| matches!(c, BackendCall::AddFadePoint { .. })));
    println!(
        "  listener moves:   {}",
        count(|c| matches!(c, BackendCall::SetListenerAttributes { .. }))
    );
    println!(
        "  source moves:     {}",
        count(|c| matches!(c, BackendCall::SetChannel3dAttributes { .. }))
    );
    println!("  dsp clock:        {}", backend.clock());
}

use audio_backend::{AudioBackend, MockAudioBackend};
use audio_system::{AudioEngine, EngineConfig, EngineError, SoundDescriptor};
use glam::Vec3;
use integration_tests::{engine, engine_with, scene_backend, MASTER_BANK};
use serial_test::serial;

#[test]
#[serial]
fn only_one_engine_may_be_live() {
    let first = engine();
    assert!(matches!(
        AudioEngine::new(MockAudioBackend::new(), EngineConfig::default()),
        Err(EngineError::AlreadyConstructed)
    ));
    drop(first);
    let again = AudioEngine::new(scene_backend(), EngineConfig::default());
    assert!(again.is_ok());
}

#[test]
#[serial]
fn listener_pose_reads_back_scaled() {
    let mut engine = engine_with(EngineConfig { distance_factor: 3.28, ..Default::default() });
    let position = Vec3::new(2.0, 1.0, -4.0);
    let forward = Vec3::new(1.0, 0.0, 0.0);
    let up = Vec3::Y;
    engine.set_listener_pose(position, forward, up).expect("listener");

    let pose = engine.listener_pose();
    assert_eq!(pose.position, position * 3.28);
    assert_eq!(pose.forward, forward);
    assert_eq!(pose.up, up);
    assert_eq!(engine.backend().listener(), Some((position * 3.28, forward, up)));
}

#[test]
#[serial]
fn ended_loop_channels_are_pruned_on_update() {
    let mut engine = engine();
    let mut ambient = SoundDescriptor::new("ambient.ogg").looping(true);
    engine.load_sound(&mut ambient).expect("load");
    let channel = engine.play_sound(&ambient).expect("play");

    engine.backend_mut().finish_channel(channel);
    assert!(engine.sound_is_playing("ambient.ogg"));
    engine.update().expect("update");
    assert!(!engine.sound_is_playing("ambient.ogg"));
    // and can be started again
    engine.play_sound(&ambient).expect("replay");
}

#[test]
#[serial]
fn init_rebuilds_all_state_from_scratch() {
    let mut engine = engine();
    let mut ambient = SoundDescriptor::new("ambient.ogg").looping(true);
    engine.load_sound(&mut ambient).expect("load");
    engine.play_sound(&ambient).expect("play");
    engine.load_bank(MASTER_BANK).expect("bank");
    engine.load_event("Explosion", &[]).expect("event");
    engine.mute().expect("mute");

    engine.init().expect("re-init");
    assert!(engine.is_initialized());
    assert_eq!(engine.loaded_sound_count(), 0);
    assert_eq!(engine.playing_loop_count(), 0);
    assert_eq!(engine.bank_count(), 0);
    assert_eq!(engine.event_count(), 0);
    assert!(!engine.is_muted());
    assert_eq!(engine.backend().live_sound_count(), 0);
    assert_eq!(engine.backend().reverb_zone_count(), 1);
}

#[test]
#[serial]
fn mute_gates_master_output() {
    let mut engine = engine();
    assert!(!engine.is_muted());
    engine.mute().expect("mute");
    assert!(engine.is_muted());
    assert!(engine.backend().is_master_muted());
    engine.unmute().expect("unmute");
    assert!(!engine.backend().is_master_muted());
}

#[test]
#[serial]
fn config_reaches_the_backend() {
    let config = EngineConfig::from_ron_str(
        "(max_channels: 256, distance_factor: 2.0, min_distance: 1.0, max_distance: 40.0, reverb: None)",
    )
    .expect("config");
    let mut engine = engine_with(config);
    let backend_config = engine.backend().config().cloned().expect("initialized");
    assert_eq!(backend_config.max_channels, 256);
    assert_eq!(backend_config.distance_factor, 2.0);
    assert_eq!(engine.backend().reverb_zone_count(), 0);

    let mut drone = SoundDescriptor::new("ambient.ogg").looping(true).spatial(true);
    engine.load_sound(&mut drone).expect("load");
    let sound = engine
        .backend()
        .calls()
        .iter()
        .find_map(|c| match c {
            audio_backend::BackendCall::CreateSound { sound, .. } => Some(*sound),
            _ => None,
        })
        .expect("sound created");
    assert_eq!(engine.backend().sound_min_max_distance(sound), Some((2.0, 80.0)));
}

#[test]
#[serial]
fn deactivate_shuts_the_backend_down() {
    let mut engine = engine();
    let mut ambient = SoundDescriptor::new("ambient.ogg").looping(true);
    engine.load_sound(&mut ambient).expect("load");
    engine.play_sound(&ambient).expect("play");
    engine.deactivate().expect("deactivate");
    assert!(!engine.backend().is_initialized());
    assert!(matches!(engine.update(), Err(EngineError::NotInitialized)));
}

#[test]
#[serial]
fn deactivate_reports_a_loop_that_would_not_stop() {
    let mut engine = engine();
    let mut ambient = SoundDescriptor::new("ambient.ogg").looping(true);
    engine.load_sound(&mut ambient).expect("load");
    engine.play_sound(&ambient).expect("play");
    engine.backend_mut().fail_op("stop_channel");

    let err = engine.deactivate().unwrap_err();
    assert!(matches!(err, EngineError::Backend(ref f) if f.op == "stop_channel"));
    // teardown still ran to the end
    assert!(!engine.is_initialized());
    assert!(!engine.backend().is_initialized());
    assert_eq!(engine.playing_loop_count(), 0);
}

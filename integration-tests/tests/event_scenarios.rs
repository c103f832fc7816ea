use audio_backend::{BackendCall, StopMode};
use audio_system::{LoadError, LookupError, DEFAULT_EVENT_VOLUME};
use integration_tests::{count_calls, engine, MASTER_BANK};
use serial_test::serial;

#[test]
#[serial]
fn explosion_event_plays_and_unknown_event_is_a_no_op() {
    let mut engine = engine();
    engine.load_bank(MASTER_BANK).expect("bank");
    engine.load_event("Explosion", &[]).expect("event");

    engine.play_event("Explosion").expect("play");
    assert!(engine.event_is_playing("Explosion"));

    engine.backend_mut().clear_calls();
    assert_eq!(
        engine.play_event("Nonexistent"),
        Err(LookupError::UnknownEvent("Nonexistent".into()))
    );
    assert!(engine.backend().calls().is_empty());
    assert!(!engine.event_is_playing("Nonexistent"));
}

#[test]
#[serial]
fn stop_event_lets_the_tail_fade_out() {
    let mut engine = engine();
    engine.load_bank(MASTER_BANK).expect("bank");
    engine.load_event("Ambience/Wind", &[]).expect("event");
    engine.play_event("Ambience/Wind").expect("play");
    engine.update().expect("update");

    engine.stop_event("Ambience/Wind").expect("stop");
    assert_eq!(
        count_calls(engine.backend().calls(), |c| matches!(
            c,
            BackendCall::StopEvent { mode: StopMode::AllowFadeOut, .. }
        )),
        1
    );
    // still releasing until the backend is pumped again
    assert!(engine.event_is_playing("Ambience/Wind"));
    engine.update().expect("update");
    assert!(!engine.event_is_playing("Ambience/Wind"));
}

#[test]
#[serial]
fn instances_are_addressed_by_index() {
    let mut engine = engine();
    engine.load_bank(MASTER_BANK).expect("bank");
    assert_eq!(engine.load_event("Footsteps", &[("Surface", 0.0)]), Ok(0));
    assert_eq!(engine.load_event("Footsteps", &[("Surface", 3.0)]), Ok(1));
    assert_eq!(engine.event_instance_count("Footsteps"), 2);

    engine.play_event_instance("Footsteps", 1).expect("play second");
    assert!(engine.event_instance_is_playing("Footsteps", 1));
    assert!(!engine.event_instance_is_playing("Footsteps", 0));

    assert_eq!(
        engine.play_event_instance("Footsteps", 2),
        Err(LookupError::UnknownInstance { name: "Footsteps".into(), index: 2 })
    );
}

#[test]
#[serial]
fn parameters_and_volume_reach_the_default_instance() {
    let mut engine = engine();
    engine.load_bank(MASTER_BANK).expect("bank");
    engine.load_event("Footsteps", &[]).expect("event");
    engine.set_event_param("Footsteps", "Speed", 1.5).expect("param");
    engine
        .set_event_volume("Footsteps", DEFAULT_EVENT_VOLUME)
        .expect("volume");

    let calls = engine.backend().calls();
    assert!(calls.iter().any(|c| matches!(
        c,
        BackendCall::SetEventParameter { name, value, .. } if name == "Speed" && *value == 1.5
    )));
    assert!(calls.iter().any(|c| matches!(
        c,
        BackendCall::SetEventVolume { volume, .. } if *volume == 0.75
    )));
    assert_eq!(
        engine.set_event_param("Missing", "Speed", 1.0),
        Err(LookupError::UnknownEvent("Missing".into()))
    );
}

#[test]
#[serial]
fn events_outside_loaded_banks_fail_to_load() {
    let mut engine = engine();
    let err = engine.load_event("Explosion", &[]).expect_err("bank not loaded");
    assert!(matches!(err, LoadError::Backend(ref f) if f.op == "event_description"));
    assert_eq!(engine.event_count(), 0);
    assert!(engine.load_bank("Missing.bank").is_err());
    assert_eq!(engine.bank_count(), 0);
}

#[test]
#[serial]
fn event_info_reports_description_summary() {
    let mut engine = engine();
    engine.load_bank(MASTER_BANK).expect("bank");
    engine.load_event("Explosion", &[]).expect("event");
    let info = engine.event_info("Explosion").expect("info");
    assert!(info.is_valid);
    assert!(info.is_oneshot);
    assert!(engine.event_info("Nonexistent").is_err());
}

use kestrel_sandbox::config::AppConfig;
use kestrel_sandbox::host::{CapturedLog, EntityDirectory};
use kestrel_sandbox::input::KeyCode;
use kestrel_sandbox::scene::Scene;
use kestrel_sandbox::{PlayState, SceneRuntime};

const DT: f32 = 1.0 / 60.0;

const SANDBOX: &str = r#"{
    "entities": [
        {
            "name": "Player",
            "transform": { "translation": { "x": 0.0, "y": 0.0 } },
            "rigidbody": { "body_type": "dynamic", "fixed_rotation": true },
            "box_collider": { "half_extents": { "x": 0.5, "y": 0.5 } },
            "script": { "class": "Sandbox.Player", "fields": { "speed": 2.0 } }
        },
        { "name": "Camera", "camera": { "distance_from_player": 5.0 } },
        {
            "name": "Crate",
            "transform": { "translation": { "x": 0.0, "y": 10.0 } },
            "rigidbody": { "body_type": "dynamic" },
            "circle_collider": { "radius": 0.25 }
        }
    ]
}"#;

fn weightless_runtime() -> SceneRuntime<CapturedLog> {
    let mut config = AppConfig::default();
    config.physics.gravity = [0.0, 0.0];
    let mut runtime = SceneRuntime::with_log(&config, CapturedLog::new());
    let scene: Scene = serde_json::from_str(SANDBOX).expect("scene parses");
    runtime.load_scene(&scene).expect("scene loads");
    runtime
}

fn run_frames(runtime: &mut SceneRuntime<CapturedLog>, frames: usize) {
    for _ in 0..frames {
        assert!(runtime.on_update_runtime(DT).expect("frame runs"));
    }
}

#[test]
fn play_start_creates_player_script_and_logs() {
    let mut runtime = weightless_runtime();
    runtime.on_runtime_start();
    let player = runtime.ecs.find_entity_by_name("Player").expect("player");
    assert_eq!(runtime.scripts().instance_count(), 1);
    assert_eq!(runtime.scripts().field(player, "speed"), Some(2.0), "scene field overrides the default");
    assert_eq!(runtime.log().lines(), [format!("PlayerController.on_create - {player}")]);
    assert!(runtime.scripts().instance_error(player).is_none());
}

#[test]
fn holding_right_moves_player_along_x() {
    let mut runtime = weightless_runtime();
    runtime.on_runtime_start();
    let player = runtime.ecs.find_entity_by_name("Player").expect("player");

    runtime.input.set_key(KeyCode::D, true);
    run_frames(&mut runtime, 30);

    let info = runtime.ecs.entity_info(player).expect("player info");
    assert!(info.translation.x > 0.0, "player should drift right, got {:?}", info.translation);
    assert!(info.translation.y.abs() < 1e-4, "no vertical input and no gravity");
    let velocity = info.velocity.expect("player has a body");
    assert!(velocity.x > 0.0);

    let elapsed = runtime.scripts().field(player, "time").expect("time field");
    assert!((elapsed - 30.0 * DT).abs() < 1e-4);
}

#[test]
fn zoom_keys_drive_named_camera() {
    let mut runtime = weightless_runtime();
    runtime.on_runtime_start();
    let camera = runtime.ecs.find_entity_by_name("Camera").expect("camera");

    runtime.input.set_key(KeyCode::Q, true);
    run_frames(&mut runtime, 10);
    let distance = runtime.ecs.entity_info(camera).and_then(|info| info.camera_distance).expect("distance");
    assert!((distance - (5.0 + 10.0 * 2.0 * DT)).abs() < 1e-4);

    runtime.input.set_key(KeyCode::Q, false);
    run_frames(&mut runtime, 5);
    let unchanged = runtime.ecs.entity_info(camera).and_then(|info| info.camera_distance).expect("distance");
    assert_eq!(unchanged, distance);
}

#[test]
fn gravity_from_config_pulls_unscripted_bodies() {
    let mut runtime = SceneRuntime::with_log(&AppConfig::default(), CapturedLog::new());
    let scene: Scene = serde_json::from_str(SANDBOX).expect("scene parses");
    runtime.load_scene(&scene).expect("scene loads");
    runtime.on_runtime_start();
    let falling = runtime.ecs.find_entity_by_name("Crate").expect("crate");
    run_frames(&mut runtime, 20);
    let info = runtime.ecs.entity_info(falling).expect("crate info");
    assert!(info.translation.y < 10.0, "default gravity points down");
}

#[test]
fn stopping_restores_edit_time_scene() {
    let mut runtime = weightless_runtime();
    runtime.on_runtime_start();
    runtime.input.set_key(KeyCode::D, true);
    run_frames(&mut runtime, 20);
    runtime.on_runtime_stop().expect("stop");

    assert_eq!(runtime.play_state(), PlayState::Editing);
    assert_eq!(runtime.scripts().instance_count(), 0);
    let player = runtime.ecs.find_entity_by_name("Player").expect("player restored");
    let info = runtime.ecs.entity_info(player).expect("player info");
    assert_eq!(info.translation.x, 0.0);
    assert!(info.velocity.is_none(), "no bodies exist outside play mode");
}

#[test]
fn player_without_rigidbody_reports_error_each_frame() {
    let mut runtime = SceneRuntime::with_log(&AppConfig::default(), CapturedLog::new());
    let scene: Scene = serde_json::from_str(
        r#"{ "entities": [ { "name": "Ghost", "script": { "class": "PlayerController" } } ] }"#,
    )
    .expect("scene parses");
    runtime.load_scene(&scene).expect("scene loads");
    runtime.on_runtime_start();
    let ghost = runtime.ecs.find_entity_by_name("Ghost").expect("ghost");
    assert!(runtime.scripts().instance_error(ghost).is_some(), "create fails without a rigidbody");

    run_frames(&mut runtime, 3);
    let err = runtime.scripts().instance_error(ghost).expect("update error").to_string();
    assert!(err.contains("before it was initialized"), "unexpected error: {err}");
}

#[test]
fn despawned_player_body_is_not_touched() {
    let mut runtime = weightless_runtime();
    runtime.on_runtime_start();
    let player = runtime.ecs.find_entity_by_name("Player").expect("player");
    assert!(runtime.ecs.despawn_entity(player));
    run_frames(&mut runtime, 2);
    assert!(runtime.ecs.find_entity_by_name("Player").is_none());
}

#[test]
fn speed_edited_mid_play_changes_zoom_rate() {
    let mut runtime = weightless_runtime();
    runtime.on_runtime_start();
    let player = runtime.ecs.find_entity_by_name("Player").expect("player");
    let camera = runtime.ecs.find_entity_by_name("Camera").expect("camera");

    assert!(runtime.scripts_mut().set_field(player, "speed", 6.0));
    assert!(!runtime.scripts_mut().set_field(player, "time", 1.0), "time is read-only");
    assert_eq!(runtime.scripts().field(player, "speed"), Some(6.0));

    runtime.input.set_key(KeyCode::Q, true);
    run_frames(&mut runtime, 4);
    let distance = runtime.ecs.entity_info(camera).and_then(|info| info.camera_distance).expect("distance");
    assert!((distance - (5.0 + 4.0 * 6.0 * DT)).abs() < 1e-4);
}

#[test]
fn stopping_releases_held_keys() {
    let mut runtime = weightless_runtime();
    runtime.on_runtime_start();
    runtime.input.set_key(KeyCode::D, true);
    run_frames(&mut runtime, 1);
    runtime.on_runtime_stop().expect("stop");
    assert_eq!(runtime.input.held_count(), 0);
}

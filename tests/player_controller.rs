use std::collections::HashMap;

use bevy_ecs::prelude::Entity;
use glam::Vec2;
use kestrel_sandbox::host::{
    CameraControl, CapturedLog, ComponentKind, ComponentRef, ComponentStore, EntityDirectory, PhysicsBodies,
    ScriptContext,
};
use kestrel_sandbox::input::{Input, KeyCode};
use kestrel_sandbox::scripts::Script;
use kestrel_sandbox::{PlayerController, ScriptError};
use rapier2d::prelude::RigidBodyHandle;

/// In-memory host that records every impulse instead of simulating it.
#[derive(Default)]
struct FakeScene {
    names: Vec<(String, Entity)>,
    bodies: HashMap<Entity, RigidBodyHandle>,
    live_bodies: Vec<RigidBodyHandle>,
    cameras: HashMap<Entity, f32>,
    impulses: Vec<(RigidBodyHandle, Vec2, bool)>,
    reject_impulses: bool,
}

impl FakeScene {
    fn with_player() -> (Self, Entity) {
        let mut scene = FakeScene::default();
        let player = Entity::from_raw(1);
        let handle = RigidBodyHandle::from_raw_parts(0, 0);
        scene.names.push(("Player".to_string(), player));
        scene.bodies.insert(player, handle);
        scene.live_bodies.push(handle);
        (scene, player)
    }

    fn add_camera(&mut self, name: &str, distance: f32) -> Entity {
        let camera = Entity::from_raw(100 + self.names.len() as u32);
        self.names.push((name.to_string(), camera));
        self.cameras.insert(camera, distance);
        camera
    }

    fn add_named(&mut self, name: &str) -> Entity {
        let entity = Entity::from_raw(200 + self.names.len() as u32);
        self.names.push((name.to_string(), entity));
        entity
    }

    fn total_impulse(&self) -> Vec2 {
        self.impulses.iter().map(|(_, impulse, _)| *impulse).sum()
    }
}

impl EntityDirectory for FakeScene {
    fn find_entity_by_name(&self, name: &str) -> Option<Entity> {
        self.names.iter().find(|(candidate, _)| candidate == name).map(|(_, entity)| *entity)
    }
}

impl ComponentStore for FakeScene {
    fn component(&self, entity: Entity, kind: ComponentKind) -> Option<ComponentRef> {
        match kind {
            ComponentKind::Rigidbody2D => self.bodies.get(&entity).copied().map(ComponentRef::Rigidbody2D),
            ComponentKind::Camera => self.cameras.get(&entity).map(|_| ComponentRef::Camera(entity)),
        }
    }
}

impl PhysicsBodies for FakeScene {
    fn contains_body(&self, body: RigidBodyHandle) -> bool {
        self.live_bodies.contains(&body)
    }

    fn apply_linear_impulse(&mut self, body: RigidBodyHandle, impulse: Vec2, wake: bool) -> bool {
        if self.reject_impulses || !self.contains_body(body) {
            return false;
        }
        self.impulses.push((body, impulse, wake));
        true
    }
}

impl CameraControl for FakeScene {
    fn distance_from_player(&self, camera: Entity) -> Option<f32> {
        self.cameras.get(&camera).copied()
    }

    fn set_distance_from_player(&mut self, camera: Entity, distance: f32) -> bool {
        match self.cameras.get_mut(&camera) {
            Some(slot) => {
                *slot = distance;
                true
            }
            None => false,
        }
    }
}

fn held(keys: &[KeyCode]) -> Input {
    let mut input = Input::new();
    for key in keys {
        input.set_key(*key, true);
    }
    input
}

fn create(controller: &mut PlayerController, scene: &mut FakeScene, entity: Entity, log: &mut CapturedLog) {
    let input = Input::new();
    let mut ctx = ScriptContext::new(entity, scene, &input, log);
    controller.on_create(&mut ctx).expect("player has a rigidbody");
}

fn update(
    controller: &mut PlayerController,
    scene: &mut FakeScene,
    entity: Entity,
    input: &Input,
    dt: f32,
) -> Result<(), ScriptError> {
    let mut log = CapturedLog::new();
    let mut ctx = ScriptContext::new(entity, scene, input, &mut log);
    controller.on_update(&mut ctx, dt)
}

#[test]
fn on_create_logs_entity_and_caches_body() {
    let (mut scene, player) = FakeScene::with_player();
    let mut controller = PlayerController::new(1.0);
    let mut log = CapturedLog::new();
    create(&mut controller, &mut scene, player, &mut log);
    assert_eq!(log.lines(), [format!("PlayerController.on_create - {player}")]);
    assert!(controller.is_initialized());
    assert_eq!(controller.body(), Some(RigidBodyHandle::from_raw_parts(0, 0)));
}

#[test]
fn elapsed_is_sum_of_deltas() {
    let (mut scene, player) = FakeScene::with_player();
    let mut controller = PlayerController::new(1.0);
    create(&mut controller, &mut scene, player, &mut CapturedLog::new());
    let input = Input::new();
    let deltas = [0.016, 0.5, 0.0, 0.25];
    for dt in deltas {
        update(&mut controller, &mut scene, player, &input, dt).expect("update");
    }
    let expected: f32 = deltas.iter().sum();
    assert!((controller.elapsed() - expected).abs() < 1e-6);
    assert_eq!(controller.field("time"), Some(controller.elapsed()));
}

#[test]
fn no_keys_apply_zero_impulse_once_per_update() {
    let (mut scene, player) = FakeScene::with_player();
    let mut controller = PlayerController::new(3.0);
    create(&mut controller, &mut scene, player, &mut CapturedLog::new());
    update(&mut controller, &mut scene, player, &Input::new(), 0.1).expect("update");
    assert_eq!(scene.impulses.len(), 1);
    let (_, impulse, wake) = scene.impulses[0];
    assert_eq!(impulse, Vec2::ZERO);
    assert!(wake, "impulses always wake the body");
}

#[test]
fn right_key_at_speed_two_half_second_gives_unit_x_impulse() {
    let (mut scene, player) = FakeScene::with_player();
    let mut controller = PlayerController::new(2.0);
    create(&mut controller, &mut scene, player, &mut CapturedLog::new());
    update(&mut controller, &mut scene, player, &held(&[KeyCode::D]), 0.5).expect("update");
    assert_eq!(scene.total_impulse(), Vec2::new(1.0, 0.0));
}

#[test]
fn up_beats_down_and_left_beats_right() {
    let (mut scene, player) = FakeScene::with_player();
    let mut controller = PlayerController::new(1.0);
    create(&mut controller, &mut scene, player, &mut CapturedLog::new());
    let input = held(&[KeyCode::W, KeyCode::S, KeyCode::A, KeyCode::D]);
    update(&mut controller, &mut scene, player, &input, 1.0).expect("update");
    assert_eq!(scene.total_impulse(), Vec2::new(-1.0, 1.0));
}

#[test]
fn zoom_changes_camera_distance_by_speed_times_delta() {
    let (mut scene, player) = FakeScene::with_player();
    let camera = scene.add_camera("Camera", 5.0);
    let mut controller = PlayerController::new(2.0);
    create(&mut controller, &mut scene, player, &mut CapturedLog::new());

    update(&mut controller, &mut scene, player, &held(&[KeyCode::Q]), 0.25).expect("zoom in");
    assert!((scene.distance_from_player(camera).expect("camera") - 5.5).abs() < 1e-6);

    update(&mut controller, &mut scene, player, &held(&[KeyCode::E]), 0.5).expect("zoom out");
    assert!((scene.distance_from_player(camera).expect("camera") - 4.5).abs() < 1e-6);
}

#[test]
fn missing_camera_is_skipped_without_error() {
    let (mut scene, player) = FakeScene::with_player();
    let other = scene.add_camera("Overview", 7.0);
    let mut controller = PlayerController::new(2.0);
    create(&mut controller, &mut scene, player, &mut CapturedLog::new());
    update(&mut controller, &mut scene, player, &held(&[KeyCode::Q, KeyCode::W]), 0.5).expect("update");
    assert_eq!(scene.distance_from_player(other), Some(7.0), "only the named camera is driven");
    assert_eq!(scene.total_impulse(), Vec2::new(0.0, 1.0));
}

#[test]
fn custom_camera_name_is_honoured() {
    let (mut scene, player) = FakeScene::with_player();
    let camera = scene.add_camera("Overview", 7.0);
    let mut controller = PlayerController::new(1.0).with_camera_name("Overview");
    create(&mut controller, &mut scene, player, &mut CapturedLog::new());
    update(&mut controller, &mut scene, player, &held(&[KeyCode::E]), 1.0).expect("update");
    assert_eq!(scene.distance_from_player(camera), Some(6.0));
}

#[test]
fn update_before_create_is_rejected() {
    let (mut scene, player) = FakeScene::with_player();
    let mut controller = PlayerController::new(1.0);
    let err = update(&mut controller, &mut scene, player, &held(&[KeyCode::D]), 0.5).unwrap_err();
    assert_eq!(err, ScriptError::NotInitialized);
    assert_eq!(controller.elapsed(), 0.0);
    assert!(scene.impulses.is_empty());
}

#[test]
fn create_without_rigidbody_fails_fast() {
    let mut scene = FakeScene::default();
    let entity = Entity::from_raw(9);
    let mut controller = PlayerController::new(1.0);
    let input = Input::new();
    let mut log = CapturedLog::new();
    let mut ctx = ScriptContext::new(entity, &mut scene, &input, &mut log);
    let err = controller.on_create(&mut ctx).unwrap_err();
    assert_eq!(err, ScriptError::MissingComponent { entity, component: ComponentKind::Rigidbody2D });
    assert!(!controller.is_initialized());
}

#[test]
fn invalid_delta_changes_nothing() {
    let (mut scene, player) = FakeScene::with_player();
    let mut controller = PlayerController::new(1.0);
    create(&mut controller, &mut scene, player, &mut CapturedLog::new());
    for dt in [-0.1, f32::NAN, f32::INFINITY] {
        let err = update(&mut controller, &mut scene, player, &held(&[KeyCode::D]), dt).unwrap_err();
        assert!(matches!(err, ScriptError::InvalidDelta(_)));
    }
    assert_eq!(controller.elapsed(), 0.0);
    assert!(scene.impulses.is_empty());
}

#[test]
fn removed_body_reports_stale_handle() {
    let (mut scene, player) = FakeScene::with_player();
    let mut controller = PlayerController::new(1.0);
    create(&mut controller, &mut scene, player, &mut CapturedLog::new());
    scene.live_bodies.clear();
    let err = update(&mut controller, &mut scene, player, &Input::new(), 0.1).unwrap_err();
    assert_eq!(err, ScriptError::StaleBody { entity: player });
    assert_eq!(controller.elapsed(), 0.0);
}

#[test]
fn rejected_impulse_leaves_time_and_camera_untouched() {
    let (mut scene, player) = FakeScene::with_player();
    let camera = scene.add_camera("Camera", 5.0);
    let mut controller = PlayerController::new(2.0);
    create(&mut controller, &mut scene, player, &mut CapturedLog::new());
    scene.reject_impulses = true;

    let err = update(&mut controller, &mut scene, player, &held(&[KeyCode::Q, KeyCode::D]), 0.5).unwrap_err();
    assert_eq!(err, ScriptError::StaleBody { entity: player });
    assert_eq!(controller.elapsed(), 0.0);
    assert_eq!(scene.distance_from_player(camera), Some(5.0));
    assert!(scene.impulses.is_empty());
}

#[test]
fn camera_name_without_camera_component_is_skipped() {
    let (mut scene, player) = FakeScene::with_player();
    scene.add_named("Camera");
    let mut controller = PlayerController::new(2.0);
    create(&mut controller, &mut scene, player, &mut CapturedLog::new());
    update(&mut controller, &mut scene, player, &held(&[KeyCode::Q, KeyCode::D]), 0.5).expect("update");
    assert_eq!(scene.total_impulse(), Vec2::new(1.0, 0.0));
    assert_eq!(controller.elapsed(), 0.5);
}

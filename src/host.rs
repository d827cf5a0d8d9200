//! Capability interfaces a script consumes from the hosting scene.
//!
//! Scripts never touch the ECS world or the physics solver directly; they go
//! through these narrow traits so the same script can run against the real
//! [`EcsWorld`](crate::ecs::EcsWorld) or a test double.

use std::fmt;

use bevy_ecs::prelude::Entity;
use glam::Vec2;
use rapier2d::prelude::RigidBodyHandle;

use crate::input::InputPolling;

/// Component families a script may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Rigidbody2D,
    Camera,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Rigidbody2D => write!(f, "Rigidbody2D"),
            ComponentKind::Camera => write!(f, "Camera"),
        }
    }
}

/// Typed, non-owning reference to a component living in the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentRef {
    Rigidbody2D(RigidBodyHandle),
    Camera(Entity),
}

pub trait EntityDirectory {
    fn find_entity_by_name(&self, name: &str) -> Option<Entity>;
}

pub trait ComponentStore {
    fn component(&self, entity: Entity, kind: ComponentKind) -> Option<ComponentRef>;

    fn rigidbody(&self, entity: Entity) -> Option<RigidBodyHandle> {
        match self.component(entity, ComponentKind::Rigidbody2D) {
            Some(ComponentRef::Rigidbody2D(handle)) => Some(handle),
            _ => None,
        }
    }

    fn camera(&self, entity: Entity) -> Option<Entity> {
        match self.component(entity, ComponentKind::Camera) {
            Some(ComponentRef::Camera(camera)) => Some(camera),
            _ => None,
        }
    }
}

pub trait PhysicsBodies {
    fn contains_body(&self, body: RigidBodyHandle) -> bool;

    /// Returns `false` when the handle no longer resolves to a body.
    fn apply_linear_impulse(&mut self, body: RigidBodyHandle, impulse: Vec2, wake: bool) -> bool;
}

pub trait CameraControl {
    fn distance_from_player(&self, camera: Entity) -> Option<f32>;
    fn set_distance_from_player(&mut self, camera: Entity, distance: f32) -> bool;
}

/// Everything scene-side a script can reach.
pub trait SceneAccess: EntityDirectory + ComponentStore + PhysicsBodies + CameraControl {}

impl<T> SceneAccess for T where T: EntityDirectory + ComponentStore + PhysicsBodies + CameraControl {}

/// Console sink handed to scripts in place of a process-wide stdout writer.
pub trait ScriptLog {
    fn write_line(&mut self, message: &str);
}

/// Forwards script console output to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogConsole;

impl ScriptLog for LogConsole {
    fn write_line(&mut self, message: &str) {
        log::info!(target: "script", "{message}");
    }
}

/// Buffers script console output so callers can inspect or serialize it.
#[derive(Debug, Default, Clone)]
pub struct CapturedLog {
    lines: Vec<String>,
}

impl CapturedLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn drain(&mut self) -> Vec<String> {
        self.lines.drain(..).collect()
    }
}

impl ScriptLog for CapturedLog {
    fn write_line(&mut self, message: &str) {
        log::debug!(target: "script", "{message}");
        self.lines.push(message.to_string());
    }
}

/// Per-call view of the host given to a script callback.
pub struct ScriptContext<'a> {
    pub entity: Entity,
    pub scene: &'a mut dyn SceneAccess,
    pub input: &'a dyn InputPolling,
    pub log: &'a mut dyn ScriptLog,
}

impl<'a> ScriptContext<'a> {
    pub fn new(
        entity: Entity,
        scene: &'a mut dyn SceneAccess,
        input: &'a dyn InputPolling,
        log: &'a mut dyn ScriptLog,
    ) -> Self {
        Self { entity, scene, input, log }
    }
}

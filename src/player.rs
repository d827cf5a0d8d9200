use bevy_ecs::prelude::Entity;
use glam::Vec2;
use rapier2d::prelude::RigidBodyHandle;

use crate::error::{validate_delta, ScriptError};
use crate::host::{ComponentKind, ScriptContext};
use crate::input::{InputPolling, PlayerAction, PlayerBindings};
use crate::scripts::Script;

pub const DEFAULT_CAMERA_NAME: &str = "Camera";
pub const PLAYER_CLASS: &str = "Sandbox.Player";

/// Moves its entity's rigidbody from keyboard input and dollies the follow camera.
#[derive(Debug, Clone)]
pub struct PlayerController {
    pub speed: f32,
    elapsed: f32,
    entity: Option<Entity>,
    body: Option<RigidBodyHandle>,
    bindings: PlayerBindings,
    camera_name: String,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl PlayerController {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            elapsed: 0.0,
            entity: None,
            body: None,
            bindings: PlayerBindings::default(),
            camera_name: DEFAULT_CAMERA_NAME.to_string(),
        }
    }

    pub fn with_bindings(mut self, bindings: PlayerBindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn with_camera_name(mut self, name: impl Into<String>) -> Self {
        self.camera_name = name.into();
        self
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_initialized(&self) -> bool {
        self.body.is_some()
    }

    pub fn body(&self) -> Option<RigidBodyHandle> {
        self.body
    }
}

/// Unit direction requested by the movement keys. Up beats down, left beats right.
pub fn movement_intent(bindings: &PlayerBindings, input: &dyn InputPolling) -> Vec2 {
    let mut direction = Vec2::ZERO;
    if bindings.is_held(PlayerAction::MoveUp, input) {
        direction.y = 1.0;
    } else if bindings.is_held(PlayerAction::MoveDown, input) {
        direction.y = -1.0;
    }
    if bindings.is_held(PlayerAction::MoveLeft, input) {
        direction.x = -1.0;
    } else if bindings.is_held(PlayerAction::MoveRight, input) {
        direction.x = 1.0;
    }
    direction
}

/// `1.0` to zoom in, `-1.0` to zoom out, `0.0` otherwise. Zoom-in wins.
pub fn zoom_intent(bindings: &PlayerBindings, input: &dyn InputPolling) -> f32 {
    if bindings.is_held(PlayerAction::ZoomIn, input) {
        1.0
    } else if bindings.is_held(PlayerAction::ZoomOut, input) {
        -1.0
    } else {
        0.0
    }
}

impl Script for PlayerController {
    fn class_name(&self) -> &'static str {
        PLAYER_CLASS
    }

    fn on_create(&mut self, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        ctx.log.write_line(&format!("PlayerController.on_create - {}", ctx.entity));
        self.entity = Some(ctx.entity);
        let body = ctx.scene.rigidbody(ctx.entity).ok_or(ScriptError::MissingComponent {
            entity: ctx.entity,
            component: ComponentKind::Rigidbody2D,
        })?;
        self.body = Some(body);
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut ScriptContext<'_>, delta_seconds: f32) -> Result<(), ScriptError> {
        let dt = validate_delta(delta_seconds)?;
        let body = self.body.ok_or(ScriptError::NotInitialized)?;
        if !ctx.scene.contains_body(body) {
            return Err(ScriptError::StaleBody { entity: self.entity.unwrap_or(ctx.entity) });
        }

        let direction = movement_intent(&self.bindings, ctx.input);
        let zoom = zoom_intent(&self.bindings, ctx.input);
        let camera_target = ctx
            .scene
            .find_entity_by_name(&self.camera_name)
            .and_then(|entity| ctx.scene.camera(entity))
            .filter(|_| zoom != 0.0)
            .and_then(|camera| {
                let distance = ctx.scene.distance_from_player(camera)?;
                Some((camera, distance + zoom * self.speed * dt))
            });

        // Frame state only commits once the body accepted the impulse.
        let velocity = direction * self.speed;
        if !ctx.scene.apply_linear_impulse(body, velocity * dt, true) {
            return Err(ScriptError::StaleBody { entity: self.entity.unwrap_or(ctx.entity) });
        }
        self.elapsed += dt;
        if let Some((camera, distance)) = camera_target {
            ctx.scene.set_distance_from_player(camera, distance);
        }
        Ok(())
    }

    fn set_field(&mut self, name: &str, value: f32) -> bool {
        match name {
            "speed" => {
                self.speed = value;
                true
            }
            _ => false,
        }
    }

    fn field(&self, name: &str) -> Option<f32> {
        match name {
            "speed" => Some(self.speed),
            "time" => Some(self.elapsed),
            _ => None,
        }
    }

}

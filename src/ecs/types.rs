use bevy_ecs::prelude::*;
use glam::Vec2;
use rapier2d::prelude::RigidBodyHandle;
use serde::{Deserialize, Serialize};

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
}
impl Default for Transform {
    fn default() -> Self {
        Self { translation: Vec2::ZERO, rotation: 0.0, scale: Vec2::splat(1.0) }
    }
}

/// Display name used for lookups such as `find_entity_by_name("Camera")`.
#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct EntityName(pub String);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    Static,
    #[default]
    Dynamic,
    Kinematic,
}

#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Rigidbody2D {
    pub body_type: BodyType,
    pub fixed_rotation: bool,
}

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct BoxCollider2D {
    pub offset: Vec2,
    /// Half extents before the transform scale is applied.
    pub half: Vec2,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for BoxCollider2D {
    fn default() -> Self {
        Self { offset: Vec2::ZERO, half: Vec2::splat(0.5), density: 1.0, friction: 0.5, restitution: 0.0 }
    }
}

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct CircleCollider2D {
    pub offset: Vec2,
    pub radius: f32,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for CircleCollider2D {
    fn default() -> Self {
        Self { offset: Vec2::ZERO, radius: 0.5, density: 1.0, friction: 0.5, restitution: 0.0 }
    }
}

/// Follow camera; scripts dolly it through `distance_from_player`.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    pub distance_from_player: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self { distance_from_player: 5.0 }
    }
}

/// Runtime body created when physics starts. Absent while editing.
#[derive(Component, Clone, Copy)]
pub struct RapierBody {
    pub handle: RigidBodyHandle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub name: Option<String>,
    pub translation: Vec2,
    pub rotation: f32,
    pub velocity: Option<Vec2>,
    pub camera_distance: Option<f32>,
}

use anyhow::{Context, Result};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::ecs::BodyType;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub entities: Vec<SceneEntity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneEntity {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub transform: TransformData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rigidbody: Option<RigidbodyData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_collider: Option<BoxColliderData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circle_collider: Option<CircleColliderData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<ScriptData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformData {
    #[serde(default)]
    pub translation: Vec2Data,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "Vec2Data::one")]
    pub scale: Vec2Data,
}

impl Default for TransformData {
    fn default() -> Self {
        Self { translation: Vec2Data::default(), rotation: 0.0, scale: Vec2Data::one() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2Data {
    pub x: f32,
    pub y: f32,
}

impl Vec2Data {
    fn one() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

impl From<Vec2Data> for Vec2 {
    fn from(value: Vec2Data) -> Self {
        Vec2::new(value.x, value.y)
    }
}

impl From<Vec2> for Vec2Data {
    fn from(value: Vec2) -> Self {
        Self { x: value.x, y: value.y }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RigidbodyData {
    #[serde(default)]
    pub body_type: BodyType,
    #[serde(default)]
    pub fixed_rotation: bool,
}

const fn default_density() -> f32 {
    1.0
}

const fn default_friction() -> f32 {
    0.5
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxColliderData {
    #[serde(default)]
    pub offset: Vec2Data,
    pub half_extents: Vec2Data,
    #[serde(default = "default_density")]
    pub density: f32,
    #[serde(default = "default_friction")]
    pub friction: f32,
    #[serde(default)]
    pub restitution: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleColliderData {
    #[serde(default)]
    pub offset: Vec2Data,
    pub radius: f32,
    #[serde(default = "default_density")]
    pub density: f32,
    #[serde(default = "default_friction")]
    pub friction: f32,
    #[serde(default)]
    pub restitution: f32,
}

const fn default_camera_distance() -> f32 {
    5.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraData {
    #[serde(default = "default_camera_distance")]
    pub distance_from_player: f32,
}

impl Default for CameraData {
    fn default() -> Self {
        Self { distance_from_player: default_camera_distance() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptData {
    pub class: String,
    #[serde(default)]
    pub fields: BTreeMap<String, f32>,
}

impl Scene {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("Reading scene file {}", path.display()))?;
        let scene = serde_json::from_slice::<Scene>(&bytes)
            .with_context(|| format!("Parsing scene file {}", path.display()))?;
        Ok(scene)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Creating scene directory {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json.as_bytes()).with_context(|| format!("Writing scene file {}", path.display()))?;
        Ok(())
    }

    pub fn entity_named(&self, name: &str) -> Option<&SceneEntity> {
        self.entities.iter().find(|entity| entity.name.as_deref() == Some(name))
    }
}

use anyhow::{Context, Result};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::input::InputConfig;
use crate::player::DEFAULT_CAMERA_NAME;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    #[serde(default = "PhysicsConfig::default_gravity")]
    pub gravity: [f32; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Speed given to player scripts whose scene entry does not set one.
    #[serde(default = "PlayerConfig::default_speed")]
    pub default_speed: f32,
    #[serde(default = "PlayerConfig::default_camera_entity")]
    pub camera_entity: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub input: InputConfig,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfigOverrides {
    pub gravity: Option<[f32; 2]>,
    pub default_speed: Option<f32>,
}

impl PhysicsConfig {
    const fn default_gravity() -> [f32; 2] {
        [0.0, -9.8]
    }

    pub fn gravity(&self) -> Vec2 {
        Vec2::from_array(self.gravity)
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self { gravity: Self::default_gravity() }
    }
}

impl PlayerConfig {
    const fn default_speed() -> f32 {
        1.0
    }

    fn default_camera_entity() -> String {
        DEFAULT_CAMERA_NAME.to_string()
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self { default_speed: Self::default_speed(), camera_entity: Self::default_camera_entity() }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(gravity) = overrides.gravity {
            self.physics.gravity = gravity;
        }
        if let Some(speed) = overrides.default_speed {
            self.player.default_speed = speed;
        }
    }
}

impl AppConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.gravity.is_none() && self.default_speed.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.gravity.is_some() {
            fields.push("gravity");
        }
        if self.default_speed.is_some() {
            fields.push("default_speed");
        }
        fields
    }
}

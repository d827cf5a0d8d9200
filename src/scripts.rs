use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use bevy_ecs::prelude::{Component, Entity};

use crate::config::AppConfig;
use crate::ecs::EcsWorld;
use crate::error::ScriptError;
use crate::host::{ScriptContext, ScriptLog};
use crate::input::{InputPolling, PlayerBindings};
use crate::player::{PlayerController, PLAYER_CLASS};

/// Gameplay behaviour attached to an entity and driven by [`ScriptHost`].
pub trait Script: Send + Sync {
    fn class_name(&self) -> &'static str;

    fn on_create(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut ScriptContext<'_>, _delta_seconds: f32) -> Result<(), ScriptError> {
        Ok(())
    }

    /// Assigns a public numeric field. Returns `false` for unknown or read-only fields.
    fn set_field(&mut self, _name: &str, _value: f32) -> bool {
        false
    }

    fn field(&self, _name: &str) -> Option<f32> {
        None
    }
}

/// Marks an entity as scripted. `instance_id` is assigned when play starts and reset to 0 on stop.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct ScriptBehaviour {
    pub class: String,
    pub fields: BTreeMap<String, f32>,
    pub instance_id: u64,
}

impl ScriptBehaviour {
    pub fn new(class: impl Into<String>) -> Self {
        Self { class: class.into(), fields: BTreeMap::new(), instance_id: 0 }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: f32) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

type ScriptFactory = Box<dyn Fn() -> Box<dyn Script> + Send + Sync>;

#[derive(Default)]
pub struct ScriptRegistry {
    factories: HashMap<String, ScriptFactory>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in sandbox classes, seeded from config.
    pub fn with_defaults(config: &AppConfig) -> Self {
        let mut registry = Self::new();
        let speed = config.player.default_speed;
        let camera = config.player.camera_entity.clone();
        let bindings = PlayerBindings::from_config(config.input.clone(), "config");
        let factory = move || -> Box<dyn Script> {
            Box::new(
                PlayerController::new(speed).with_bindings(bindings.clone()).with_camera_name(camera.clone()),
            )
        };
        let factory = Arc::new(factory);
        for class in [PLAYER_CLASS, "PlayerController"] {
            let factory = factory.clone();
            registry.register(class, move || (*factory)());
        }
        registry
    }

    pub fn register<F>(&mut self, class: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Script> + Send + Sync + 'static,
    {
        self.factories.insert(class.into(), Box::new(factory));
    }

    pub fn contains(&self, class: &str) -> bool {
        self.factories.contains_key(class)
    }

    pub fn instantiate(&self, class: &str) -> Result<Box<dyn Script>> {
        let factory = self.factories.get(class).ok_or_else(|| anyhow!("Unknown script class '{class}'"))?;
        Ok(factory())
    }
}

struct ScriptInstance {
    id: u64,
    entity: Entity,
    script: Box<dyn Script>,
    error: Option<ScriptError>,
}

impl ScriptInstance {
    fn record(&mut self, result: Result<(), ScriptError>, phase: &str) {
        match result {
            Ok(()) => self.error = None,
            Err(err) => {
                if self.error.as_ref() != Some(&err) {
                    log::error!(
                        "[script] {} #{} on entity {} failed during {phase}: {err}",
                        self.script.class_name(),
                        self.id,
                        self.entity
                    );
                }
                self.error = Some(err);
            }
        }
    }
}

/// Owns the live script instances of a running scene.
pub struct ScriptHost {
    registry: ScriptRegistry,
    instances: Vec<ScriptInstance>,
    next_instance_id: u64,
    enabled: bool,
}

impl ScriptHost {
    pub fn new(registry: ScriptRegistry) -> Self {
        Self { registry, instances: Vec::new(), next_instance_id: 1, enabled: true }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enable: bool) {
        self.enabled = enable;
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Instantiates a script for every entity carrying [`ScriptBehaviour`] and runs `on_create`.
    pub fn on_runtime_start(&mut self, ecs: &mut EcsWorld, input: &dyn InputPolling, log: &mut dyn ScriptLog) {
        self.instances.clear();
        for (entity, behaviour) in ecs.scripted_entities() {
            let mut script = match self.registry.instantiate(&behaviour.class) {
                Ok(script) => script,
                Err(err) => {
                    log::warn!("[script] entity {entity}: {err}, skipping.");
                    continue;
                }
            };
            for (name, value) in &behaviour.fields {
                if !script.set_field(name, *value) {
                    log::warn!(
                        "[script] {}: unknown or read-only field '{name}' on entity {entity}, ignoring.",
                        behaviour.class
                    );
                }
            }
            let id = self.next_instance_id;
            self.next_instance_id += 1;
            ecs.set_script_instance_id(entity, id);

            let mut instance = ScriptInstance { id, entity, script, error: None };
            let result = {
                let mut ctx = ScriptContext::new(entity, ecs, input, log);
                instance.script.on_create(&mut ctx)
            };
            instance.record(result, "on_create");
            self.instances.push(instance);
        }
        log::debug!("[script] started {} instance(s)", self.instances.len());
    }

    pub fn update(&mut self, ecs: &mut EcsWorld, input: &dyn InputPolling, log: &mut dyn ScriptLog, dt: f32) {
        if !self.enabled {
            return;
        }
        for instance in &mut self.instances {
            if !ecs.entity_exists(instance.entity) {
                continue;
            }
            let result = {
                let mut ctx = ScriptContext::new(instance.entity, ecs, input, log);
                instance.script.on_update(&mut ctx, dt)
            };
            instance.record(result, "on_update");
        }
    }

    pub fn on_runtime_stop(&mut self, ecs: &mut EcsWorld) {
        for instance in self.instances.drain(..) {
            ecs.set_script_instance_id(instance.entity, 0);
        }
    }

    pub fn instance_error(&self, entity: Entity) -> Option<&ScriptError> {
        self.instance(entity).and_then(|instance| instance.error.as_ref())
    }

    pub fn errors(&self) -> impl Iterator<Item = (Entity, &ScriptError)> + '_ {
        self.instances.iter().filter_map(|instance| instance.error.as_ref().map(|err| (instance.entity, err)))
    }

    pub fn field(&self, entity: Entity, name: &str) -> Option<f32> {
        self.instance(entity).and_then(|instance| instance.script.field(name))
    }

    pub fn set_field(&mut self, entity: Entity, name: &str, value: f32) -> bool {
        self.instances
            .iter_mut()
            .find(|instance| instance.entity == entity)
            .is_some_and(|instance| instance.script.set_field(name, value))
    }

    fn instance(&self, entity: Entity) -> Option<&ScriptInstance> {
        self.instances.iter().find(|instance| instance.entity == entity)
    }
}

use bevy_ecs::prelude::{Entity, Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;
use anyhow::{bail, Result};
use glam::Vec2;
use rapier2d::prelude::RigidBodyHandle;

use super::physics::{PhysicsParams, RapierState};
use super::systems::{sys_step_rapier, sys_sync_from_rapier, TimeDelta};
use super::types::*;
use crate::scene::{
    BoxColliderData, CameraData, CircleColliderData, RigidbodyData, Scene, SceneEntity, ScriptData, TransformData,
};
use crate::host::{CameraControl, ComponentKind, ComponentRef, ComponentStore, EntityDirectory, PhysicsBodies};
use crate::scripts::ScriptBehaviour;

// ---------- World container ----------
pub struct EcsWorld {
    pub world: World,
    schedule_fixed: Schedule,
    physics_running: bool,
}

impl Default for EcsWorld {
    fn default() -> Self {
        Self::new(PhysicsParams::default())
    }
}

impl EcsWorld {
    pub fn new(params: PhysicsParams) -> Self {
        let mut world = World::new();
        world.insert_resource(TimeDelta(0.0));
        world.insert_resource(params);
        world.insert_resource(RapierState::new(&params));

        let mut schedule_fixed = Schedule::default();
        schedule_fixed.add_systems((sys_step_rapier, sys_sync_from_rapier).chain());

        Self { world, schedule_fixed, physics_running: false }
    }

    pub fn spawn_named(&mut self, name: impl Into<String>) -> Entity {
        self.world.spawn((Transform::default(), EntityName(name.into()))).id()
    }

    pub fn entity_exists(&self, entity: Entity) -> bool {
        self.world.get_entity(entity).is_ok()
    }

    pub fn name_of(&self, entity: Entity) -> Option<&str> {
        self.world.get::<EntityName>(entity).map(|name| name.0.as_str())
    }

    pub fn physics_running(&self) -> bool {
        self.physics_running
    }

    /// Builds solver bodies for every entity carrying [`Rigidbody2D`].
    pub fn start_physics(&mut self) {
        if self.physics_running {
            self.stop_physics();
        }
        let pending: Vec<_> = {
            let mut query = self.world.query::<(
                Entity,
                &Transform,
                &Rigidbody2D,
                Option<&BoxCollider2D>,
                Option<&CircleCollider2D>,
            )>();
            query
                .iter(&self.world)
                .map(|(entity, transform, rb, bc, cc)| (entity, *transform, *rb, bc.copied(), cc.copied()))
                .collect()
        };
        for (entity, transform, rb, bc, cc) in pending {
            let handle = {
                let mut rapier = self.world.resource_mut::<RapierState>();
                rapier.spawn_body(&transform, &rb, bc.as_ref(), cc.as_ref())
            };
            self.world.entity_mut(entity).insert(RapierBody { handle });
        }
        self.physics_running = true;
        log::debug!("[physics] started with {} bodies", self.world.resource::<RapierState>().body_count());
    }

    /// Drops all solver state. Entities keep their last synced transforms.
    pub fn stop_physics(&mut self) {
        let with_bodies: Vec<Entity> = {
            let mut query = self.world.query::<(Entity, &RapierBody)>();
            query.iter(&self.world).map(|(entity, _)| entity).collect()
        };
        for entity in with_bodies {
            self.world.entity_mut(entity).remove::<RapierBody>();
        }
        let params = *self.world.resource::<PhysicsParams>();
        self.world.insert_resource(RapierState::new(&params));
        self.physics_running = false;
    }

    pub fn fixed_step(&mut self, dt: f32) {
        self.world.resource_mut::<TimeDelta>().0 = dt;
        self.schedule_fixed.run(&mut self.world);
    }

    pub fn body_handle(&self, entity: Entity) -> Option<RigidBodyHandle> {
        self.world.get::<RapierBody>(entity).map(|body| body.handle)
    }

    pub fn scripted_entities(&mut self) -> Vec<(Entity, ScriptBehaviour)> {
        let mut query = self.world.query::<(Entity, &ScriptBehaviour)>();
        let mut entities: Vec<_> =
            query.iter(&self.world).map(|(entity, behaviour)| (entity, behaviour.clone())).collect();
        entities.sort_by_key(|(entity, _)| entity.index());
        entities
    }

    pub fn set_script_instance_id(&mut self, entity: Entity, id: u64) {
        if let Some(mut behaviour) = self.world.get_mut::<ScriptBehaviour>(entity) {
            behaviour.instance_id = id;
        }
    }

    pub fn entity_info(&self, entity: Entity) -> Option<EntityInfo> {
        let transform = self.world.get::<Transform>(entity)?;
        let velocity = self.body_handle(entity).and_then(|handle| {
            let rapier = self.world.resource::<RapierState>();
            rapier.body(handle).map(|body| Vec2::new(body.linvel().x, body.linvel().y))
        });
        Some(EntityInfo {
            name: self.name_of(entity).map(str::to_string),
            translation: transform.translation,
            rotation: transform.rotation,
            velocity,
            camera_distance: self.world.get::<CameraRig>(entity).map(|rig| rig.distance_from_player),
        })
    }

    /// Spawns every scene entry in order. Nothing is spawned when validation fails.
    pub fn load_scene(&mut self, scene: &Scene) -> Result<Vec<Entity>> {
        for (idx, entry) in scene.entities.iter().enumerate() {
            validate_entry(idx, entry)?;
        }
        let mut spawned = Vec::with_capacity(scene.entities.len());
        for entry in &scene.entities {
            let transform = Transform {
                translation: entry.transform.translation.into(),
                rotation: entry.transform.rotation,
                scale: entry.transform.scale.into(),
            };
            let mut builder = self.world.spawn(transform);
            if let Some(name) = &entry.name {
                builder.insert(EntityName(name.clone()));
            }
            if let Some(rb) = &entry.rigidbody {
                builder.insert(Rigidbody2D { body_type: rb.body_type, fixed_rotation: rb.fixed_rotation });
            }
            if let Some(bc) = &entry.box_collider {
                builder.insert(BoxCollider2D {
                    offset: bc.offset.into(),
                    half: bc.half_extents.into(),
                    density: bc.density,
                    friction: bc.friction,
                    restitution: bc.restitution,
                });
            }
            if let Some(cc) = &entry.circle_collider {
                builder.insert(CircleCollider2D {
                    offset: cc.offset.into(),
                    radius: cc.radius,
                    density: cc.density,
                    friction: cc.friction,
                    restitution: cc.restitution,
                });
            }
            if let Some(camera) = &entry.camera {
                builder.insert(CameraRig { distance_from_player: camera.distance_from_player });
            }
            if let Some(script) = &entry.script {
                let mut behaviour = ScriptBehaviour::new(script.class.clone());
                behaviour.fields = script.fields.clone();
                builder.insert(behaviour);
            }
            spawned.push(builder.id());
        }
        Ok(spawned)
    }

    /// Snapshot of the authored components, in spawn order.
    pub fn export_scene(&mut self) -> Scene {
        let mut query = self.world.query::<(
            Entity,
            &Transform,
            Option<&EntityName>,
            Option<&Rigidbody2D>,
            Option<&BoxCollider2D>,
            Option<&CircleCollider2D>,
            Option<&CameraRig>,
            Option<&ScriptBehaviour>,
        )>();
        let mut rows: Vec<_> = query
            .iter(&self.world)
            .map(|(entity, transform, name, rb, bc, cc, camera, script)| {
                let entry = SceneEntity {
                    name: name.map(|n| n.0.clone()),
                    transform: TransformData {
                        translation: transform.translation.into(),
                        rotation: transform.rotation,
                        scale: transform.scale.into(),
                    },
                    rigidbody: rb.map(|rb| RigidbodyData { body_type: rb.body_type, fixed_rotation: rb.fixed_rotation }),
                    box_collider: bc.map(|bc| BoxColliderData {
                        offset: bc.offset.into(),
                        half_extents: bc.half.into(),
                        density: bc.density,
                        friction: bc.friction,
                        restitution: bc.restitution,
                    }),
                    circle_collider: cc.map(|cc| CircleColliderData {
                        offset: cc.offset.into(),
                        radius: cc.radius,
                        density: cc.density,
                        friction: cc.friction,
                        restitution: cc.restitution,
                    }),
                    camera: camera.map(|rig| CameraData { distance_from_player: rig.distance_from_player }),
                    script: script.map(|behaviour| ScriptData {
                        class: behaviour.class.clone(),
                        fields: behaviour.fields.clone(),
                    }),
                };
                (entity.index(), entry)
            })
            .collect();
        rows.sort_by_key(|(index, _)| *index);
        Scene { entities: rows.into_iter().map(|(_, entry)| entry).collect() }
    }

    /// Despawns the entity and its body. Scripts still holding the handle see it as stale.
    pub fn despawn_entity(&mut self, entity: Entity) -> bool {
        if let Some(handle) = self.body_handle(entity) {
            let mut rapier = self.world.resource_mut::<RapierState>();
            rapier.remove_body(handle);
        }
        self.world.despawn(entity)
    }
}

fn validate_entry(idx: usize, entry: &SceneEntity) -> Result<()> {
    let label = entry.name.clone().unwrap_or_else(|| format!("#{idx}"));
    if let Some(bc) = &entry.box_collider {
        if bc.half_extents.x <= 0.0 || bc.half_extents.y <= 0.0 {
            bail!("Scene entity '{label}': box collider half extents must be positive");
        }
    }
    if let Some(cc) = &entry.circle_collider {
        if cc.radius <= 0.0 {
            bail!("Scene entity '{label}': circle collider radius must be positive");
        }
    }
    if (entry.box_collider.is_some() || entry.circle_collider.is_some()) && entry.rigidbody.is_none() {
        log::warn!("[scene] entity '{label}' has a collider but no rigidbody; it will not be simulated.");
    }
    if let Some(script) = &entry.script {
        if script.class.trim().is_empty() {
            bail!("Scene entity '{label}': script class must not be empty");
        }
    }
    Ok(())
}

impl EntityDirectory for EcsWorld {
    fn find_entity_by_name(&self, name: &str) -> Option<Entity> {
        self.world
            .iter_entities()
            .filter(|entity| entity.get::<EntityName>().is_some_and(|tag| tag.0 == name))
            .map(|entity| entity.id())
            .min_by_key(|entity| entity.index())
    }
}

impl ComponentStore for EcsWorld {
    fn component(&self, entity: Entity, kind: ComponentKind) -> Option<ComponentRef> {
        match kind {
            ComponentKind::Rigidbody2D => self.body_handle(entity).map(ComponentRef::Rigidbody2D),
            ComponentKind::Camera => self.world.get::<CameraRig>(entity).map(|_| ComponentRef::Camera(entity)),
        }
    }
}

impl PhysicsBodies for EcsWorld {
    fn contains_body(&self, body: RigidBodyHandle) -> bool {
        self.world.resource::<RapierState>().contains(body)
    }

    fn apply_linear_impulse(&mut self, body: RigidBodyHandle, impulse: Vec2, wake: bool) -> bool {
        self.world.resource_mut::<RapierState>().apply_impulse(body, impulse, wake)
    }
}

impl CameraControl for EcsWorld {
    fn distance_from_player(&self, camera: Entity) -> Option<f32> {
        self.world.get::<CameraRig>(camera).map(|rig| rig.distance_from_player)
    }

    fn set_distance_from_player(&mut self, camera: Entity, distance: f32) -> bool {
        match self.world.get_mut::<CameraRig>(camera) {
            Some(mut rig) => {
                rig.distance_from_player = distance;
                true
            }
            None => false,
        }
    }
}

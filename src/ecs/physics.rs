use bevy_ecs::prelude::*;
use glam::Vec2;
use rapier2d::prelude::{
    CCDSolver, ColliderBuilder, ColliderSet, DefaultBroadPhase, ImpulseJointSet, IntegrationParameters,
    IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, QueryPipeline, Real, RigidBody,
    RigidBodyBuilder, RigidBodyHandle, RigidBodySet, Vector,
};

use super::types::{BodyType, BoxCollider2D, CircleCollider2D, Rigidbody2D, Transform};

#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct PhysicsParams {
    pub gravity: Vec2,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self { gravity: Vec2::new(0.0, -9.8) }
    }
}

#[derive(Resource)]
pub struct RapierState {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl RapierState {
    pub fn new(params: &PhysicsParams) -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vec_to_rapier(params.gravity),
            integration_parameters: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    /// Creates a body (plus any colliders) mirroring the entity's components.
    pub fn spawn_body(
        &mut self,
        transform: &Transform,
        rigidbody: &Rigidbody2D,
        box_collider: Option<&BoxCollider2D>,
        circle_collider: Option<&CircleCollider2D>,
    ) -> RigidBodyHandle {
        let builder = match rigidbody.body_type {
            BodyType::Static => RigidBodyBuilder::fixed(),
            BodyType::Dynamic => RigidBodyBuilder::dynamic(),
            BodyType::Kinematic => RigidBodyBuilder::kinematic_position_based(),
        };
        let mut builder = builder.translation(vec_to_rapier(transform.translation)).rotation(transform.rotation);
        if rigidbody.fixed_rotation {
            builder = builder.lock_rotations();
        }
        let body_handle = self.bodies.insert(builder.build());

        if let Some(bc) = box_collider {
            let half = bc.half * transform.scale;
            let collider = ColliderBuilder::cuboid(half.x, half.y)
                .translation(vec_to_rapier(bc.offset))
                .density(bc.density)
                .friction(bc.friction)
                .restitution(bc.restitution)
                .build();
            self.colliders.insert_with_parent(collider, body_handle, &mut self.bodies);
        }
        if let Some(cc) = circle_collider {
            let collider = ColliderBuilder::ball(cc.radius * transform.scale.x)
                .translation(vec_to_rapier(cc.offset))
                .density(cc.density)
                .friction(cc.friction)
                .restitution(cc.restitution)
                .build();
            self.colliders.insert_with_parent(collider, body_handle, &mut self.bodies);
        }
        if let Some(body) = self.bodies.get_mut(body_handle) {
            body.recompute_mass_properties_from_colliders(&self.colliders);
        }
        body_handle
    }

    pub fn contains(&self, handle: RigidBodyHandle) -> bool {
        self.bodies.contains(handle)
    }

    pub fn apply_impulse(&mut self, handle: RigidBodyHandle, impulse: Vec2, wake: bool) -> bool {
        match self.bodies.get_mut(handle) {
            Some(body) => {
                body.apply_impulse(vec_to_rapier(impulse), wake);
                true
            }
            None => false,
        }
    }

    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        let removed = self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        if removed.is_none() {
            log::debug!("[physics] remove_body: {handle:?} was already removed");
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        let hooks = ();
        let events = ();
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &hooks,
            &events,
        );
        self.query_pipeline.update(&self.colliders);
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }
}

fn vec_to_rapier(v: Vec2) -> Vector<Real> {
    Vector::new(v.x, v.y)
}

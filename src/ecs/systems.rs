use bevy_ecs::prelude::*;
use glam::Vec2;

use super::physics::RapierState;
use super::types::{RapierBody, Transform};

#[derive(Resource, Clone, Copy, Default)]
pub struct TimeDelta(pub f32);

pub fn sys_step_rapier(mut rapier: ResMut<RapierState>, dt: Res<TimeDelta>) {
    if dt.0 > 0.0 {
        rapier.step(dt.0);
    }
}

/// Copies solver poses back onto `Transform` so readers see post-step positions.
pub fn sys_sync_from_rapier(rapier: Res<RapierState>, mut query: Query<(&RapierBody, &mut Transform)>) {
    for (body_handle, mut transform) in &mut query {
        if let Some(body) = rapier.body(body_handle.handle) {
            let translation = body.translation();
            transform.translation = Vec2::new(translation.x, translation.y);
            transform.rotation = body.rotation().angle();
        }
    }
}

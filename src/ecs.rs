//! Concrete scene host: a `bevy_ecs` world plus a rapier2d solver.

mod physics;
mod systems;
mod types;
mod world;

pub use physics::{PhysicsParams, RapierState};
pub use systems::TimeDelta;
pub use types::*;
pub use world::EcsWorld;

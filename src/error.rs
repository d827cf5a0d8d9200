use bevy_ecs::prelude::Entity;
use thiserror::Error;

use crate::host::ComponentKind;

/// Failures surfaced by script lifecycle callbacks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    /// A component the script requires was not attached to its entity at creation.
    #[error("entity {entity} has no {component} component")]
    MissingComponent { entity: Entity, component: ComponentKind },

    /// `on_update` ran before a successful `on_create`.
    #[error("script updated before it was initialized")]
    NotInitialized,

    /// Frame delta was negative, NaN or infinite.
    #[error("invalid frame delta {0}")]
    InvalidDelta(f32),

    /// The cached rigidbody handle no longer refers to a live body.
    #[error("rigidbody cached for entity {entity} is no longer alive")]
    StaleBody { entity: Entity },
}

/// Rejects frame deltas the simulation cannot integrate.
pub fn validate_delta(delta_seconds: f32) -> Result<f32, ScriptError> {
    if delta_seconds.is_finite() && delta_seconds >= 0.0 {
        Ok(delta_seconds)
    } else {
        Err(ScriptError::InvalidDelta(delta_seconds))
    }
}

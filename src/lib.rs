pub mod cli;
pub mod config;
pub mod ecs;
pub mod error;
pub mod harness;
pub mod host;
pub mod input;
pub mod player;
pub mod runtime_host;
pub mod scene;
pub mod scripts;

pub use error::ScriptError;
pub use player::PlayerController;
pub use runtime_host::{PlayState, SceneRuntime};

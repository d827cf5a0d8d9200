use anyhow::{bail, Result};
use bevy_ecs::prelude::Entity;

use crate::config::AppConfig;
use crate::ecs::{EcsWorld, PhysicsParams};
use crate::error::validate_delta;
use crate::host::{LogConsole, ScriptLog};
use crate::input::Input;
use crate::scene::Scene;
use crate::scripts::{ScriptHost, ScriptRegistry};

/// Describes the current runtime execution mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    /// Editor-only state; the simulation is not running.
    Editing,
    /// Runtime play mode. `paused` distinguishes between live play and paused single-step.
    Playing { paused: bool },
}

/// Drives one scene through play mode: scripts first, then physics, once per frame.
pub struct SceneRuntime<L: ScriptLog = LogConsole> {
    pub ecs: EcsWorld,
    pub input: Input,
    scripts: ScriptHost,
    log: L,
    params: PhysicsParams,
    play_state: PlayState,
    step_frames: u32,
    editor_snapshot: Option<Scene>,
}

impl SceneRuntime<LogConsole> {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_log(config, LogConsole)
    }
}

impl<L: ScriptLog> SceneRuntime<L> {
    pub fn with_log(config: &AppConfig, log: L) -> Self {
        let params = PhysicsParams { gravity: config.physics.gravity() };
        Self {
            ecs: EcsWorld::new(params),
            input: Input::new(),
            scripts: ScriptHost::new(ScriptRegistry::with_defaults(config)),
            log,
            params,
            play_state: PlayState::Editing,
            step_frames: 0,
            editor_snapshot: None,
        }
    }

    pub fn play_state(&self) -> PlayState {
        self.play_state
    }

    pub fn scripts(&self) -> &ScriptHost {
        &self.scripts
    }

    /// Live field edits on running scripts, e.g. from an inspector.
    pub fn scripts_mut(&mut self) -> &mut ScriptHost {
        &mut self.scripts
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut L {
        &mut self.log
    }

    /// Spawns a scene into the edit-time world.
    pub fn load_scene(&mut self, scene: &Scene) -> Result<Vec<Entity>> {
        if self.play_state != PlayState::Editing {
            bail!("Cannot load a scene while the runtime is playing");
        }
        self.ecs.load_scene(scene)
    }

    /// Enter play mode: build physics bodies, then instantiate and create scripts.
    pub fn on_runtime_start(&mut self) {
        if self.play_state != PlayState::Editing {
            return;
        }
        self.editor_snapshot = Some(self.ecs.export_scene());
        self.ecs.start_physics();
        self.scripts.on_runtime_start(&mut self.ecs, &self.input, &mut self.log);
        self.play_state = PlayState::Playing { paused: false };
        self.step_frames = 0;
        log::info!("[runtime] play started with {} script(s)", self.scripts.instance_count());
    }

    /// Leave play mode and restore the world authored before play started.
    pub fn on_runtime_stop(&mut self) -> Result<()> {
        if self.play_state == PlayState::Editing {
            return Ok(());
        }
        self.scripts.on_runtime_stop(&mut self.ecs);
        self.ecs.stop_physics();
        self.input.release_all();
        self.play_state = PlayState::Editing;
        self.step_frames = 0;
        if let Some(snapshot) = self.editor_snapshot.take() {
            let mut restored = EcsWorld::new(self.params);
            restored.load_scene(&snapshot)?;
            self.ecs = restored;
        }
        log::info!("[runtime] play stopped");
        Ok(())
    }

    pub fn pause(&mut self) {
        if let PlayState::Playing { .. } = self.play_state {
            self.play_state = PlayState::Playing { paused: true };
        }
    }

    pub fn resume(&mut self) {
        if let PlayState::Playing { .. } = self.play_state {
            self.play_state = PlayState::Playing { paused: false };
            self.step_frames = 0;
        }
    }

    /// Queue frames to advance while paused.
    pub fn step(&mut self, frames: u32) {
        if let PlayState::Playing { paused: true } = self.play_state {
            self.step_frames = self.step_frames.saturating_add(frames);
        }
    }

    pub fn pending_step_frames(&self) -> u32 {
        self.step_frames
    }

    /// Advances one frame. Returns `Ok(false)` when paused with no queued steps.
    pub fn on_update_runtime(&mut self, dt: f32) -> Result<bool> {
        let dt = validate_delta(dt)?;
        let paused = match self.play_state {
            PlayState::Editing => bail!("Runtime update requested while editing"),
            PlayState::Playing { paused } => paused,
        };
        if paused && self.step_frames == 0 {
            return Ok(false);
        }
        self.scripts.update(&mut self.ecs, &self.input, &mut self.log, dt);
        self.ecs.fixed_step(dt);
        self.input.clear_frame();
        if self.step_frames > 0 {
            self.step_frames -= 1;
        }
        Ok(true)
    }
}

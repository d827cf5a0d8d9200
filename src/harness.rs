use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::Path;

use anyhow::{bail, Context, Result};
use bevy_ecs::prelude::Entity;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::ecs::{EcsWorld, EntityName};
use crate::error::validate_delta;
use crate::host::{CapturedLog, EntityDirectory};
use crate::input::{Input, KeyCode};
use crate::runtime_host::SceneRuntime;
use crate::scene::Scene;
use crate::scripts::ScriptHost;

/// Headless play session: a scene, a config and a scripted key timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessFixture {
    #[serde(default)]
    pub config: AppConfig,
    #[serde(default)]
    pub scene: Scene,
    #[serde(default = "default_steps")]
    pub steps: usize,
    #[serde(default = "default_dt")]
    pub dt: f32,
    #[serde(default)]
    pub timeline: Vec<KeyWindow>,
    /// Entity names sampled every step. Empty tracks every named entity.
    #[serde(default)]
    pub track: Vec<String>,
}

/// Keys held for steps in `[from, to)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyWindow {
    pub keys: Vec<String>,
    #[serde(default)]
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarnessOutput {
    pub steps: usize,
    pub dt: f32,
    pub startup_logs: Vec<String>,
    pub results: Vec<StepResult>,
    pub final_entities: Vec<EntitySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepResult {
    pub step: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub held: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub entities: Vec<EntitySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntitySummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub translation: [f32; 2],
    pub rotation: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<[f32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_distance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_time: Option<f32>,
}

const fn default_steps() -> usize {
    120
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

struct ResolvedWindow {
    keys: Vec<KeyCode>,
    from: usize,
    to: usize,
}

impl ResolvedWindow {
    fn active(&self, step: usize) -> bool {
        (self.from..self.to).contains(&step)
    }
}

pub fn load_fixture<P: AsRef<Path>>(path: P) -> Result<HarnessFixture> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening fixture '{}'", path.display()))?;
    serde_json::from_reader(file).with_context(|| format!("parsing fixture '{}'", path.display()))
}

pub fn run_fixture(fixture: &HarnessFixture) -> Result<HarnessOutput> {
    validate_delta(fixture.dt).context("fixture dt")?;
    let timeline = resolve_timeline(&fixture.timeline)?;
    let timeline_keys: BTreeSet<KeyCode> = timeline.iter().flat_map(|window| window.keys.iter().copied()).collect();

    let mut runtime = SceneRuntime::with_log(&fixture.config, CapturedLog::new());
    runtime.load_scene(&fixture.scene).context("loading fixture scene")?;
    let tracked = resolve_tracked(&mut runtime.ecs, &fixture.track)?;

    runtime.on_runtime_start();
    let startup_logs = runtime.log_mut().drain();

    let mut results = Vec::with_capacity(fixture.steps);
    for step in 0..fixture.steps {
        let held = apply_timeline(&mut runtime.input, &timeline, &timeline_keys, step);
        runtime.on_update_runtime(fixture.dt).with_context(|| format!("running step {step}"))?;
        let logs = runtime.log_mut().drain();
        let errors = collect_errors(&runtime.ecs, runtime.scripts());
        let entities =
            tracked.iter().filter_map(|entity| summarize(&runtime.ecs, runtime.scripts(), *entity)).collect();
        results.push(StepResult { step, held, logs, errors, entities });
    }

    let final_entities = named_entities(&mut runtime.ecs)
        .into_iter()
        .filter_map(|entity| summarize(&runtime.ecs, runtime.scripts(), entity))
        .collect();
    runtime.on_runtime_stop()?;

    Ok(HarnessOutput { steps: fixture.steps, dt: fixture.dt, startup_logs, results, final_entities })
}

pub fn write_output<P: AsRef<Path>>(output: &HarnessOutput, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory '{}'", parent.display()))?;
        }
    }
    let file = File::create(path).with_context(|| format!("writing harness output to '{}'", path.display()))?;
    serde_json::to_writer_pretty(file, output).context("serializing harness output")?;
    Ok(())
}

/// Fails with both documents inlined when `output` differs from the golden file.
pub fn check_golden<P: AsRef<Path>>(output: &HarnessOutput, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening golden file '{}'", path.display()))?;
    let expected: HarnessOutput = serde_json::from_reader(file).context("parsing golden JSON")?;
    if &expected != output {
        bail!(
            "golden mismatch for {} (use --write-output to refresh):\nexpected: {}\nactual:   {}",
            path.display(),
            serde_json::to_string(&expected).unwrap_or_default(),
            serde_json::to_string(output).unwrap_or_default(),
        );
    }
    Ok(())
}

fn resolve_timeline(windows: &[KeyWindow]) -> Result<Vec<ResolvedWindow>> {
    windows
        .iter()
        .enumerate()
        .map(|(idx, window)| {
            if window.from > window.to {
                bail!("timeline entry {idx}: 'from' ({}) is after 'to' ({})", window.from, window.to);
            }
            let keys = window
                .keys
                .iter()
                .map(|name| {
                    KeyCode::from_name(name)
                        .with_context(|| format!("timeline entry {idx}: unknown key '{name}'"))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(ResolvedWindow { keys, from: window.from, to: window.to })
        })
        .collect()
}

fn apply_timeline(
    input: &mut Input,
    timeline: &[ResolvedWindow],
    timeline_keys: &BTreeSet<KeyCode>,
    step: usize,
) -> Vec<String> {
    let active: BTreeSet<KeyCode> = timeline
        .iter()
        .filter(|window| window.active(step))
        .flat_map(|window| window.keys.iter().copied())
        .collect();
    for key in timeline_keys {
        input.set_key(*key, active.contains(key));
    }
    active.iter().map(|key| format!("{key:?}")).collect()
}

fn resolve_tracked(ecs: &mut EcsWorld, names: &[String]) -> Result<Vec<Entity>> {
    if names.is_empty() {
        return Ok(named_entities(ecs));
    }
    names
        .iter()
        .map(|name| {
            ecs.find_entity_by_name(name).with_context(|| format!("tracked entity '{name}' is not in the scene"))
        })
        .collect()
}

fn named_entities(ecs: &mut EcsWorld) -> Vec<Entity> {
    let mut query = ecs.world.query::<(Entity, &EntityName)>();
    let mut entities: Vec<Entity> = query.iter(&ecs.world).map(|(entity, _)| entity).collect();
    entities.sort_by_key(|entity| entity.index());
    entities
}

fn collect_errors(ecs: &EcsWorld, scripts: &ScriptHost) -> Vec<String> {
    let mut errors: Vec<(u32, String)> = scripts
        .errors()
        .map(|(entity, err)| {
            let label = ecs.name_of(entity).map(str::to_string).unwrap_or_else(|| format!("{entity:?}"));
            (entity.index(), format!("{label}: {err}"))
        })
        .collect();
    errors.sort();
    errors.into_iter().map(|(_, message)| message).collect()
}

fn summarize(ecs: &EcsWorld, scripts: &ScriptHost, entity: Entity) -> Option<EntitySummary> {
    let info = ecs.entity_info(entity)?;
    Some(EntitySummary {
        name: info.name,
        translation: info.translation.to_array(),
        rotation: info.rotation,
        velocity: info.velocity.map(|v| v.to_array()),
        camera_distance: info.camera_distance,
        script_time: scripts.field(entity, "time"),
    })
}

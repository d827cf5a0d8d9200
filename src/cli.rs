use crate::config::AppConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

/// Flags accepted by the `player_harness` binary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HarnessArgs {
    pub fixture: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub write_output: Option<PathBuf>,
    pub golden: Option<PathBuf>,
    pub steps: Option<usize>,
    pub dt: Option<f32>,
    pub help: bool,
    overrides: AppConfigOverrides,
}

impl HarnessArgs {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = HarnessArgs::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if flag == "--help" || flag == "-h" {
                parsed.help = true;
                continue;
            }
            if !flag.starts_with('-') {
                bail!("Unexpected argument '{flag}'. Use --help to list supported flags.");
            }
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match flag {
                "--fixture" | "-f" => parsed.fixture = Some(PathBuf::from(value)),
                "--config" | "-c" => parsed.config = Some(PathBuf::from(value)),
                "--write-output" | "-o" => parsed.write_output = Some(PathBuf::from(value)),
                "--golden" | "-g" => parsed.golden = Some(PathBuf::from(value)),
                "--steps" => {
                    parsed.steps =
                        Some(value.parse::<usize>().with_context(|| format!("Invalid steps '{value}'"))?);
                }
                "--dt" => {
                    let dt = value.parse::<f32>().with_context(|| format!("Invalid dt '{value}'"))?;
                    if !dt.is_finite() || dt < 0.0 {
                        bail!("Invalid dt '{value}'. Use a non-negative number of seconds.");
                    }
                    parsed.dt = Some(dt);
                }
                "--speed" => {
                    parsed.overrides.default_speed =
                        Some(value.parse::<f32>().with_context(|| format!("Invalid speed '{value}'"))?);
                }
                "--gravity" => parsed.overrides.gravity = Some(parse_vec2_flag("gravity", &value)?),
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --fixture, --config, --write-output, --golden, \
                     --steps, --dt, --speed, --gravity."
                ),
            }
        }
        Ok(parsed)
    }

    pub fn config_overrides(&self) -> &AppConfigOverrides {
        &self.overrides
    }
}

fn parse_vec2_flag(flag: &str, value: &str) -> Result<[f32; 2]> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [x, y] => {
            let x = x.parse::<f32>().with_context(|| format!("Invalid {flag} x component '{x}'"))?;
            let y = y.parse::<f32>().with_context(|| format!("Invalid {flag} y component '{y}'"))?;
            Ok([x, y])
        }
        _ => bail!("Invalid {flag} value '{value}'. Use 'x,y'."),
    }
}

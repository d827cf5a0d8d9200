use anyhow::{Context, Result};
use kestrel_sandbox::cli::HarnessArgs;
use kestrel_sandbox::config::AppConfig;
use kestrel_sandbox::harness::{check_golden, load_fixture, run_fixture, write_output};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = match HarnessArgs::parse_from_env() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("[player-harness] {err}");
            std::process::exit(2);
        }
    };
    if args.help {
        print_help();
        return;
    }
    if let Err(err) = run_cli(&args) {
        eprintln!("[player-harness] error: {err:?}");
        std::process::exit(1);
    }
}

fn run_cli(args: &HarnessArgs) -> Result<()> {
    let fixture_path = args.fixture.as_ref().context("--fixture <path> is required")?;
    let mut fixture = load_fixture(fixture_path)?;
    if let Some(path) = &args.config {
        fixture.config = AppConfig::load(path)?;
    }
    let overrides = args.config_overrides();
    if !overrides.is_empty() {
        fixture.config.apply_overrides(overrides);
        log::info!("[player-harness] config overrides: {}", overrides.applied_fields().join(", "));
    }
    if let Some(steps) = args.steps {
        fixture.steps = steps;
    }
    if let Some(dt) = args.dt {
        fixture.dt = dt;
    }

    let output = run_fixture(&fixture)?;

    if let Some(path) = &args.write_output {
        write_output(&output, path)?;
        println!("[player-harness] wrote {}", path.display());
    }

    if let Some(path) = &args.golden {
        check_golden(&output, path).with_context(|| format!("fixture {}", fixture_path.display()))?;
        println!("[player-harness] matched golden {}", path.display());
    } else if args.write_output.is_none() {
        serde_json::to_writer_pretty(std::io::stdout(), &output)?;
        println!();
    }

    Ok(())
}

fn print_help() {
    println!("Usage: player_harness --fixture <path> [--golden <path>] [--write-output <path>]");
    println!("  -f, --fixture        Path to a harness fixture JSON file");
    println!("  -c, --config         Replace the fixture config with this app config JSON");
    println!("  -g, --golden         Optional golden output file to compare against");
    println!("  -o, --write-output   Optional path to write the actual output JSON");
    println!("      --steps <n>      Override the fixture step count");
    println!("      --dt <seconds>   Override the fixture frame delta");
    println!("      --speed <v>      Override the default player speed");
    println!("      --gravity <x,y>  Override physics gravity");
}

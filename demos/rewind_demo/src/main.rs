//! Rewind Demo
//!
//! Replays scripted input through a ghostline world without a window.
//! Each script runs on a fresh world; checkpoints print the HUD line and
//! what is on screen at that frame.
//!
//! Usage: `rewind_demo [SCENARIO_DIR] [SCRIPT_NAME]`

use ghostline_core::World;
use ghostline_script::{Loader, RunSummary, ScenarioDefs, ScenarioScript};
use std::env;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "ghostline_core=info,rewind_demo=info,warn";

fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    let dir = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios").to_string());

    let mut loader = Loader::new();
    if let Err(err) = loader.load_directory(&dir) {
        error!(%err, %dir, "failed to load scenarios");
        return ExitCode::FAILURE;
    }
    let defs = loader.finish();

    let scripts: Vec<&ScenarioScript> = match args.get(2) {
        Some(name) => match defs.get_script(name) {
            Some(script) => vec![script],
            None => {
                error!(script = %name, "no such script");
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut all: Vec<&ScenarioScript> = defs.scripts.values().collect();
            all.sort_by(|a, b| a.name.cmp(&b.name));
            all
        }
    };

    println!("=== Ghostline Rewind Demo ===\n");
    for script in scripts {
        match run_script(&defs, script) {
            Ok(summary) => print_summary(script, &summary),
            Err(err) => {
                error!(script = %script.name, %err, "scenario failed");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

fn run_script(defs: &ScenarioDefs, script: &ScenarioScript) -> ghostline_script::Result<RunSummary> {
    let mut world = World::new(defs.world_config())?;
    let summary = script.run(&mut world)?;
    info!(
        script = %script.name,
        frames = summary.frames,
        commits = summary.commits,
        "scenario finished"
    );
    Ok(summary)
}

fn print_summary(script: &ScenarioScript, summary: &RunSummary) {
    println!("--- {} ({} frames at dt={}) ---", script.name, summary.frames, script.dt);
    for checkpoint in &summary.checkpoints {
        println!(
            "  [{:>4}] {:<12} {}  ghosts={} projectiles={}",
            checkpoint.frame,
            checkpoint.name,
            checkpoint.hud,
            checkpoint.visible_ghosts,
            checkpoint.live_projectiles
        );
    }
    println!(
        "  branches: {} committed, {} discarded; timelines retired: {}\n",
        summary.commits, summary.discards, summary.retirements
    );
}

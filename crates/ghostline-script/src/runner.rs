//! Replay a scenario script against a world

use crate::error::Result;
use crate::schema::ScenarioScript;
use ghostline_core::{BranchOutcome, Frame, Hud, VariantTag, World};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// World state captured at a named checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub name: String,
    pub frame: Frame,
    pub hud: Hud,
    /// Ghosts drawn at this frame
    pub visible_ghosts: usize,
    /// Live projectiles in flight
    pub live_projectiles: usize,
}

impl Checkpoint {
    fn capture(name: &str, world: &World) -> Self {
        let views = world.view();
        Self {
            name: name.to_string(),
            frame: world.clock().frame,
            hud: world.hud(),
            visible_ghosts: views
                .iter()
                .filter(|v| v.variant.is_ghost() && v.visible)
                .count(),
            live_projectiles: views
                .iter()
                .filter(|v| v.variant == VariantTag::Projectile && v.visible)
                .count(),
        }
    }
}

/// Totals over one script run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub frames: u64,
    pub commits: usize,
    pub discards: usize,
    pub retirements: usize,
    pub checkpoints: Vec<Checkpoint>,
}

impl RunSummary {
    pub fn checkpoint(&self, name: &str) -> Option<&Checkpoint> {
        self.checkpoints.iter().find(|c| c.name == name)
    }
}

impl ScenarioScript {
    /// Step `world` through every frame of the script
    pub fn run(&self, world: &mut World) -> Result<RunSummary> {
        self.validate()?;
        info!(script = %self.name, frames = self.total_frames(), "running scenario");

        let mut summary = RunSummary::default();
        for step in &self.steps {
            for _ in 0..step.repeat {
                let report = world.step(self.dt, &step.input)?;
                summary.frames += 1;
                match report.branch {
                    Some(BranchOutcome::Committed { .. }) => summary.commits += 1,
                    Some(BranchOutcome::Discarded { .. }) => summary.discards += 1,
                    None => {}
                }
                summary.retirements += report.retired.len();
            }
            if let Some(name) = &step.checkpoint {
                let checkpoint = Checkpoint::capture(name, world);
                debug!(checkpoint = %name, hud = %checkpoint.hud, "checkpoint reached");
                summary.checkpoints.push(checkpoint);
            }
        }
        Ok(summary)
    }
}

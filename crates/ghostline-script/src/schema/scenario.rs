//! Scenario scripts: fixed-step input sequences
//!
//! ```ron
//! (
//!     name: "fire_and_rewind",
//!     dt: 0.125,
//!     steps: [
//!         (repeat: 8),
//!         (input: (shoot_at: Some((500.0, 300.0))), checkpoint: Some("fired")),
//!         (input: (rewind_toggle: true)),
//!     ],
//! )
//! ```

use crate::error::{Error, Result};
use ghostline_core::FrameInput;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One scripted input, held for `repeat` frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptStep {
    /// Input fed to every frame of this step
    pub input: FrameInput,
    /// Number of frames (defaults to 1)
    pub repeat: u32,
    /// Name reported once the step's last frame has run
    pub checkpoint: Option<String>,
}

impl Default for ScriptStep {
    fn default() -> Self {
        Self {
            input: FrameInput::default(),
            repeat: 1,
            checkpoint: None,
        }
    }
}

impl ScriptStep {
    pub fn new(input: FrameInput) -> Self {
        Self {
            input,
            ..Self::default()
        }
    }

    /// Hold the input for `frames` frames
    pub fn repeat(mut self, frames: u32) -> Self {
        self.repeat = frames;
        self
    }

    /// Name the state after this step
    pub fn checkpoint(mut self, name: impl Into<String>) -> Self {
        self.checkpoint = Some(name.into());
        self
    }
}

/// A deterministic input sequence at a fixed frame delta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioScript {
    /// Script name (used as the lookup key when loading directories)
    pub name: String,
    /// Seconds per frame
    pub dt: f64,
    pub steps: Vec<ScriptStep>,
}

impl ScenarioScript {
    pub fn new(name: impl Into<String>, dt: f64) -> Self {
        Self {
            name: name.into(),
            dt,
            steps: Vec::new(),
        }
    }

    /// Append a step
    pub fn with_step(mut self, step: ScriptStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Check the frame delta, repeat counts and checkpoint names
    pub fn validate(&self) -> Result<()> {
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(Error::InvalidScript(format!(
                "{}: dt must be positive, got {}",
                self.name, self.dt
            )));
        }
        if self.steps.is_empty() {
            return Err(Error::InvalidScript(format!("{}: no steps", self.name)));
        }
        let mut seen = HashSet::new();
        for (index, step) in self.steps.iter().enumerate() {
            if step.repeat == 0 {
                return Err(Error::InvalidScript(format!(
                    "{}: step {} repeats zero times",
                    self.name, index
                )));
            }
            if let Some(name) = &step.checkpoint {
                if !seen.insert(name.as_str()) {
                    return Err(Error::DuplicateDefinition(format!(
                        "{}: checkpoint {}",
                        self.name, name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Total number of frames the script runs
    pub fn total_frames(&self) -> u64 {
        self.steps.iter().map(|s| u64::from(s.repeat)).sum()
    }

    /// Checkpoint names in script order
    pub fn checkpoints(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|s| s.checkpoint.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    fn script() -> ScenarioScript {
        ScenarioScript::new("test", 0.125)
            .with_step(ScriptStep::default().repeat(8))
            .with_step(ScriptStep::new(FrameInput::shooting(DVec2::new(500.0, 300.0))).checkpoint("fired"))
            .with_step(ScriptStep::new(FrameInput::toggle_rewind()))
    }

    #[test]
    fn test_total_frames_and_checkpoints() {
        let script = script();
        script.validate().unwrap();
        assert_eq!(script.total_frames(), 10);
        assert_eq!(script.checkpoints().collect::<Vec<_>>(), vec!["fired"]);
    }

    #[test]
    fn test_rejects_bad_dt() {
        let mut script = script();
        script.dt = 0.0;
        assert!(matches!(script.validate(), Err(Error::InvalidScript(_))));
    }

    #[test]
    fn test_rejects_zero_repeat() {
        let script = script().with_step(ScriptStep::default().repeat(0));
        assert!(matches!(script.validate(), Err(Error::InvalidScript(_))));
    }

    #[test]
    fn test_rejects_duplicate_checkpoint() {
        let script = script().with_step(ScriptStep::default().checkpoint("fired"));
        assert!(matches!(script.validate(), Err(Error::DuplicateDefinition(_))));
    }

    #[test]
    fn test_step_defaults_from_ron() {
        let step: ScriptStep = ron::from_str("(checkpoint: Some(\"start\"))").unwrap();
        assert_eq!(step.repeat, 1);
        assert!(step.input.is_idle());
        assert_eq!(step.checkpoint.as_deref(), Some("start"));
    }
}

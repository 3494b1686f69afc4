//! Ghostline Script - RON loader and scenario replay
//!
//! Loads simulation content from RON files:
//! - World configuration (`WorldConfig`)
//! - Scenario scripts: fixed-step input sequences with named checkpoints
//!
//! A loaded script drives a `World` headlessly through `ScenarioScript::run`.

mod error;
mod loader;
mod runner;
mod schema;

pub use error::{Error, Result};
pub use loader::{Loader, ScenarioDefs};
pub use runner::{Checkpoint, RunSummary};
pub use schema::{ScenarioScript, ScriptStep};

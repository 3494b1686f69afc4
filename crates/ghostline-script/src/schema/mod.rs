//! Schema definitions for RON scripts

pub mod scenario;

pub use scenario::{ScenarioScript, ScriptStep};

//! Ghostline Core - time-dilation simulation with rewindable timelines
//!
//! This crate provides the frame-stepped simulation core:
//! - A radial dilation field (`TimeField`) that slows local clocks
//! - Entities with their own clocks and command cursors
//! - Reversible commands recorded in a permanent `CommandLog`
//! - Deterministic movement paths baked at fixed steps
//! - Timeline branching: resuming after a rewind turns the overwritten
//!   future into ghosts of a new timeline, paid for with a rewind charge
//! - Ghost lifecycle: ghosts replay against global time and refund the
//!   charge once their timeline has finished replaying
//!
//! ## Example
//!
//! ```
//! use ghostline_core::{FrameInput, World, WorldConfig};
//!
//! let mut world = World::new(WorldConfig::default()).unwrap();
//! let report = world.step(1.0 / 60.0, &FrameInput::idle()).unwrap();
//! assert_eq!(report.frame, 1);
//! assert_eq!(world.hud().rewind_charges, 3);
//! ```

mod branch;
pub mod command;
pub mod config;
pub mod entity;
mod error;
pub mod field;
mod ghost;
mod identity;
mod input;
pub mod path;
mod queue;
pub mod time;
pub mod timeline;
pub mod view;
mod world;

pub use branch::BranchOutcome;
pub use command::{CommandAction, CommandKind, CommandLog, ProjectileSpec, ReversibleCommand};
pub use config::{
    FieldConfig, PlayerConfig, ProjectileConfig, RewindConfig, TimerGrid, WorldConfig,
};
pub use entity::{Entity, EntityStore, EntityVariant};
pub use error::{Error, Result};
pub use field::{FieldSample, TimeField};
pub use identity::{CommandId, EntityId, TimelineId};
pub use input::FrameInput;
pub use path::{MovementPath, PathSample};
pub use queue::CommandQueue;
pub use time::{Direction, Frame, GlobalClock, LocalClock};
pub use timeline::{GhostKey, SlotRetirement, TimelineManager};
pub use view::{Color, EntityView, Hud, VariantTag};
pub use world::{FrameReport, World};

pub use glam::DVec2;

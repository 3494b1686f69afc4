//! Read-only state handed to a renderer each frame

use crate::{EntityId, TimelineId};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const PLAYER: Color = Color::new(80, 220, 100);
    pub const PROJECTILE: Color = Color::new(255, 200, 50);
    pub const TIMER: Color = Color::new(255, 255, 0);
    /// Fallback for ghosts when no palette color applies
    pub const GHOST: Color = Color::new(200, 200, 200);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Which kind of entity a view describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariantTag {
    Player,
    Projectile,
    Timer,
    GhostPlayer,
    GhostProjectile,
}

impl VariantTag {
    pub fn is_ghost(&self) -> bool {
        matches!(self, VariantTag::GhostPlayer | VariantTag::GhostProjectile)
    }
}

/// Render state of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub variant: VariantTag,
    pub pos: DVec2,
    pub color: Color,
    pub visible: bool,
    /// Timeline a ghost replays
    pub timeline: Option<TimelineId>,
    /// Scalar display value (a timer's local time)
    pub label: Option<f64>,
}

/// Heads-up display values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hud {
    pub rewind_charges: u32,
    pub max_charges: u32,
    pub global_time: f64,
    pub current_timeline: TimelineId,
    pub rewinding: bool,
}

impl fmt::Display for Hud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:.2} {} rewinds={}/{}{}",
            self.global_time,
            self.current_timeline,
            self.rewind_charges,
            self.max_charges,
            if self.rewinding { " [rewinding]" } else { "" }
        )
    }
}

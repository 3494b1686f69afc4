//! Per-frame input consumed by `World::step`

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Intents sampled once per frame
///
/// Movement and shooting are ignored while the world is rewinding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameInput {
    /// Movement direction; normalized before use, zero means stand still
    pub movement: DVec2,
    /// Point to fire at this frame, if any
    pub shoot_at: Option<DVec2>,
    /// Flip between rewinding and running forward
    pub rewind_toggle: bool,
    /// Direction to drift the dilation field center
    pub field_drift: DVec2,
}

impl FrameInput {
    /// No intents at all
    pub fn idle() -> Self {
        Self::default()
    }

    /// Move in a direction
    pub fn moving(direction: DVec2) -> Self {
        Self {
            movement: direction,
            ..Self::default()
        }
    }

    /// Fire at a target point
    pub fn shooting(target: DVec2) -> Self {
        Self {
            shoot_at: Some(target),
            ..Self::default()
        }
    }

    /// Toggle rewinding
    pub fn toggle_rewind() -> Self {
        Self {
            rewind_toggle: true,
            ..Self::default()
        }
    }

    /// Add a rewind toggle
    pub fn with_rewind_toggle(mut self) -> Self {
        self.rewind_toggle = true;
        self
    }

    /// Add a field drift intent
    pub fn with_field_drift(mut self, direction: DVec2) -> Self {
        self.field_drift = direction;
        self
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

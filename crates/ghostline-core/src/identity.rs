//! Identity types for entities, commands and timelines
//!
//! All three are stable integer handles. Lookups through them are exact-identity
//! operations: two entities or commands with equal payloads are still distinct.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an entity instance at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Create a new entity ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity:{}", self.0)
    }
}

/// Handle of a command in the permanent command log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CommandId(pub u64);

impl CommandId {
    /// Create a new command ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd:{}", self.0)
    }
}

/// Identifier of an observable history
///
/// Timeline `0` is the history the world starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct TimelineId(pub u64);

impl TimelineId {
    /// The timeline every world starts in
    pub const ROOT: TimelineId = TimelineId(0);

    /// Create a new timeline ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// The id minted after this one
    pub fn successor(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timeline:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id() {
        let id = EntityId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "entity:42");
    }

    #[test]
    fn test_command_id() {
        let id = CommandId::new(7);
        assert_eq!(id.raw(), 7);
        assert_eq!(format!("{}", id), "cmd:7");
    }

    #[test]
    fn test_timeline_id() {
        assert_eq!(TimelineId::default(), TimelineId::ROOT);
        assert_eq!(TimelineId::ROOT.successor(), TimelineId::new(1));
        assert_eq!(format!("{}", TimelineId::new(3)), "timeline:3");
    }
}

//! Reversible commands and the permanent command log
//!
//! A command is a scheduled unit of state mutation with an exact inverse.
//! `execute` and `reverse` toggle an `executed` flag and are no-ops when the
//! flag already has the requested value, so replaying a cursor over a queue
//! twice never double-applies anything.
//!
//! Every command the live actor ever issues is recorded once in the
//! [`CommandLog`]. Entities only hold [`CommandId`] handles into it.

use crate::{
    entity::{Entity, EntityStore},
    CommandId, EntityId, Error, Result, TimeField, TimelineId,
};
use glam::DVec2;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Whether a command is a discrete event or one sample of a continuous path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    /// Fires once (e.g. spawning a projectile)
    OneShot,
    /// One sample of an actor's movement
    Path,
}

/// Everything needed to spawn, bake and replay one projectile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpec {
    pub origin: DVec2,
    pub velocity: DVec2,
    pub max_lifetime: f64,
    pub bake_step: f64,
    /// Field the shot was fired in; live and ghost paths both bake against it
    pub field: TimeField,
}

/// Payload plus forward/backward behavior of a command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommandAction {
    /// Forward adds a projectile to the world; backward removes that same one
    SpawnProjectile(ProjectileSpec),
    /// Records where the issuer is at the scheduled time; its position is
    /// replayed from the movement path, so neither direction touches the world
    Move { pos: DVec2 },
}

impl CommandAction {
    pub fn kind(&self) -> CommandKind {
        match self {
            CommandAction::SpawnProjectile(_) => CommandKind::OneShot,
            CommandAction::Move { .. } => CommandKind::Path,
        }
    }
}

/// A scheduled, reversible command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReversibleCommand {
    id: CommandId,
    /// Actor that issued the command
    issuer: EntityId,
    action: CommandAction,
    scheduled_time: f64,
    executed: bool,
    origin_timeline: TimelineId,
    /// Timelines this command has already been materialized into as a ghost
    ghosted_timelines: BTreeSet<TimelineId>,
    /// Entity created by the last forward application
    spawned: Option<EntityId>,
}

impl ReversibleCommand {
    pub fn new(
        id: CommandId,
        issuer: EntityId,
        action: CommandAction,
        scheduled_time: f64,
        origin_timeline: TimelineId,
    ) -> Self {
        Self {
            id,
            issuer,
            action,
            scheduled_time,
            executed: false,
            origin_timeline,
            ghosted_timelines: BTreeSet::new(),
            spawned: None,
        }
    }

    /// Apply the forward action
    ///
    /// Returns `Ok(false)` without touching anything if already executed.
    pub fn execute(&mut self, store: &mut EntityStore) -> Result<bool> {
        if self.executed {
            return Ok(false);
        }
        match &self.action {
            CommandAction::SpawnProjectile(spec) => {
                let spec = *spec;
                let source = self.id;
                let entity = store.create_with(|id| Entity::projectile(id, spec, source));
                self.spawned = Some(entity.id);
            }
            CommandAction::Move { .. } => {}
        }
        self.executed = true;
        Ok(true)
    }

    /// Apply the backward action
    ///
    /// Returns `Ok(false)` without touching anything if not executed.
    pub fn reverse(&mut self, store: &mut EntityStore) -> Result<bool> {
        if !self.executed {
            return Ok(false);
        }
        match &self.action {
            CommandAction::SpawnProjectile(_) => {
                let spawned = self.spawned.take().ok_or_else(|| {
                    Error::invariant(format!("{} executed without a spawned entity", self.id))
                })?;
                if store.remove(spawned).is_none() {
                    return Err(Error::invariant(format!(
                        "{} cannot reverse: {} is gone",
                        self.id, spawned
                    )));
                }
            }
            CommandAction::Move { .. } => {}
        }
        self.executed = false;
        Ok(true)
    }

    /// Record that this command now has a ghost in `timeline`
    ///
    /// Returns `false` if it was already ghosted there.
    pub fn mark_ghosted(&mut self, timeline: TimelineId) -> bool {
        self.ghosted_timelines.insert(timeline)
    }

    pub fn is_ghosted_in(&self, timeline: TimelineId) -> bool {
        self.ghosted_timelines.contains(&timeline)
    }

    pub fn ghosted_timelines(&self) -> impl Iterator<Item = TimelineId> + '_ {
        self.ghosted_timelines.iter().copied()
    }

    pub fn id(&self) -> CommandId {
        self.id
    }

    pub fn issuer(&self) -> EntityId {
        self.issuer
    }

    pub fn kind(&self) -> CommandKind {
        self.action.kind()
    }

    pub fn scheduled_time(&self) -> f64 {
        self.scheduled_time
    }

    pub fn is_executed(&self) -> bool {
        self.executed
    }

    pub fn origin_timeline(&self) -> TimelineId {
        self.origin_timeline
    }

    /// The live entity this command currently has in the world, if any
    pub fn spawned(&self) -> Option<EntityId> {
        self.spawned
    }

    /// Projectile payload, for one-shot spawn commands
    pub fn projectile(&self) -> Option<&ProjectileSpec> {
        match &self.action {
            CommandAction::SpawnProjectile(spec) => Some(spec),
            CommandAction::Move { .. } => None,
        }
    }

    /// Recorded position, for path commands
    pub fn move_pos(&self) -> Option<DVec2> {
        match &self.action {
            CommandAction::Move { pos } => Some(*pos),
            CommandAction::SpawnProjectile(_) => None,
        }
    }
}

/// Append-only record of every command ever issued, across all timelines
///
/// Entries are only ever added or filtered out; an entry's origin timeline is
/// fixed at insertion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandLog {
    commands: IndexMap<CommandId, ReversibleCommand>,
    next_id: u64,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new command and return its handle
    pub fn record(
        &mut self,
        issuer: EntityId,
        action: CommandAction,
        scheduled_time: f64,
        origin_timeline: TimelineId,
    ) -> CommandId {
        let id = CommandId::new(self.next_id);
        self.next_id += 1;
        self.commands.insert(
            id,
            ReversibleCommand::new(id, issuer, action, scheduled_time, origin_timeline),
        );
        id
    }

    pub fn get(&self, id: CommandId) -> Option<&ReversibleCommand> {
        self.commands.get(&id)
    }

    pub fn get_mut(&mut self, id: CommandId) -> Option<&mut ReversibleCommand> {
        self.commands.get_mut(&id)
    }

    /// Commands in the order they were issued
    pub fn iter(&self) -> impl Iterator<Item = &ReversibleCommand> {
        self.commands.values()
    }

    /// Handles of all commands, in the order they were issued
    pub fn ids(&self) -> impl Iterator<Item = CommandId> + '_ {
        self.commands.keys().copied()
    }

    /// Drop entries that fail `keep`; returns how many were dropped
    pub fn retain(&mut self, mut keep: impl FnMut(&ReversibleCommand) -> bool) -> usize {
        let before = self.commands.len();
        self.commands.retain(|_, cmd| keep(cmd));
        before - self.commands.len()
    }

    /// Path samples ghosted into `timeline`, grouped per issuer and sorted by time
    pub fn ghosted_paths(&self, timeline: TimelineId) -> IndexMap<EntityId, Vec<(f64, DVec2)>> {
        let mut paths: IndexMap<EntityId, Vec<(f64, DVec2)>> = IndexMap::new();
        for cmd in self.commands.values() {
            if !cmd.is_ghosted_in(timeline) {
                continue;
            }
            if let Some(pos) = cmd.move_pos() {
                paths
                    .entry(cmd.issuer())
                    .or_default()
                    .push((cmd.scheduled_time(), pos));
            }
        }
        for samples in paths.values_mut() {
            samples.sort_by(|a, b| a.0.total_cmp(&b.0));
        }
        paths
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

//! Timeline bookkeeping and the rewind charge pool
//!
//! A timeline id is minted as a candidate when a rewind ends. Ghosts are
//! registered against the candidate while the branch is being resolved; the
//! candidate is then either committed (at least one ghost, one charge spent)
//! or discarded (bookkeeping rolled back, nothing spent).
//!
//! A committed timeline stays active until every one of its ghost slots has
//! closed its replay window, at which point the charge is refunded.

use crate::{CommandId, EntityId, Error, Result, TimelineId};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Identity of one ghost within a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GhostKey {
    /// Replay of the projectile spawned by this command
    Projectile(CommandId),
    /// Replay of this actor's movement
    Path(EntityId),
}

/// What retiring a ghost slot did to its timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRetirement {
    /// The slot was not outstanding
    Unknown,
    /// Other slots of the timeline are still replaying
    Pending,
    /// That was the timeline's last slot; a charge was refunded
    TimelineRetired,
}

/// Owner of timeline ids, active-ghost counts and rewind charges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineManager {
    current: TimelineId,
    next: TimelineId,
    charges: u32,
    max_charges: u32,
    /// Outstanding ghost slots per timeline (candidate or committed)
    active: IndexMap<TimelineId, IndexSet<GhostKey>>,
}

impl TimelineManager {
    /// Start in the root timeline with a full charge pool
    pub fn new(max_charges: u32) -> Self {
        Self {
            current: TimelineId::ROOT,
            next: TimelineId::ROOT.successor(),
            charges: max_charges,
            max_charges,
            active: IndexMap::new(),
        }
    }

    /// Timeline the live actor is in
    pub fn current(&self) -> TimelineId {
        self.current
    }

    /// Next unused id; also the candidate for the next branch
    pub fn next(&self) -> TimelineId {
        self.next
    }

    pub fn charges(&self) -> u32 {
        self.charges
    }

    pub fn max_charges(&self) -> u32 {
        self.max_charges
    }

    pub fn has_charge(&self) -> bool {
        self.charges > 0
    }

    /// Branch gate: the actor stopped rewinding and a charge is available
    pub fn should_branch(&self, rewind_just_ended: bool) -> bool {
        rewind_just_ended && self.has_charge()
    }

    /// Every id minted so far, the root included
    pub fn known_timelines(&self) -> impl Iterator<Item = TimelineId> {
        (0..self.next.raw()).map(TimelineId::new)
    }

    /// Register a ghost slot against a candidate or committed timeline
    ///
    /// Returns `false` if the slot was already registered.
    pub fn register_ghost(&mut self, timeline: TimelineId, key: GhostKey) -> bool {
        self.active.entry(timeline).or_default().insert(key)
    }

    /// Roll back everything registered against an uncommitted candidate
    pub fn discard(&mut self, candidate: TimelineId) {
        self.active.shift_remove(&candidate);
    }

    /// Make `candidate` the current timeline and spend a charge
    pub fn commit(&mut self, candidate: TimelineId) -> Result<()> {
        if candidate != self.next {
            return Err(Error::invariant(format!(
                "cannot commit {}: next unused id is {}",
                candidate, self.next
            )));
        }
        if !self.active.get(&candidate).is_some_and(|slots| !slots.is_empty()) {
            return Err(Error::invariant(format!("cannot commit {} without ghosts", candidate)));
        }
        if self.charges == 0 {
            return Err(Error::NoRewindCharges);
        }
        self.current = candidate;
        self.next = candidate.successor();
        self.charges -= 1;
        Ok(())
    }

    /// Close one ghost slot; refunds a charge when the timeline empties
    pub fn retire_slot(&mut self, timeline: TimelineId, key: GhostKey) -> SlotRetirement {
        let Some(slots) = self.active.get_mut(&timeline) else {
            return SlotRetirement::Unknown;
        };
        if !slots.shift_remove(&key) {
            return SlotRetirement::Unknown;
        }
        if !slots.is_empty() {
            return SlotRetirement::Pending;
        }
        self.active.shift_remove(&timeline);
        self.charges = (self.charges + 1).min(self.max_charges);
        SlotRetirement::TimelineRetired
    }

    /// Outstanding slots of a timeline
    pub fn outstanding(&self, timeline: TimelineId) -> impl Iterator<Item = GhostKey> + '_ {
        self.active.get(&timeline).into_iter().flat_map(|slots| slots.iter().copied())
    }

    /// Timelines that still have ghosts replaying
    pub fn active_timelines(&self) -> impl Iterator<Item = TimelineId> + '_ {
        self.active.keys().copied()
    }

    /// Number of ghosts still outstanding in a timeline
    pub fn active_ghost_count(&self, timeline: TimelineId) -> usize {
        self.active.get(&timeline).map_or(0, IndexSet::len)
    }

    pub fn is_active(&self, timeline: TimelineId) -> bool {
        self.active.contains_key(&timeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projectile(n: u64) -> GhostKey {
        GhostKey::Projectile(CommandId::new(n))
    }

    #[test]
    fn test_initial_state() {
        let manager = TimelineManager::new(3);
        assert_eq!(manager.current(), TimelineId::ROOT);
        assert_eq!(manager.next(), TimelineId::new(1));
        assert_eq!(manager.charges(), 3);
        assert_eq!(manager.known_timelines().count(), 1);
    }

    #[test]
    fn test_should_branch_needs_charge() {
        let mut manager = TimelineManager::new(1);
        assert!(manager.should_branch(true));
        assert!(!manager.should_branch(false));

        let candidate = manager.next();
        manager.register_ghost(candidate, projectile(0));
        manager.commit(candidate).unwrap();
        assert!(!manager.should_branch(true));
    }

    #[test]
    fn test_commit_spends_charge() {
        let mut manager = TimelineManager::new(3);
        let candidate = manager.next();
        assert!(manager.register_ghost(candidate, projectile(0)));
        assert!(!manager.register_ghost(candidate, projectile(0)));
        manager.commit(candidate).unwrap();

        assert_eq!(manager.current(), candidate);
        assert_eq!(manager.next(), TimelineId::new(2));
        assert_eq!(manager.charges(), 2);
        assert_eq!(manager.active_ghost_count(candidate), 1);
    }

    #[test]
    fn test_commit_without_ghosts_rejected() {
        let mut manager = TimelineManager::new(3);
        let candidate = manager.next();
        assert!(manager.commit(candidate).unwrap_err().is_fatal());
        assert_eq!(manager.charges(), 3);
    }

    #[test]
    fn test_commit_without_charges_rejected() {
        let mut manager = TimelineManager::new(1);
        let first = manager.next();
        manager.register_ghost(first, projectile(0));
        manager.commit(first).unwrap();

        let second = manager.next();
        manager.register_ghost(second, projectile(1));
        assert_eq!(manager.commit(second), Err(Error::NoRewindCharges));
        assert_eq!(manager.current(), first);
    }

    #[test]
    fn test_discard_rolls_back() {
        let mut manager = TimelineManager::new(3);
        let candidate = manager.next();
        manager.register_ghost(candidate, projectile(0));
        manager.discard(candidate);

        assert!(!manager.is_active(candidate));
        assert_eq!(manager.next(), candidate);
        assert_eq!(manager.charges(), 3);
    }

    #[test]
    fn test_retire_refunds_on_last_slot() {
        let mut manager = TimelineManager::new(3);
        let candidate = manager.next();
        manager.register_ghost(candidate, projectile(0));
        manager.register_ghost(candidate, GhostKey::Path(EntityId::new(0)));
        manager.commit(candidate).unwrap();
        assert_eq!(manager.charges(), 2);

        assert_eq!(manager.retire_slot(candidate, projectile(0)), SlotRetirement::Pending);
        assert_eq!(manager.retire_slot(candidate, projectile(0)), SlotRetirement::Unknown);
        assert_eq!(manager.charges(), 2);

        assert_eq!(
            manager.retire_slot(candidate, GhostKey::Path(EntityId::new(0))),
            SlotRetirement::TimelineRetired
        );
        assert_eq!(manager.charges(), 3);
        assert!(!manager.is_active(candidate));
    }

    #[test]
    fn test_charge_conservation() {
        let mut manager = TimelineManager::new(2);
        let mut committed = Vec::new();
        for n in 0..2 {
            let candidate = manager.next();
            manager.register_ghost(candidate, projectile(n));
            manager.commit(candidate).unwrap();
            committed.push(candidate);
            let active = manager.active_timelines().count() as u32;
            assert!(manager.charges() + active <= manager.max_charges());
        }
        for (n, timeline) in committed.into_iter().enumerate() {
            manager.retire_slot(timeline, projectile(n as u64));
            let active = manager.active_timelines().count() as u32;
            assert!(manager.charges() + active <= manager.max_charges());
        }
        assert_eq!(manager.charges(), 2);
    }
}

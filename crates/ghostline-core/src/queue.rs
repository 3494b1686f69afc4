//! Per-entity command schedule with an execute/reverse cursor
//!
//! Entries are kept sorted by scheduled time. The cursor splits them in two:
//! everything before it has been executed, everything from it on is pending.
//! Each frame moves local time in one direction only, so the cursor is a
//! two-pointer scan rather than a re-evaluation of the whole queue.

use crate::{CommandId, Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct QueuedCommand {
    id: CommandId,
    scheduled_time: f64,
}

/// Sorted command handles plus the executed/pending cursor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandQueue {
    entries: Vec<QueuedCommand>,
    cursor: usize,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a command, keeping the queue sorted
    ///
    /// Commands sharing a scheduled time keep insertion order. A command that
    /// would land behind the cursor is rejected: it is already in the past.
    pub fn insert(&mut self, id: CommandId, scheduled_time: f64) -> Result<()> {
        let index = self
            .entries
            .partition_point(|e| e.scheduled_time <= scheduled_time);
        if index < self.cursor {
            return Err(Error::invariant(format!(
                "{} scheduled at {} lands behind executed commands",
                id, scheduled_time
            )));
        }
        self.entries.insert(index, QueuedCommand { id, scheduled_time });
        Ok(())
    }

    /// Next pending command if it is due at `local_time`
    pub fn next_due(&self, local_time: f64) -> Option<CommandId> {
        self.entries
            .get(self.cursor)
            .filter(|e| e.scheduled_time <= local_time)
            .map(|e| e.id)
    }

    /// Last executed command if `local_time` has moved back before it
    pub fn last_undone(&self, local_time: f64) -> Option<CommandId> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .filter(|e| e.scheduled_time > local_time)
            .map(|e| e.id)
    }

    /// Move the cursor past the command returned by `next_due`
    pub fn advance_cursor(&mut self) {
        self.cursor = (self.cursor + 1).min(self.entries.len());
    }

    /// Move the cursor back over the command returned by `last_undone`
    pub fn retreat_cursor(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Take a pending command out of the schedule
    ///
    /// Returns `Ok(false)` if the command is not queued here. Removing an
    /// executed command is an invariant violation.
    pub fn remove(&mut self, id: CommandId) -> Result<bool> {
        let Some(index) = self.entries.iter().position(|e| e.id == id) else {
            return Ok(false);
        };
        if index < self.cursor {
            return Err(Error::invariant(format!(
                "{} is executed and cannot leave the schedule",
                id
            )));
        }
        self.entries.remove(index);
        Ok(true)
    }

    /// Drop every command scheduled after `local_time`
    pub fn truncate_after(&mut self, local_time: f64) {
        let keep = self
            .entries
            .partition_point(|e| e.scheduled_time <= local_time);
        self.entries.truncate(keep);
        self.cursor = self.cursor.min(self.entries.len());
    }

    /// Handles in schedule order
    pub fn ids(&self) -> impl Iterator<Item = CommandId> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    /// Handles that have not been executed yet
    pub fn pending(&self) -> impl Iterator<Item = CommandId> + '_ {
        self.entries[self.cursor..].iter().map(|e| e.id)
    }

    pub fn contains(&self, id: CommandId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> CommandQueue {
        let mut queue = CommandQueue::new();
        queue.insert(CommandId::new(2), 2.0).unwrap();
        queue.insert(CommandId::new(0), 0.5).unwrap();
        queue.insert(CommandId::new(1), 1.0).unwrap();
        queue
    }

    #[test]
    fn test_insert_keeps_order() {
        let ids: Vec<_> = queue().ids().map(|id| id.raw()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_cursor_forward_and_back() {
        let mut queue = queue();
        let mut executed = Vec::new();
        while let Some(id) = queue.next_due(1.5) {
            executed.push(id.raw());
            queue.advance_cursor();
        }
        assert_eq!(executed, vec![0, 1]);
        assert_eq!(queue.cursor(), 2);

        let mut reversed = Vec::new();
        while let Some(id) = queue.last_undone(0.7) {
            reversed.push(id.raw());
            queue.retreat_cursor();
        }
        assert_eq!(reversed, vec![1]);
        assert_eq!(queue.cursor(), 1);
    }

    #[test]
    fn test_due_at_exact_time() {
        let queue = queue();
        assert_eq!(queue.next_due(0.5), Some(CommandId::new(0)));
        assert_eq!(queue.next_due(0.49), None);
    }

    #[test]
    fn test_insert_behind_cursor_rejected() {
        let mut queue = queue();
        queue.advance_cursor();
        queue.advance_cursor();
        assert!(queue.insert(CommandId::new(9), 0.1).is_err());
        queue.insert(CommandId::new(9), 1.5).unwrap();
        assert_eq!(queue.pending().map(|id| id.raw()).collect::<Vec<_>>(), vec![9, 2]);
    }

    #[test]
    fn test_remove_pending_only() {
        let mut queue = queue();
        queue.advance_cursor();
        assert!(queue.remove(CommandId::new(0)).is_err());
        assert!(queue.remove(CommandId::new(2)).unwrap());
        assert!(!queue.remove(CommandId::new(2)).unwrap());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_truncate_after() {
        let mut queue = queue();
        queue.advance_cursor();
        queue.truncate_after(1.0);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.cursor(), 1);

        queue.truncate_after(0.0);
        assert!(queue.is_empty());
        assert_eq!(queue.cursor(), 0);
    }
}

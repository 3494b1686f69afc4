//! Timeline branching on rewind resume
//!
//! When the actor stops rewinding, everything it did in the overwritten
//! timeline after its current local time is turned into ghosts of a fresh
//! candidate timeline. The candidate is committed only if at least one ghost
//! came out of it.

use crate::{
    command::CommandKind,
    timeline::GhostKey,
    world::World,
    CommandId, Error, Result, TimelineId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Result of resolving a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchOutcome {
    /// The candidate became the current timeline
    Committed { timeline: TimelineId, ghosts: usize },
    /// Nothing to replay; no id or charge was spent
    Discarded { candidate: TimelineId },
}

impl BranchOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, BranchOutcome::Committed { .. })
    }
}

impl World {
    /// Ghost the overwritten future and commit or discard the candidate
    pub fn resolve_branch(&mut self) -> Result<BranchOutcome> {
        let prev = self.timelines.current();
        let candidate = self.timelines.next();
        let local = self.player()?.local_time();

        let selected: Vec<CommandId> = self
            .log
            .iter()
            .filter(|cmd| {
                cmd.origin_timeline() == prev
                    && cmd.scheduled_time() > local
                    && !cmd.is_ghosted_in(candidate)
            })
            .map(|cmd| cmd.id())
            .collect();

        for id in selected {
            let cmd = self.log.get_mut(id).ok_or(Error::CommandNotFound(id))?;
            match cmd.kind() {
                CommandKind::OneShot => {
                    if cmd.is_executed() {
                        return Err(Error::invariant(format!(
                            "{} is in the overwritten future but still applied",
                            id
                        )));
                    }
                    cmd.mark_ghosted(candidate);
                    let issuer = cmd.issuer();
                    self.timelines.register_ghost(candidate, GhostKey::Projectile(id));
                    // Stays in the log for replay, but must not fire live again
                    if let Some(entity) = self.store.get_mut(issuer) {
                        entity.queue.remove(id)?;
                    }
                }
                CommandKind::Path => {
                    cmd.mark_ghosted(candidate);
                    let issuer = cmd.issuer();
                    self.timelines.register_ghost(candidate, GhostKey::Path(issuer));
                }
            }
        }

        let ghosts = self.timelines.active_ghost_count(candidate);
        if ghosts == 0 {
            self.timelines.discard(candidate);
            debug!(%candidate, local, "branch discarded: nothing to replay");
            return Ok(BranchOutcome::Discarded { candidate });
        }

        self.timelines.commit(candidate)?;
        self.prune_live_future(candidate, local)?;
        let global = self.clock.time;
        for window in self.ghost_windows(candidate) {
            if window.contains(global) && self.ghost(candidate, window.key).is_none() {
                self.materialize_ghost(candidate, &window);
            }
        }
        info!(
            timeline = %candidate,
            from = %prev,
            ghosts,
            charges = self.timelines.charges(),
            "timeline branch committed"
        );
        Ok(BranchOutcome::Committed {
            timeline: candidate,
            ghosts,
        })
    }

    /// Remove the live actor's leftover future after a commit
    fn prune_live_future(&mut self, committed: TimelineId, local: f64) -> Result<()> {
        let dropped = self.log.retain(|cmd| {
            !(cmd.kind() == CommandKind::Path
                && cmd.origin_timeline() == committed
                && cmd.scheduled_time() > local)
        });
        if dropped > 0 {
            debug!(dropped, "dropped stale path commands");
        }

        let player_id = self.player;
        let player = self
            .store
            .get_mut(player_id)
            .ok_or(Error::EntityNotFound(player_id))?;
        player.queue.truncate_after(local);
        let pos = player.pos;
        let state = player
            .as_player_mut()
            .ok_or_else(|| Error::invariant(format!("{} is not a player", player_id)))?;
        state.path.truncate_after(local);
        if state.path.is_empty() {
            state.path.add_step(local, pos)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        entity::EntityVariant, input::FrameInput, view::VariantTag, WorldConfig,
    };
    use glam::DVec2;

    const DT: f64 = 0.125;

    fn world() -> World {
        World::new(WorldConfig::default()).unwrap()
    }

    fn run(world: &mut World, frames: usize, input: FrameInput) -> Vec<crate::FrameReport> {
        (0..frames)
            .map(|_| world.step(DT, &input).unwrap())
            .collect()
    }

    /// Rewind for `frames` frames (the toggle frame included) and resume
    fn rewind_and_resume(world: &mut World, frames: usize) -> BranchOutcome {
        world.step(DT, &FrameInput::toggle_rewind()).unwrap();
        run(world, frames - 1, FrameInput::idle());
        let report = world.step(DT, &FrameInput::toggle_rewind()).unwrap();
        report.branch.unwrap()
    }

    fn ghost_projectiles(world: &World) -> Vec<(TimelineId, CommandId, f64)> {
        world
            .entities()
            .iter()
            .filter_map(|e| match &e.variant {
                EntityVariant::GhostProjectile(state) => {
                    Some((state.timeline, state.source, state.spawn_time))
                }
                _ => None,
            })
            .collect()
    }

    /// Fire at 1.0, play to 1.5, rewind to 0.5 and resume
    fn fire_and_rewind(world: &mut World) -> (CommandId, BranchOutcome) {
        run(world, 8, FrameInput::idle());
        let shot = world.shoot(DVec2::new(500.0, 300.0)).unwrap().unwrap();
        run(world, 4, FrameInput::idle());
        assert_eq!(world.entities().by_variant(VariantTag::Projectile).count(), 1);
        let outcome = rewind_and_resume(world, 8);
        (shot, outcome)
    }

    #[test]
    fn test_scenario_b_empty_rewind_discards() {
        let mut world = world();
        run(&mut world, 16, FrameInput::idle());
        let outcome = rewind_and_resume(&mut world, 16);

        assert_eq!(
            outcome,
            BranchOutcome::Discarded {
                candidate: TimelineId::new(1)
            }
        );
        assert_eq!(world.timelines().current(), TimelineId::ROOT);
        assert_eq!(world.timelines().next(), TimelineId::new(1));
        assert_eq!(world.timelines().charges(), 3);
        assert!(!world.timelines().is_active(TimelineId::new(1)));
    }

    #[test]
    fn test_scenario_c_shot_becomes_ghost() {
        let mut world = world();
        let (shot, outcome) = fire_and_rewind(&mut world);

        assert_eq!(
            outcome,
            BranchOutcome::Committed {
                timeline: TimelineId::new(1),
                ghosts: 1
            }
        );
        assert_eq!(world.timelines().current(), TimelineId::new(1));
        assert_eq!(world.timelines().charges(), 2);

        // The live projectile was reversed and the shot can no longer fire live
        assert_eq!(world.entities().by_variant(VariantTag::Projectile).count(), 0);
        assert!(!world.player().unwrap().queue.contains(shot));
        let cmd = world.log().get(shot).unwrap();
        assert!(cmd.is_ghosted_in(TimelineId::new(1)));
        assert_eq!(cmd.projectile().unwrap().velocity, DVec2::new(250.0, 0.0));

        // Nothing to replay yet at 0.625
        assert!(ghost_projectiles(&world).is_empty());

        // Playing on past the shot time replays it as a ghost, never live
        run(&mut world, 6, FrameInput::idle());
        assert_eq!(world.entities().by_variant(VariantTag::Projectile).count(), 0);
        let ghosts = ghost_projectiles(&world);
        assert_eq!(ghosts.len(), 1);
        let (timeline, source, spawn_time) = ghosts[0];
        assert_eq!(timeline, TimelineId::new(1));
        assert_eq!(source, shot);
        assert!((spawn_time - 1.01).abs() < 1e-12);

        let id = world.ghost(timeline, GhostKey::Projectile(shot)).unwrap();
        let ghost = world.entities().get(id).unwrap();
        assert_eq!(ghost.color, world.config().timeline_color(timeline));
        assert!(ghost.is_visible(world.global_time()));
    }

    #[test]
    fn test_scenario_d_last_ghost_refunds_charge() {
        let mut world = world();
        let (shot, _) = fire_and_rewind(&mut world);
        assert_eq!(world.timelines().charges(), 2);

        // Global time is 0.625; the ghost window is [1.01, 2.41)
        let reports = run(&mut world, 15, FrameInput::idle());
        let retired: Vec<TimelineId> = reports.into_iter().flat_map(|r| r.retired).collect();
        assert_eq!(retired, vec![TimelineId::new(1)]);

        assert_eq!(world.timelines().charges(), 3);
        assert!(!world.timelines().is_active(TimelineId::new(1)));
        assert!(ghost_projectiles(&world).is_empty());
        assert!(world.ghost(TimelineId::new(1), GhostKey::Projectile(shot)).is_none());
    }

    #[test]
    fn test_movement_after_resume_belongs_to_new_timeline() {
        let mut world = world();
        run(&mut world, 8, FrameInput::idle());
        world.shoot(DVec2::new(500.0, 300.0)).unwrap();
        run(&mut world, 4, FrameInput::idle());
        world.step(DT, &FrameInput::toggle_rewind()).unwrap();
        run(&mut world, 7, FrameInput::idle());
        let report = world
            .step(DT, &FrameInput::moving(DVec2::Y).with_rewind_toggle())
            .unwrap();
        assert!(report.branch.unwrap().is_committed());

        let moves: Vec<TimelineId> = world
            .log()
            .iter()
            .filter(|cmd| cmd.kind() == CommandKind::Path)
            .map(|cmd| cmd.origin_timeline())
            .collect();
        assert_eq!(moves, vec![TimelineId::new(1)]);
    }

    #[test]
    fn test_three_branches_ghost_each_command_once() {
        let mut world = world();

        // Timeline 0: shot `a`, ghosted into timeline 1
        let (a, outcome) = fire_and_rewind(&mut world);
        assert!(outcome.is_committed());
        assert_eq!(world.player().unwrap().local_time(), 0.625);

        // Timeline 1: shot `b` right away (rewound before the last shot)
        let b = world.shoot(DVec2::new(400.0, 400.0)).unwrap().unwrap();
        run(&mut world, 4, FrameInput::idle());
        let outcome = rewind_and_resume(&mut world, 5);
        assert_eq!(
            outcome,
            BranchOutcome::Committed {
                timeline: TimelineId::new(2),
                ghosts: 1
            }
        );

        // Timeline 2: shot `c` once the cooldown has passed
        run(&mut world, 2, FrameInput::idle());
        let c = world.shoot(DVec2::new(300.0, 300.0)).unwrap().unwrap();
        run(&mut world, 2, FrameInput::idle());
        let outcome = rewind_and_resume(&mut world, 4);
        assert_eq!(
            outcome,
            BranchOutcome::Committed {
                timeline: TimelineId::new(3),
                ghosts: 1
            }
        );

        let ghosted_into = |id: CommandId| -> Vec<TimelineId> {
            world.log().get(id).unwrap().ghosted_timelines().collect()
        };
        assert_eq!(ghosted_into(a), vec![TimelineId::new(1)]);
        assert_eq!(ghosted_into(b), vec![TimelineId::new(2)]);
        assert_eq!(ghosted_into(c), vec![TimelineId::new(3)]);

        // Earlier ghosts replay alongside the newest one
        run(&mut world, 3, FrameInput::idle());
        let mut timelines: Vec<TimelineId> =
            ghost_projectiles(&world).into_iter().map(|g| g.0).collect();
        timelines.sort();
        assert_eq!(
            timelines,
            vec![TimelineId::new(1), TimelineId::new(2), TimelineId::new(3)]
        );

        assert_eq!(world.timelines().current(), TimelineId::new(3));
        assert_eq!(world.timelines().charges(), 0);
        world.step(DT, &FrameInput::toggle_rewind()).unwrap();
        assert!(!world.is_rewinding());
    }
}

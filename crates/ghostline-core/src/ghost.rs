//! Ghost lifecycle
//!
//! Ghost windows are rebuilt from the command log every frame, so the set of
//! ghost entities is a pure function of the log and the global time. A ghost
//! exists only while the global time is inside its window and is removed
//! outside it. Closing a window also retires the ghost's slot in its
//! timeline, at most once.

use crate::{
    command::ProjectileSpec,
    entity::Entity,
    path::PathSample,
    timeline::{GhostKey, SlotRetirement},
    world::World,
    CommandId, EntityId, MovementPath, Result, TimelineId,
};
use tracing::{debug, info};

/// What a ghost replays
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GhostSource {
    Projectile {
        spec: ProjectileSpec,
        command: CommandId,
    },
    Path {
        path: MovementPath,
        issuer: EntityId,
    },
}

/// Global-time window `[start, end)` of one ghost slot
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GhostWindow {
    pub key: GhostKey,
    pub start: f64,
    pub end: f64,
    pub source: GhostSource,
}

impl GhostWindow {
    pub(crate) fn contains(&self, global_time: f64) -> bool {
        self.start <= global_time && global_time < self.end
    }

    fn is_closed(&self, global_time: f64) -> bool {
        global_time >= self.end
    }
}

impl World {
    /// Spawn and remove ghost entities for the current global time
    ///
    /// Returns the timelines whose last ghost closed this frame; each of
    /// them refunded one rewind charge.
    pub fn reconcile_ghosts(&mut self) -> Result<Vec<TimelineId>> {
        let global = self.clock.time;
        let mut retired = Vec::new();
        let timelines: Vec<TimelineId> = self.timelines.known_timelines().collect();

        for timeline in timelines {
            let windows = self.ghost_windows(timeline);
            for window in &windows {
                let slot = (timeline, window.key);
                if window.contains(global) {
                    if !self.ghosts.contains_key(&slot) {
                        self.materialize_ghost(timeline, window);
                    }
                } else if let Some(id) = self.ghosts.shift_remove(&slot) {
                    self.store.remove(id);
                    debug!(entity = %id, %timeline, "ghost removed");
                }
            }

            let outstanding: Vec<GhostKey> = self.timelines.outstanding(timeline).collect();
            for key in outstanding {
                let closed = windows
                    .iter()
                    .find(|w| w.key == key)
                    .map_or(true, |w| w.is_closed(global));
                if !closed {
                    continue;
                }
                if self.timelines.retire_slot(timeline, key) == SlotRetirement::TimelineRetired {
                    info!(
                        %timeline,
                        charges = self.timelines.charges(),
                        "timeline retired"
                    );
                    retired.push(timeline);
                }
            }
        }
        Ok(retired)
    }

    /// Rebuild every ghost window of a timeline from the log
    pub(crate) fn ghost_windows(&self, timeline: TimelineId) -> Vec<GhostWindow> {
        let mut windows = Vec::new();

        for (issuer, samples) in self.log.ghosted_paths(timeline) {
            let path = MovementPath::from_samples(
                samples
                    .into_iter()
                    .map(|(time, pos)| PathSample::new(time, pos))
                    .collect(),
            );
            let Some((start, end)) = path.window() else {
                continue;
            };
            windows.push(GhostWindow {
                key: GhostKey::Path(issuer),
                start,
                end,
                source: GhostSource::Path { path, issuer },
            });
        }

        for cmd in self.log.iter().filter(|cmd| cmd.is_ghosted_in(timeline)) {
            if let Some(spec) = cmd.projectile() {
                let start = cmd.scheduled_time();
                windows.push(GhostWindow {
                    key: GhostKey::Projectile(cmd.id()),
                    start,
                    end: start + spec.max_lifetime,
                    source: GhostSource::Projectile {
                        spec: *spec,
                        command: cmd.id(),
                    },
                });
            }
        }
        windows
    }

    /// Create the ghost entity for a window and index it by slot
    pub(crate) fn materialize_ghost(
        &mut self,
        timeline: TimelineId,
        window: &GhostWindow,
    ) -> Option<EntityId> {
        let color = self.config.timeline_color(timeline);
        let field = &self.field;
        let entity = match &window.source {
            GhostSource::Projectile { spec, command } => self.store.create_with(|id| {
                Entity::ghost_projectile(id, spec, window.start, timeline, *command, color)
            }),
            GhostSource::Path { path, issuer } => self.store.try_create_with(|id| {
                Entity::ghost_player(id, path.clone(), timeline, *issuer, color)
            })?,
        };
        entity.update(0.0, self.clock.time, self.clock.direction, field);
        let id = entity.id;
        self.ghosts.insert((timeline, window.key), id);
        debug!(entity = %id, %timeline, start = window.start, end = window.end, "ghost spawned");
        Some(id)
    }
}

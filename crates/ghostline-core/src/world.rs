//! The simulation world and its per-frame update loop
//!
//! A `World` owns every entity, the permanent command log, the dilation field
//! and the timeline bookkeeping. `step` runs one frame in a fixed order:
//!
//! 1. rewind toggle and field drift
//! 2. global clock
//! 3. every entity's local clock, position and command cursor
//! 4. not-yet-born check
//! 5. branch resolution on the first forward frame after a rewind
//! 6. ghost reconciliation
//! 7. movement and shooting intents, scheduled against the new state
//!
//! Branching lives in `branch.rs` and ghost bookkeeping in `ghost.rs`.

use crate::{
    branch::BranchOutcome,
    command::{CommandAction, CommandLog, ProjectileSpec},
    entity::{Entity, EntityStore},
    input::FrameInput,
    time::{Frame, GlobalClock},
    timeline::{GhostKey, TimelineManager},
    view::Hud,
    CommandId, CommandQueue, Direction, EntityId, EntityView, Error, Result, TimeField,
    TimelineId, WorldConfig,
};
use glam::DVec2;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

/// What the branch and ghost protocols did during one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Frame number after the step
    pub frame: Frame,
    /// Set on the first forward frame after a rewind
    pub branch: Option<BranchOutcome>,
    /// Timelines whose last ghost closed this frame
    pub retired: Vec<TimelineId>,
}

/// Aggregate of all simulation state
#[derive(Debug, Clone)]
pub struct World {
    pub(crate) config: WorldConfig,
    pub(crate) field: TimeField,
    pub(crate) clock: GlobalClock,
    pub(crate) store: EntityStore,
    pub(crate) log: CommandLog,
    pub(crate) player: EntityId,
    pub(crate) timelines: TimelineManager,
    /// Materialized ghost entities by timeline slot
    pub(crate) ghosts: IndexMap<(TimelineId, GhostKey), EntityId>,
}

impl World {
    /// Build a world with the player and timer grid in place
    pub fn new(config: WorldConfig) -> Result<Self> {
        config.validate()?;

        let mut store = EntityStore::new();
        let start = config.player.start;
        let player = store.create_with(|id| Entity::player(id, start)).id;
        let timers = config.timers.positions();
        for pos in &timers {
            store.create_with(|id| Entity::timer(id, *pos));
        }
        info!(
            %player,
            timers = timers.len(),
            charges = config.rewind.max_charges,
            "world created"
        );

        Ok(Self {
            field: TimeField::from_config(&config.field),
            clock: GlobalClock::new(),
            store,
            log: CommandLog::new(),
            player,
            timelines: TimelineManager::new(config.rewind.max_charges),
            ghosts: IndexMap::new(),
            config,
        })
    }

    /// Run one frame of `dt` real seconds
    pub fn step(&mut self, dt: f64, input: &FrameInput) -> Result<FrameReport> {
        if !(dt >= 0.0 && dt.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "frame dt must be a non-negative number, got {}",
                dt
            )));
        }

        if input.rewind_toggle {
            self.toggle_rewind()?;
        }
        let drift = input.field_drift.normalize_or_zero();
        if drift != DVec2::ZERO {
            self.field.translate(drift * self.config.field_drift_speed * dt);
        }

        self.clock.advance(dt);
        self.update_entities(dt)?;
        self.check_not_yet_born()?;

        let branch = if self.timelines.should_branch(self.clock.rewind_just_ended()) {
            Some(self.resolve_branch()?)
        } else {
            None
        };
        let retired = self.reconcile_ghosts()?;

        self.move_player(input.movement, dt)?;
        if let Some(target) = input.shoot_at {
            self.shoot(target)?;
        }

        self.clock.end_frame();
        trace!(frame = self.clock.frame, time = self.clock.time, "frame stepped");
        Ok(FrameReport {
            frame: self.clock.frame,
            branch,
            retired,
        })
    }

    /// Start rewinding; refused when no charge is left
    pub fn begin_rewind(&mut self) -> Result<()> {
        if self.clock.is_rewinding() {
            return Ok(());
        }
        if !self.timelines.has_charge() {
            return Err(Error::NoRewindCharges);
        }
        self.clock.direction = Direction::Rewinding;
        debug!(time = self.clock.time, charges = self.timelines.charges(), "rewind started");
        Ok(())
    }

    /// Resume forward time; the branch is resolved by the next `step`
    pub fn end_rewind(&mut self) {
        if self.clock.is_rewinding() {
            self.clock.direction = Direction::Forward;
            debug!(time = self.clock.time, "rewind ended");
        }
    }

    fn toggle_rewind(&mut self) -> Result<()> {
        if self.clock.is_rewinding() {
            self.end_rewind();
            return Ok(());
        }
        match self.begin_rewind() {
            Err(Error::NoRewindCharges) => {
                debug!("rewind refused: no charges left");
                Ok(())
            }
            other => other,
        }
    }

    /// Schedule a projectile aimed at `target`
    ///
    /// Returns `None` while rewinding or during the shot cooldown. The
    /// projectile spawns when the player's local clock reaches the scheduled
    /// time, not immediately.
    pub fn shoot(&mut self, target: DVec2) -> Result<Option<CommandId>> {
        if self.clock.is_rewinding() {
            return Ok(None);
        }
        let player_id = self.player;
        let player = self
            .store
            .get_mut(player_id)
            .ok_or(Error::EntityNotFound(player_id))?;
        let local = player.local_time();
        let origin = player.pos;
        let state = player
            .as_player_mut()
            .ok_or_else(|| Error::invariant(format!("{} is not a player", player_id)))?;
        if !can_shoot(state.last_shot, local, self.config.player.shoot_cooldown) {
            trace!(local, "shot on cooldown");
            return Ok(None);
        }
        state.last_shot = Some(local);

        let aim = target - origin;
        let velocity = DVec2::from_angle(aim.y.atan2(aim.x)) * self.config.player.projectile_speed;
        let spec = ProjectileSpec {
            origin,
            velocity,
            max_lifetime: self.config.projectile.max_lifetime,
            bake_step: self.config.projectile.bake_step,
            field: self.field,
        };
        let scheduled = local + self.config.player.shot_delay;
        let id = self.log.record(
            player_id,
            CommandAction::SpawnProjectile(spec),
            scheduled,
            self.timelines.current(),
        );
        player.queue.insert(id, scheduled)?;
        debug!(command = %id, scheduled, "shot scheduled");
        Ok(Some(id))
    }

    /// Record one frame of player movement
    ///
    /// Appends a path sample at `local_time + dt` and logs it as a path
    /// command. Returns `None` while rewinding or for a zero intent.
    pub fn move_player(&mut self, direction: DVec2, dt: f64) -> Result<Option<CommandId>> {
        let direction = direction.normalize_or_zero();
        if self.clock.is_rewinding() || direction == DVec2::ZERO || dt <= 0.0 {
            return Ok(None);
        }
        let player_id = self.player;
        let player = self
            .store
            .get_mut(player_id)
            .ok_or(Error::EntityNotFound(player_id))?;
        let local = player.local_time();
        let here = player.pos;
        let time = local + dt;
        let pos = here + direction * self.config.player.move_speed * dt;
        let state = player
            .as_player_mut()
            .ok_or_else(|| Error::invariant(format!("{} is not a player", player_id)))?;

        // Anchor the current position so interpolation starts from here
        state.path.truncate_from(local);
        state.path.add_step(local, here)?;
        state.path.add_step(time, pos)?;

        let id = self.log.record(
            player_id,
            CommandAction::Move { pos },
            time,
            self.timelines.current(),
        );
        Ok(Some(id))
    }

    fn update_entities(&mut self, dt: f64) -> Result<()> {
        let global = self.clock.time;
        let direction = self.clock.direction;
        let ids: Vec<EntityId> = self.store.ids().collect();
        for id in ids {
            // A reverse earlier in this pass may have removed it
            let Some(entity) = self.store.get_mut(id) else {
                continue;
            };
            entity.update(dt, global, direction, &self.field);
            if !entity.queue.is_empty() {
                self.run_cursor(id)?;
            }
        }
        Ok(())
    }

    /// Execute or reverse the commands an entity's clock crossed this frame
    fn run_cursor(&mut self, id: EntityId) -> Result<()> {
        let entity = self.store.get_mut(id).ok_or(Error::EntityNotFound(id))?;
        let local = entity.local_time();
        let mut queue = std::mem::take(&mut entity.queue);
        let result = self.drive_queue(&mut queue, local);
        if let Some(entity) = self.store.get_mut(id) {
            entity.queue = queue;
        }
        result
    }

    fn drive_queue(&mut self, queue: &mut CommandQueue, local: f64) -> Result<()> {
        match self.clock.direction {
            Direction::Forward => {
                while let Some(id) = queue.next_due(local) {
                    let cmd = self.log.get_mut(id).ok_or(Error::CommandNotFound(id))?;
                    if !cmd.execute(&mut self.store)? {
                        return Err(Error::invariant(format!(
                            "{} ahead of the cursor was already executed",
                            id
                        )));
                    }
                    queue.advance_cursor();
                    trace!(command = %id, local, "executed");
                }
            }
            Direction::Rewinding => {
                while let Some(id) = queue.last_undone(local) {
                    let cmd = self.log.get_mut(id).ok_or(Error::CommandNotFound(id))?;
                    if !cmd.reverse(&mut self.store)? {
                        return Err(Error::invariant(format!(
                            "{} behind the cursor was never executed",
                            id
                        )));
                    }
                    queue.retreat_cursor();
                    trace!(command = %id, local, "reversed");
                }
            }
        }
        Ok(())
    }

    /// Live clocks are floor-clamped, so a negative local time means the
    /// clock bookkeeping is broken
    fn check_not_yet_born(&self) -> Result<()> {
        match self
            .store
            .iter()
            .find(|e| !e.is_ghost() && e.local_time() < 0.0)
        {
            Some(entity) => Err(Error::invariant(format!(
                "{} has negative local time {}",
                entity.id,
                entity.local_time()
            ))),
            None => Ok(()),
        }
    }

    /// Render state of every entity
    pub fn view(&self) -> Vec<EntityView> {
        let global = self.clock.time;
        self.store.iter().map(|e| e.view(global)).collect()
    }

    /// Heads-up display values
    pub fn hud(&self) -> Hud {
        Hud {
            rewind_charges: self.timelines.charges(),
            max_charges: self.timelines.max_charges(),
            global_time: self.clock.time,
            current_timeline: self.timelines.current(),
            rewinding: self.clock.is_rewinding(),
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn field(&self) -> &TimeField {
        &self.field
    }

    /// The field may be moved or resized freely; such changes are not undoable
    pub fn field_mut(&mut self) -> &mut TimeField {
        &mut self.field
    }

    pub fn clock(&self) -> &GlobalClock {
        &self.clock
    }

    pub fn global_time(&self) -> f64 {
        self.clock.time
    }

    pub fn is_rewinding(&self) -> bool {
        self.clock.is_rewinding()
    }

    pub fn entities(&self) -> &EntityStore {
        &self.store
    }

    pub fn log(&self) -> &CommandLog {
        &self.log
    }

    pub fn timelines(&self) -> &TimelineManager {
        &self.timelines
    }

    pub fn player_id(&self) -> EntityId {
        self.player
    }

    pub fn player(&self) -> Result<&Entity> {
        self.store.get(self.player).ok_or(Error::EntityNotFound(self.player))
    }

    /// Ghost currently materialized for a timeline slot
    pub fn ghost(&self, timeline: TimelineId, key: GhostKey) -> Option<EntityId> {
        self.ghosts.get(&(timeline, key)).copied()
    }
}

/// Shots are rate-limited in local time; rewinding before the last shot
/// re-arms the player
fn can_shoot(last_shot: Option<f64>, local: f64, cooldown: f64) -> bool {
    match last_shot {
        None => true,
        Some(last) => local < last || local - last >= cooldown,
    }
}

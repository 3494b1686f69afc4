//! Entities: live actors, projectiles, timers and ghost replays

use crate::{
    command::ProjectileSpec, view::VariantTag, Color, CommandId, CommandQueue, Direction,
    EntityId, EntityView, LocalClock, MovementPath, TimeField, TimelineId,
};
use glam::DVec2;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The controlled actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Recorded trajectory, indexed by the player's local time
    pub path: MovementPath,
    /// Local time of the last shot
    pub last_shot: Option<f64>,
}

/// A live projectile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileState {
    pub spec: ProjectileSpec,
    /// Baked once at spawn, indexed by the projectile's local time
    pub path: MovementPath,
    /// Command that spawned it
    pub source: CommandId,
}

/// Replay of an actor's discarded movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GhostPlayerState {
    pub path: MovementPath,
    pub timeline: TimelineId,
    /// Actor whose moves this replays
    pub issuer: EntityId,
}

/// Replay of a discarded projectile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GhostProjectileState {
    pub path: MovementPath,
    /// Global time at which the projectile was fired
    pub spawn_time: f64,
    pub timeline: TimelineId,
    /// Command the replay was reconstructed from
    pub source: CommandId,
}

/// Closed set of entity variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityVariant {
    Player(PlayerState),
    Projectile(ProjectileState),
    Timer,
    GhostPlayer(GhostPlayerState),
    GhostProjectile(GhostProjectileState),
}

/// A simulated entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub pos: DVec2,
    pub color: Color,
    pub clock: LocalClock,
    /// Commands this entity executes against its own clock
    pub queue: CommandQueue,
    /// Local time at which the entity expires, if ever
    pub max_lifetime: Option<f64>,
    pub variant: EntityVariant,
}

impl Entity {
    fn with_variant(id: EntityId, pos: DVec2, color: Color, variant: EntityVariant) -> Self {
        Self {
            id,
            pos,
            color,
            clock: LocalClock::new(),
            queue: CommandQueue::new(),
            max_lifetime: None,
            variant,
        }
    }

    /// The controlled actor, with its path seeded at `pos`
    pub fn player(id: EntityId, pos: DVec2) -> Self {
        Self::with_variant(
            id,
            pos,
            Color::PLAYER,
            EntityVariant::Player(PlayerState {
                path: MovementPath::starting_at(0.0, pos),
                last_shot: None,
            }),
        )
    }

    /// A timer whose display value is its local time
    pub fn timer(id: EntityId, pos: DVec2) -> Self {
        Self::with_variant(id, pos, Color::TIMER, EntityVariant::Timer)
    }

    /// A live projectile, its path baked against `field`
    pub fn projectile(id: EntityId, spec: ProjectileSpec, source: CommandId) -> Self {
        let path = bake_projectile(&spec);
        let mut entity = Self::with_variant(
            id,
            spec.origin,
            Color::PROJECTILE,
            EntityVariant::Projectile(ProjectileState { spec, path, source }),
        );
        entity.max_lifetime = Some(spec.max_lifetime);
        entity
    }

    /// Replay of a discarded projectile fired at `spawn_time`
    pub fn ghost_projectile(
        id: EntityId,
        spec: &ProjectileSpec,
        spawn_time: f64,
        timeline: TimelineId,
        source: CommandId,
        color: Color,
    ) -> Self {
        let mut entity = Self::with_variant(
            id,
            spec.origin,
            color,
            EntityVariant::GhostProjectile(GhostProjectileState {
                path: bake_projectile(spec),
                spawn_time,
                timeline,
                source,
            }),
        );
        entity.max_lifetime = Some(spec.max_lifetime);
        entity
    }

    /// Replay of an actor's discarded movement
    ///
    /// Returns `None` for an empty path.
    pub fn ghost_player(
        id: EntityId,
        path: MovementPath,
        timeline: TimelineId,
        issuer: EntityId,
        color: Color,
    ) -> Option<Self> {
        let start = path.samples().first()?.pos;
        Some(Self::with_variant(
            id,
            start,
            color,
            EntityVariant::GhostPlayer(GhostPlayerState {
                path,
                timeline,
                issuer,
            }),
        ))
    }

    /// Advance the entity's clock and position by one frame
    ///
    /// Live entities run on their dilated local clock; ghosts are pinned to
    /// global time and ignore the field.
    pub fn update(&mut self, dt: f64, global_time: f64, direction: Direction, field: &TimeField) {
        match &mut self.variant {
            EntityVariant::Player(state) => {
                self.clock.advance(dt, field.factor(self.pos), direction);
                if let Some(pos) = state.path.get_pos(self.clock.time()) {
                    self.pos = pos;
                }
            }
            EntityVariant::Projectile(state) => {
                self.clock.advance(dt, field.factor(self.pos), direction);
                if let Some(pos) = state.path.get_pos(self.clock.time()) {
                    self.pos = pos;
                }
            }
            EntityVariant::Timer => {
                self.clock.advance(dt, field.factor(self.pos), direction);
            }
            EntityVariant::GhostPlayer(state) => {
                self.clock.set(global_time);
                if let Some(pos) = state.path.get_pos(global_time) {
                    self.pos = pos;
                }
            }
            EntityVariant::GhostProjectile(state) => {
                self.clock.set(global_time - state.spawn_time);
                if let Some(pos) = state.path.get_pos(self.clock.time()) {
                    self.pos = pos;
                }
            }
        }
    }

    pub fn local_time(&self) -> f64 {
        self.clock.time()
    }

    /// Outside its valid local-time window
    pub fn is_dead(&self) -> bool {
        let local = self.local_time();
        local < 0.0 || self.max_lifetime.is_some_and(|max| local >= max)
    }

    pub fn is_ghost(&self) -> bool {
        self.tag().is_ghost()
    }

    /// Global time at which a ghost's replay starts
    pub fn spawn_time(&self) -> Option<f64> {
        match &self.variant {
            EntityVariant::GhostProjectile(state) => Some(state.spawn_time),
            EntityVariant::GhostPlayer(state) => state.path.window().map(|(start, _)| start),
            _ => None,
        }
    }

    /// Timeline a ghost belongs to
    pub fn timeline(&self) -> Option<TimelineId> {
        match &self.variant {
            EntityVariant::GhostProjectile(state) => Some(state.timeline),
            EntityVariant::GhostPlayer(state) => Some(state.timeline),
            _ => None,
        }
    }

    /// Whether a renderer should draw this entity at `global_time`
    pub fn is_visible(&self, global_time: f64) -> bool {
        match &self.variant {
            EntityVariant::GhostProjectile(state) => {
                global_time >= state.spawn_time && !self.is_dead()
            }
            EntityVariant::GhostPlayer(_) => {
                self.spawn_time().is_some_and(|start| global_time >= start)
            }
            EntityVariant::Projectile(_) => !self.is_dead(),
            EntityVariant::Player(_) | EntityVariant::Timer => true,
        }
    }

    pub fn tag(&self) -> VariantTag {
        match &self.variant {
            EntityVariant::Player(_) => VariantTag::Player,
            EntityVariant::Projectile(_) => VariantTag::Projectile,
            EntityVariant::Timer => VariantTag::Timer,
            EntityVariant::GhostPlayer(_) => VariantTag::GhostPlayer,
            EntityVariant::GhostProjectile(_) => VariantTag::GhostProjectile,
        }
    }

    pub fn as_player(&self) -> Option<&PlayerState> {
        match &self.variant {
            EntityVariant::Player(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.variant {
            EntityVariant::Player(state) => Some(state),
            _ => None,
        }
    }

    /// Render state at `global_time`
    pub fn view(&self, global_time: f64) -> EntityView {
        EntityView {
            id: self.id,
            variant: self.tag(),
            pos: self.pos,
            color: self.color,
            visible: self.is_visible(global_time),
            timeline: self.timeline(),
            label: matches!(self.variant, EntityVariant::Timer).then(|| self.local_time()),
        }
    }
}

fn bake_projectile(spec: &ProjectileSpec) -> MovementPath {
    let mut path = MovementPath::starting_at(0.0, spec.origin);
    path.ensure_path(
        spec.max_lifetime,
        spec.bake_step,
        spec.origin,
        spec.velocity,
        &spec.field,
    );
    path
}

/// Storage for all entities in the world
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityStore {
    /// All entities by ID, in spawn order
    entities: IndexMap<EntityId, Entity>,
    /// Next entity ID to assign
    next_id: u64,
}

impl EntityStore {
    /// Create a new empty entity store
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an entity around a freshly assigned ID and add it to the store
    pub fn create_with(&mut self, build: impl FnOnce(EntityId) -> Entity) -> &mut Entity {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.entities.entry(id).or_insert(build(id))
    }

    /// Like `create_with`, but the builder may decline; no ID is consumed then
    pub fn try_create_with(
        &mut self,
        build: impl FnOnce(EntityId) -> Option<Entity>,
    ) -> Option<&mut Entity> {
        let id = EntityId::new(self.next_id);
        let entity = build(id)?;
        self.next_id += 1;
        Some(self.entities.entry(id).or_insert(entity))
    }

    /// Get an entity by ID
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Remove an entity
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.shift_remove(&id)
    }

    /// Drop every entity failing `keep`; returns the removed IDs
    pub fn retain(&mut self, mut keep: impl FnMut(&Entity) -> bool) -> Vec<EntityId> {
        let mut removed = Vec::new();
        self.entities.retain(|id, entity| {
            let kept = keep(entity);
            if !kept {
                removed.push(*id);
            }
            kept
        });
        removed
    }

    /// Get all entities of a given variant
    pub fn by_variant(&self, tag: VariantTag) -> impl Iterator<Item = &Entity> {
        self.entities.values().filter(move |e| e.tag() == tag)
    }

    /// Get all entity IDs
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Get all entities
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Get the number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

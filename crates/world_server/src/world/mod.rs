//! # World Context
//!
//! [`World`] owns every live object, the octree indexing the visible ones,
//! the teleport anchors, the pathfinder and the scheduled-effect heap. All
//! mutation goes through `&mut World`, so whoever holds the world lock is the
//! only writer; the scheduler and the ingress handlers share the same
//! primitives.
//!
//! Mutations never publish directly. They record [`Notification`]s into an
//! outbox which the caller drains with [`World::drain_outbox`] after
//! releasing the lock, so dispatch backpressure is never felt while the
//! world is locked.
//!
//! ## Submodules
//!
//! - `interest` - neighbor sets and the relocation diff
//! - `npc` - respawn, patrol and combat passes
//! - `timers` - variation and destroy passes
//! - `actions` - player ingress
//! - `players` - connect / disconnect
//! - `level` - bootstrap from a level description

mod actions;
mod effects;
mod interest;
mod level;
mod npc;
mod players;
mod timers;

pub use actions::Action;
pub use effects::{Effect, EffectQueue};
pub use level::{LevelDescription, LevelObject, LevelTeleport, LevelWaypoint};

use crate::config::WorldConfig;
use crate::error::WorldError;
use crate::object::GameObject;
use crate::pathfinding::PathFinder;
use crate::spatial::{Bounds, Octree, OctreeStats};
use crate::SimTime;
use meridian_event_system::{Notification, ObjectId, ObjectRole, Payload, Vector3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, trace};

/// Named spawn location. The `main` anchor is where players enter the world.
#[derive(Debug, Clone, PartialEq)]
pub struct TeleportAnchor {
    pub name: String,
    pub position: Vector3,
    pub rotation: Vector3,
}

/// Snapshot of world counters for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldStats {
    pub now: SimTime,
    pub ticks: u64,
    pub objects: usize,
    pub players: usize,
    pub npcs: usize,
    pub pending_effects: usize,
    pub pending_notifications: usize,
    pub octree: OctreeStats,
}

pub struct World {
    config: WorldConfig,
    octree: Octree<ObjectId>,
    // Ordered so tick passes visit objects deterministically
    objects: BTreeMap<ObjectId, GameObject>,
    teleports: HashMap<String, TeleportAnchor>,
    pathfinder: Arc<dyn PathFinder>,
    rng: StdRng,
    effects: EffectQueue,
    outbox: Vec<Notification>,
    now: SimTime,
    ticks: u64,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("objects", &self.objects.len())
            .field("now", &self.now)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

impl World {
    pub fn new(config: WorldConfig, bounds: Bounds, pathfinder: Arc<dyn PathFinder>) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            octree: Octree::new(bounds),
            objects: BTreeMap::new(),
            teleports: HashMap::new(),
            pathfinder,
            rng,
            effects: EffectQueue::new(),
            outbox: Vec::new(),
            now: 0,
            ticks: 0,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Moves the simulation clock forward; the clock never runs backwards.
    pub fn advance_to(&mut self, now: SimTime) {
        self.now = self.now.max(now);
    }

    pub fn bounds(&self) -> Bounds {
        self.octree.bounds()
    }

    pub fn object(&self, id: &ObjectId) -> Option<&GameObject> {
        self.objects.get(id)
    }

    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn add_teleport(&mut self, name: impl Into<String>, position: Vector3, rotation: Vector3) {
        let name = name.into();
        self.teleports.insert(
            name.clone(),
            TeleportAnchor {
                name,
                position,
                rotation,
            },
        );
    }

    pub fn find_teleport(&self, name: &str) -> Result<&TeleportAnchor, WorldError> {
        self.teleports
            .get(name)
            .ok_or_else(|| WorldError::TeleportNotFound(name.to_string()))
    }

    /// Registers an object, indexes it and refreshes the interest sets around it.
    pub fn insert(&mut self, mut object: GameObject) -> Result<ObjectId, WorldError> {
        let id = object.id.clone();
        object.node = Some(self.octree.add(id.clone(), object.position.to_array())?);
        trace!("Inserted {} ({}) at {:?}", id, object.role, object.position);
        self.objects.insert(id.clone(), object);
        self.recompute_neighbors_of_nearby(&id);
        Ok(id)
    }

    /// Drops an object from the octree and the registry.
    pub fn remove(&mut self, id: &ObjectId) -> Option<GameObject> {
        self.hide(id);
        let object = self.objects.remove(id)?;
        debug!("Removed {} ({})", id, object.role);
        Some(object)
    }

    /// Takes an object out of the octree but keeps it registered.
    ///
    /// Hidden objects are not anyone's neighbor until shown again.
    pub fn hide(&mut self, id: &ObjectId) -> bool {
        let Some(object) = self.objects.get_mut(id) else {
            return false;
        };
        let Some(handle) = object.node.take() else {
            return false;
        };
        let former = std::mem::take(&mut object.neighbors);
        self.octree.remove(id, Some(handle));
        for neighbor in &former {
            self.recompute_neighbors(neighbor);
        }
        true
    }

    /// Re-indexes a hidden object at its current position.
    pub fn show(&mut self, id: &ObjectId) -> Result<(), WorldError> {
        let object = self
            .objects
            .get_mut(id)
            .ok_or_else(|| WorldError::NotFound(id.clone()))?;
        if object.node.is_none() {
            object.node = Some(self.octree.add(id.clone(), object.position.to_array())?);
        }
        self.recompute_neighbors_of_nearby(id);
        Ok(())
    }

    /// Queues an effect to run on the first tick at or after `due`.
    pub fn schedule(&mut self, due: SimTime, effect: Effect) {
        self.effects.schedule(due, effect);
    }

    pub(crate) fn emit(&mut self, recipients: Vec<ObjectId>, payload: impl Into<Payload>) {
        if recipients.is_empty() {
            return;
        }
        self.outbox.push(Notification::new(recipients, payload));
    }

    /// Notifications recorded since the last drain.
    pub fn pending_notifications(&self) -> &[Notification] {
        &self.outbox
    }

    pub fn drain_outbox(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    /// Requests a path for `id` to the given ground position.
    ///
    /// On failure the current path is left empty.
    pub(crate) fn set_destination(&mut self, id: &ObjectId, x: f64, z: f64) -> Result<(), WorldError> {
        let object = self
            .objects
            .get_mut(id)
            .ok_or_else(|| WorldError::NotFound(id.clone()))?;
        object.path.clear();
        match self
            .pathfinder
            .find_path(object.position.x, object.position.z, x, z)
        {
            Ok(path) => {
                object.path = path.into();
                Ok(())
            }
            Err(e) => {
                trace!("No path for {} to ({}, {}): {}", id, x, z, e);
                Err(e.into())
            }
        }
    }

    /// Runs one simulation step at time `now`.
    ///
    /// Due effects fire first, then respawn, patrol, combat, variation and
    /// destroy passes, in that order.
    pub fn tick(&mut self, now: SimTime) {
        self.advance_to(now);
        self.ticks += 1;
        self.apply_due_effects();
        self.respawn_pass();
        self.walk_pass();
        self.attack_pass();
        self.variation_pass();
        self.destroy_pass();
    }

    fn ids_with_role(&self, role: ObjectRole) -> Vec<ObjectId> {
        self.objects
            .values()
            .filter(|o| o.role == role)
            .map(|o| o.id.clone())
            .collect()
    }

    pub fn stats(&self) -> WorldStats {
        let count = |role: ObjectRole| self.objects.values().filter(|o| o.role == role).count();
        WorldStats {
            now: self.now,
            ticks: self.ticks,
            objects: self.objects.len(),
            players: count(ObjectRole::Player),
            npcs: count(ObjectRole::Npc),
            pending_effects: self.effects.len(),
            pending_notifications: self.outbox.len(),
            octree: self.octree.stats(),
        }
    }

    #[cfg(test)]
    pub(crate) fn object_mut(&mut self, id: &ObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(id)
    }
}

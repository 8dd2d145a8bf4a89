//! Interest management.
//!
//! An object's neighbors are every indexed object inside the cube of
//! half-size `interest_radius` around it. Neighbor sets are rebuilt from
//! scratch on every recomputation; they drive both NPC targeting and who is
//! told about an object's changes.

use super::World;
use crate::error::WorldError;
use crate::spatial::{Bounds, OctreeError};
use meridian_event_system::{DestroyObject, ObjectId, ObjectRole, Spawn, Vector3};
use tracing::trace;

/// Roles whose appearance and disappearance clients are told about.
fn is_announced(role: ObjectRole) -> bool {
    matches!(role, ObjectRole::Player | ObjectRole::Npc | ObjectRole::Loot)
}

impl World {
    fn elements_around(&self, center: Vector3, half_size: f64) -> Vec<ObjectId> {
        self.octree.elements_in(&Bounds::around(center, half_size))
    }

    /// Replaces the neighbor set of `id` with a fresh octree query.
    ///
    /// Hidden objects end up with an empty set. Returns false only when `id`
    /// is not registered.
    pub fn recompute_neighbors(&mut self, id: &ObjectId) -> bool {
        let Some(object) = self.objects.get_mut(id) else {
            return false;
        };
        if !object.is_visible() {
            object.neighbors.clear();
            return true;
        }
        let position = object.position;
        let mut neighbors = self.elements_around(position, self.config.interest_radius);
        neighbors.retain(|n| n != id);
        neighbors.sort_unstable();

        if let Some(object) = self.objects.get_mut(id) {
            object.neighbors = neighbors;
        }
        true
    }

    /// Recomputes the neighbor set of every object inside the interest cube of `id`.
    pub fn recompute_neighbors_of_nearby(&mut self, id: &ObjectId) {
        let Some(position) = self.objects.get(id).map(|o| o.position) else {
            return;
        };
        let nearby = self.elements_around(position, self.config.interest_radius);
        for other in &nearby {
            self.recompute_neighbors(other);
        }
        if !nearby.contains(id) {
            self.recompute_neighbors(id);
        }
    }

    /// Indexed players inside the cube of half-size `radius` around `center`.
    pub fn players_in_radius(&self, center: Vector3, radius: f64) -> Vec<ObjectId> {
        let mut players: Vec<ObjectId> = self
            .elements_around(center, radius)
            .into_iter()
            .filter(|id| self.objects.get(id).is_some_and(|o| o.is_player()))
            .collect();
        players.sort_unstable();
        players
    }

    /// Players that must hear about changes to `id`, from a refreshed neighbor set.
    pub(crate) fn observers(&mut self, id: &ObjectId) -> Vec<ObjectId> {
        self.recompute_neighbors(id);
        self.objects
            .get(id)
            .map(|object| {
                object
                    .neighbors
                    .iter()
                    .filter(|n| self.objects.get(*n).is_some_and(|o| o.is_player()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// [`World::observers`] plus the subject itself when it is a player.
    pub(crate) fn observers_and_self(&mut self, id: &ObjectId) -> Vec<ObjectId> {
        let mut recipients = self.observers(id);
        if self.objects.get(id).is_some_and(|o| o.is_player()) {
            recipients.push(id.clone());
        }
        recipients
    }

    /// Moves an indexed object and reconciles the interest sets it touched.
    ///
    /// Hidden objects only have their position updated.
    pub(crate) fn relocate(&mut self, id: &ObjectId, position: Vector3) -> Result<(), WorldError> {
        let point = position.to_array();
        if !self.octree.bounds().contains_point(&point) {
            return Err(OctreeError::OutOfBounds(point[0], point[1], point[2]).into());
        }
        let object = self
            .objects
            .get_mut(id)
            .ok_or_else(|| WorldError::NotFound(id.clone()))?;
        object.position = position;
        let Some(handle) = object.node.take() else {
            return Ok(());
        };
        let previous = object.neighbors.clone();

        self.octree.remove(id, Some(handle));
        let node = self.octree.add(id.clone(), point)?;
        if let Some(object) = self.objects.get_mut(id) {
            object.node = Some(node);
        }
        self.recompute_neighbors(id);
        self.apply_interest_diff(id, &previous);
        Ok(())
    }

    /// Exchanges spawn/destroy notifications for neighbors gained or lost by `id`.
    fn apply_interest_diff(&mut self, id: &ObjectId, previous: &[ObjectId]) {
        let Some(mover) = self.objects.get(id) else {
            return;
        };
        let mover_is_player = mover.is_player();
        let current = mover.neighbors.clone();
        let mover_snapshot = mover.snapshot(false);

        for other_id in current.iter().filter(|n| !previous.contains(n)) {
            let Some(other) = self.objects.get(other_id) else {
                continue;
            };
            if !is_announced(other.role) {
                continue;
            }
            let other_is_player = other.is_player();
            let refresh = other_is_player || other.is_npc();
            let other_snapshot = mover_is_player.then(|| other.snapshot(false));

            trace!("{} gained neighbor {}", id, other_id);
            if other_is_player {
                self.emit(vec![other_id.clone()], Spawn::Object(mover_snapshot.clone()));
            }
            if let Some(snapshot) = other_snapshot {
                self.emit(vec![id.clone()], Spawn::Object(snapshot));
            }
            if refresh {
                self.recompute_neighbors(other_id);
            }
        }

        for other_id in previous.iter().filter(|n| !current.contains(n)) {
            let Some(other) = self.objects.get(other_id) else {
                continue;
            };
            if !is_announced(other.role) {
                continue;
            }
            let other_is_player = other.is_player();
            let refresh = other_is_player || other.is_npc();

            trace!("{} lost neighbor {}", id, other_id);
            if other_is_player {
                self.emit(
                    vec![other_id.clone()],
                    DestroyObject {
                        object_id: id.clone(),
                    },
                );
            }
            if mover_is_player {
                self.emit(
                    vec![id.clone()],
                    DestroyObject {
                        object_id: other_id.clone(),
                    },
                );
            }
            if refresh {
                self.recompute_neighbors(other_id);
            }
        }
    }
}

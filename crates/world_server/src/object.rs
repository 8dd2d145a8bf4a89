//! Live world objects.
//!
//! A [`GameObject`] pairs an instantiated [`Entity`] with everything the
//! simulation tracks per object: transforms, the octree handle, the interest
//! set, patrol/combat scratch state and timed transitions. Objects never
//! reference each other directly; relations are by [`ObjectId`] and resolved
//! through the world registry.

use crate::entity::{secs_to_ms, Entity};
use crate::spatial::NodeHandle;
use crate::SimTime;
use meridian_event_system::{ObjectId, ObjectRole, ObjectSnapshot, VariationState, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Kind tag a level assigns to placed objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    #[default]
    None,
    Npc,
    Teleport,
    Tree,
    Ore,
}

/// Patrol waypoint on the ground plane with the yaw to face on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub z: f64,
    pub rot_y: f64,
}

impl Waypoint {
    pub const fn new(x: f64, z: f64, rot_y: f64) -> Self {
        Self { x, z, rot_y }
    }
}

/// Pending switch to another variation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NextVariation {
    pub variation_index: i32,
    pub at: SimTime,
    pub reset_health: bool,
}

/// Behavior state of an NPC, derived from its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcState {
    Patrol,
    Pursuing,
    Attacking,
    Returning,
    Dead,
}

/// Result of advancing an object along its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// No path, or the step deadline has not elapsed
    Idle,
    Moved,
    /// Moved onto the last node
    Finished,
}

#[derive(Debug, Clone)]
pub struct GameObject {
    pub id: ObjectId,
    pub entity: Entity,
    pub kind: ObjectKind,
    pub role: ObjectRole,
    pub position: Vector3,
    pub rotation: Vector3,
    pub spawn_position: Vector3,
    pub spawn_rotation: Vector3,
    pub variation_index: i32,

    pub(crate) node: Option<NodeHandle>,
    pub(crate) neighbors: Vec<ObjectId>,

    pub waypoints: Vec<Waypoint>,
    pub path: VecDeque<Vector3>,
    pub path_target_angle: Option<f64>,
    pub next_step_at: Option<SimTime>,
    pub next_destination_at: Option<SimTime>,

    pub attack_target: Option<ObjectId>,
    /// Where the target stood when last faced
    pub target_position: Option<Vector3>,
    pub attack_attempts: u32,
    pub returning: bool,
    pub current_animation: Option<String>,
    pub next_attack_at: Option<SimTime>,

    pub next_respawn_at: Option<SimTime>,
    pub next_variation: Option<NextVariation>,
    pub destroy_at: Option<SimTime>,
    pub next_transform_at: Option<SimTime>,
}

impl GameObject {
    pub fn new(id: ObjectId, entity: Entity, role: ObjectRole, position: Vector3, rotation: Vector3) -> Self {
        Self {
            id,
            entity: entity.instantiate(),
            kind: ObjectKind::None,
            role,
            position,
            rotation,
            spawn_position: position,
            spawn_rotation: rotation,
            variation_index: 0,
            node: None,
            neighbors: Vec::new(),
            waypoints: Vec::new(),
            path: VecDeque::new(),
            path_target_angle: None,
            next_step_at: None,
            next_destination_at: None,
            attack_target: None,
            target_position: None,
            attack_attempts: 0,
            returning: false,
            current_animation: None,
            next_attack_at: None,
            next_respawn_at: None,
            next_variation: None,
            destroy_at: None,
            next_transform_at: None,
        }
    }

    /// NPC patrolling its spawn point plus `extra` waypoints.
    pub fn npc(entity: Entity, position: Vector3, rotation: Vector3, extra: &[Waypoint]) -> Self {
        let mut npc = Self::new(ObjectId::generate(), entity, ObjectRole::Npc, position, rotation);
        npc.kind = ObjectKind::Npc;
        npc.waypoints.push(Waypoint::new(position.x, position.z, rotation.y));
        npc.waypoints.extend(
            extra
                .iter()
                .map(|wp| Waypoint::new(wp.x, wp.z, 0.0)),
        );
        npc
    }

    pub fn player(id: ObjectId, entity: Entity, position: Vector3, rotation: Vector3) -> Self {
        Self::new(id, entity, ObjectRole::Player, position, rotation)
    }

    pub fn is_player(&self) -> bool {
        self.role == ObjectRole::Player
    }

    pub fn is_npc(&self) -> bool {
        self.role == ObjectRole::Npc
    }

    pub fn is_dead(&self) -> bool {
        self.entity.is_dead()
    }

    /// Whether the object is currently indexed by the octree.
    pub fn is_visible(&self) -> bool {
        self.node.is_some()
    }

    /// Interest set as of the last recomputation.
    pub fn neighbors(&self) -> &[ObjectId] {
        &self.neighbors
    }

    pub fn attack_range(&self) -> Option<f64> {
        self.entity.attack_range()
    }

    pub fn attack_max_damage(&self) -> Option<i32> {
        self.entity.attack_max_damage()
    }

    pub fn attack_speed(&self) -> Option<f64> {
        self.entity.attack_speed()
    }

    /// Applies damage and, on death, the follow-up the object's role needs.
    ///
    /// Returns true when this hit killed the object.
    pub fn take_damage(&mut self, amount: i32, now: SimTime) -> bool {
        let was_alive = !self.is_dead();
        self.entity.take_damage(amount);
        if !(was_alive && self.is_dead()) {
            return false;
        }
        if self.is_npc() {
            self.release_attack();
            self.path.clear();
            self.next_step_at = None;
            self.returning = false;
            self.current_animation = None;
            self.schedule_respawn(now);
        }
        true
    }

    /// NPCs come back at their spawn point; scenery flips back to variation 0.
    pub fn schedule_respawn(&mut self, now: SimTime) {
        let at = now + self.entity.respawn_interval * 1000;
        if self.is_npc() {
            if self.entity.respawn_interval > 0 {
                self.next_respawn_at = Some(at);
            }
        } else {
            self.next_variation = Some(NextVariation {
                variation_index: 0,
                at,
                reset_health: true,
            });
        }
    }

    pub fn release_attack(&mut self) {
        self.attack_target = None;
        self.target_position = None;
        self.attack_attempts = 0;
    }

    /// Turns to face `target` on the yaw axis and returns the new rotation.
    pub fn look_at(&mut self, target: Vector3) -> Vector3 {
        let dx = target.x - self.position.x;
        let dz = target.z - self.position.z;
        if dx != 0.0 || dz != 0.0 {
            self.rotation.y = dx.atan2(dz).to_degrees();
        }
        self.rotation
    }

    /// Random waypoint other than the one the object stands on, snapped to the grid.
    pub fn next_random_waypoint(&self, rng: &mut impl Rng) -> Option<Waypoint> {
        let here = (self.position.x.floor(), self.position.z.floor());
        let candidates: Vec<&Waypoint> = self
            .waypoints
            .iter()
            .filter(|wp| (wp.x.floor(), wp.z.floor()) != here)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let wp = candidates[rng.gen_range(0..candidates.len())];
        Some(Waypoint::new(wp.x.floor(), wp.z.floor(), wp.rot_y))
    }

    /// First waypoint at spawn height.
    pub fn spawn_point(&self) -> Vector3 {
        self.waypoints.first().map_or(self.spawn_position, |wp| {
            Vector3::new(wp.x, self.spawn_position.y, wp.z)
        })
    }

    /// Clears the step deadline and picks when the next patrol leg starts.
    pub fn set_next_travel_time(&mut self, now: SimTime, rng: &mut impl Rng, min_s: u64, max_s: u64) {
        self.next_step_at = None;
        let delay_s = if max_s > min_s {
            rng.gen_range(min_s..max_s)
        } else {
            min_s
        };
        self.next_destination_at = Some(now + delay_s * 1000);
    }

    /// Moves onto the next path node once the step deadline has elapsed.
    ///
    /// The following step is due after the time needed to cover the distance
    /// to the node after this one at the entity's speed, minus `allowance_ms`.
    pub fn step_along_path(&mut self, now: SimTime, allowance_ms: u64) -> StepOutcome {
        if self.path.is_empty() || self.next_step_at.is_some_and(|due| now < due) {
            return StepOutcome::Idle;
        }
        let Some(node) = self.path.pop_front() else {
            return StepOutcome::Idle;
        };

        self.look_at(node);
        self.position = node;

        match self.path.front() {
            Some(next) => {
                let dx = next.x - node.x;
                let dz = next.z - node.z;
                let distance = (dx * dx + dz * dz).sqrt();
                let speed = self.entity.speed as f64;
                let step_ms = if speed > 0.0 {
                    secs_to_ms(distance / speed).saturating_sub(allowance_ms)
                } else {
                    0
                };
                self.next_step_at = Some(now + step_ms);
                StepOutcome::Moved
            }
            None => {
                if let Some(angle) = self.path_target_angle.take() {
                    self.rotation.y = angle;
                }
                StepOutcome::Finished
            }
        }
    }

    pub fn npc_state(&self) -> NpcState {
        if self.is_dead() {
            NpcState::Dead
        } else if self.returning {
            NpcState::Returning
        } else if self.attack_target.is_some() && self.target_position.is_some() {
            NpcState::Attacking
        } else if self.attack_target.is_some() {
            NpcState::Pursuing
        } else {
            NpcState::Patrol
        }
    }

    pub fn snapshot(&self, is_self: bool) -> ObjectSnapshot {
        ObjectSnapshot {
            object_id: self.id.clone(),
            name: self.entity.name.clone(),
            resource: self.entity.resource.clone(),
            role: self.role,
            speed: self.entity.speed,
            variation: self.entity.variation.clone(),
            position: self.position,
            rotation: self.rotation,
            is_self,
            right_hand: self.entity.equipped.right_hand.as_ref().map(|i| i.snapshot()),
            left_hand: self.entity.equipped.left_hand.as_ref().map(|i| i.snapshot()),
            human: self.entity.human.as_ref().map(|h| h.snapshot()),
        }
    }

    pub fn variation_state(&self) -> VariationState {
        VariationState {
            object_id: self.id.clone(),
            variation_index: self.variation_index,
        }
    }
}

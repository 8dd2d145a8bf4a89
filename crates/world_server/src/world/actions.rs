//! Player ingress.
//!
//! Everything a client can ask of the world arrives as an [`Action`]. Each
//! variant has exactly one handler, and the handlers mutate the world with
//! the same primitives the tick passes use.
//!
//! ```json
//! {"action": "transform", "position": {"x": 1.0, "y": 0.0, "z": 2.0},
//!  "rotation": {"x": 0.0, "y": 90.0, "z": 0.0}, "speed": 2.0}
//! {"action": "interact"}
//! {"action": "interact_with", "target_id": "6f1c..."}
//! {"action": "animation", "name": "Wave", "speed": 1.0}
//! ```

use super::World;
use crate::entity::catalog;
use crate::error::WorldError;
use crate::object::{GameObject, ObjectKind};
use meridian_event_system::{
    Damage, DestroyObject, InteractQueued, ObjectId, ObjectRole, PlaySound, Spawn,
    TransformRotation, Vector3,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Client-reported movement
    Transform {
        position: Vector3,
        rotation: Vector3,
        speed: f32,
    },
    /// Harvest the nearest resource node
    Interact,
    /// Attack a specific object
    InteractWith { target_id: ObjectId },
    /// Play an animation for everyone nearby
    Animation { name: String, speed: f32 },
}

impl Action {
    pub fn from_json(input: &str) -> Result<Self, WorldError> {
        serde_json::from_str(input).map_err(|e| WorldError::MalformedInput(e.to_string()))
    }
}

fn is_finite(v: &Vector3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

impl World {
    /// The object acting as `id`, as long as it is alive and in the world.
    fn acting_source(&self, id: &ObjectId) -> Result<&GameObject, WorldError> {
        self.objects
            .get(id)
            .filter(|o| !o.is_dead() && o.is_visible())
            .ok_or_else(|| WorldError::NotFound(id.clone()))
    }

    /// Routes an action from `source` to its handler.
    pub fn handle_action(&mut self, source: &ObjectId, action: Action) -> Result<(), WorldError> {
        let result = match action {
            Action::Transform {
                position,
                rotation,
                speed,
            } => self.apply_transform(source, position, rotation, speed).map(|_| ()),
            Action::Interact => self.interact(source),
            Action::InteractWith { target_id } => self.interact_with(source, &target_id),
            Action::Animation { name, speed } => self.play_animation(source, &name, speed),
        };
        if let Err(e) = &result {
            debug!("Action from {} rejected: {}", source, e);
        }
        result
    }

    /// Applies a movement report.
    ///
    /// Reports arriving within `transform_throttle_ms` of the last accepted
    /// one are dropped; returns whether this one was applied.
    pub fn apply_transform(
        &mut self,
        id: &ObjectId,
        position: Vector3,
        rotation: Vector3,
        speed: f32,
    ) -> Result<bool, WorldError> {
        if !is_finite(&position) || !is_finite(&rotation) || !speed.is_finite() {
            return Err(WorldError::MalformedInput(format!(
                "non-finite transform for {id}"
            )));
        }
        self.acting_source(id)?;
        let now = self.now;
        let throttle = self.config.transform_throttle_ms;
        let object = self
            .objects
            .get_mut(id)
            .ok_or_else(|| WorldError::NotFound(id.clone()))?;
        if object.next_transform_at.is_some_and(|at| now < at) {
            trace!("Throttled transform from {}", id);
            return Ok(false);
        }

        let previous = (object.position, object.rotation, object.entity.speed);
        object.rotation = rotation;
        object.entity.speed = speed;
        object.next_transform_at = Some(now + throttle);

        if let Err(e) = self.relocate(id, position) {
            if let Some(object) = self.objects.get_mut(id) {
                (object.position, object.rotation, object.entity.speed) = previous;
            }
            return Err(e);
        }
        self.emit_movement(id);
        Ok(true)
    }

    /// Chops the nearest tree within harvesting range.
    pub fn interact(&mut self, id: &ObjectId) -> Result<(), WorldError> {
        let now = self.now;
        self.acting_source(id)?;
        self.recompute_neighbors(id);
        let source = self.acting_source(id)?;
        let nearest = source
            .neighbors
            .iter()
            .filter_map(|n| self.objects.get(n))
            .filter(|o| o.kind == ObjectKind::Tree)
            .map(|o| (o.id.clone(), source.position.distance(o.position)))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let Some((tree_id, distance)) = nearest else {
            trace!("{} has no tree nearby", id);
            return Ok(());
        };
        let Some(tree) = self.objects.get(&tree_id).filter(|t| !t.is_dead()) else {
            return Ok(());
        };
        if distance > self.config.harvest_range {
            trace!("{} is {:.2} from the nearest tree", id, distance);
            return Ok(());
        }
        let tree_position = tree.position;
        let sound = tree.entity.damage_sound.clone();

        if let Some(source) = self.objects.get_mut(id) {
            let rotation = source.look_at(tree_position);
            let recipients = self.observers_and_self(id);
            self.emit(
                recipients,
                TransformRotation {
                    object_id: id.clone(),
                    rotation,
                },
            );
        }

        let damage = self.config.harvest_damage;
        let Some(tree) = self.objects.get_mut(&tree_id) else {
            return Ok(());
        };
        tree.take_damage(damage, now);
        let felled = tree.is_dead();

        if !sound.is_empty() {
            let listeners = self.players_in_radius(tree_position, self.config.sound_radius);
            self.emit(
                listeners,
                PlaySound {
                    resource: sound,
                    position: tree_position,
                    volume: self.config.sound_volume,
                },
            );
        }

        if !felled {
            self.emit(
                vec![id.clone()],
                InteractQueued {
                    object_id: id.clone(),
                },
            );
            return Ok(());
        }

        debug!("{} felled {}", id, tree_id);
        if let Some(tree) = self.objects.get_mut(&tree_id) {
            tree.variation_index = 1;
            tree.schedule_respawn(now);
        }
        self.emit_variation(&tree_id);
        Ok(())
    }

    /// Attacks `target_id` with the source's equipped weapon.
    pub fn interact_with(&mut self, id: &ObjectId, target_id: &ObjectId) -> Result<(), WorldError> {
        let now = self.now;
        if id == target_id {
            return Err(WorldError::MalformedInput(format!("{id} cannot target itself")));
        }
        let source = self.acting_source(id)?;
        let target = self
            .objects
            .get(target_id)
            .filter(|t| !t.is_dead() && t.is_visible())
            .ok_or_else(|| WorldError::NotFound(target_id.clone()))?;

        let range = source
            .attack_range()
            .ok_or_else(|| WorldError::NoCapability(id.clone()))?;
        let distance = source.position.distance(target.position);
        if distance > range {
            return Err(WorldError::OutOfRange {
                target: target_id.clone(),
                distance,
                range,
            });
        }
        let damage = source
            .attack_max_damage()
            .ok_or_else(|| WorldError::NoCapability(id.clone()))?;
        let loot_position = Vector3::new(target.position.x, source.position.y, target.position.z);
        let target_position = target.position;

        let Some(victim) = self.objects.get_mut(target_id) else {
            return Err(WorldError::NotFound(target_id.clone()));
        };
        let killed = victim.take_damage(damage, now);
        let victim_is_player = victim.is_player();
        let payload = Damage {
            object_id: target_id.clone(),
            amount: damage,
            // Player hits always land at full damage
            is_crit: true,
            health_current: victim.entity.health,
            health_max: victim.entity.max_health,
        };

        if let Some(source) = self.objects.get_mut(id) {
            let rotation = source.look_at(target_position);
            let recipients = self.observers_and_self(id);
            self.emit(
                recipients,
                TransformRotation {
                    object_id: id.clone(),
                    rotation,
                },
            );
        }

        if !killed {
            let recipients = self.observers_and_self(target_id);
            self.emit(recipients, payload);
            return Ok(());
        }

        debug!("{} killed {}", id, target_id);
        self.drop_loot(loot_position);

        let recipients = self.observers(target_id);
        self.hide(target_id);
        self.emit(
            recipients,
            DestroyObject {
                object_id: target_id.clone(),
            },
        );
        if victim_is_player {
            self.schedule_revive(target_id);
        }
        Ok(())
    }

    fn drop_loot(&mut self, position: Vector3) {
        let mut loot = GameObject::new(
            ObjectId::generate(),
            catalog::pistol_loot(),
            ObjectRole::Loot,
            position,
            Vector3::zero(),
        );
        loot.destroy_at = Some(self.now + self.config.loot_lifetime_ms);
        let snapshot = loot.snapshot(false);

        match self.insert(loot) {
            Ok(loot_id) => {
                let recipients = self.observers(&loot_id);
                self.emit(recipients, Spawn::Object(snapshot));
            }
            Err(e) => warn!("⚠️ Could not drop loot at {:?}: {}", position, e),
        }
    }

    /// Relays an animation to the players around `id`.
    pub fn play_animation(&mut self, id: &ObjectId, name: &str, speed: f32) -> Result<(), WorldError> {
        if name.is_empty() || !speed.is_finite() {
            return Err(WorldError::MalformedInput("invalid animation".to_string()));
        }
        self.acting_source(id)?;
        self.emit_animation(id, name, speed, false);
        Ok(())
    }
}

//! NPC behavior passes and the combat effects they schedule.
//!
//! Behavior state is never stored as an enum; it follows from the target,
//! path and `returning` fields (see [`crate::object::NpcState`]). Every pass
//! re-reads those fields, so a stale deadline left behind by an earlier state
//! is simply ignored.

use super::{Effect, World};
use crate::entity::secs_to_ms;
use crate::object::StepOutcome;
use meridian_event_system::{
    Animation, Damage, ObjectId, ObjectRole, Spawn, Teleport, Transform, TransformRotation, Vector3,
};
use tracing::{debug, trace, warn};

const RELOAD_ANIMATION: &str = "Reloading";
const MAIN_TELEPORT: &str = "main";

impl World {
    pub(super) fn apply_due_effects(&mut self) {
        while let Some(effect) = self.effects.pop_due(self.now) {
            match effect {
                Effect::DelayedDamage { source, target } => self.land_damage(&source, &target),
                Effect::PlayerRevive { player } => self.revive_player(&player),
            }
        }
    }

    /// Restores NPCs whose respawn deadline has elapsed.
    pub(super) fn respawn_pass(&mut self) {
        let now = self.now;
        let (min_s, max_s) = (self.config.patrol_delay_min_s, self.config.patrol_delay_max_s);

        for id in self.ids_with_role(ObjectRole::Npc) {
            let Some(npc) = self.objects.get_mut(&id) else {
                continue;
            };
            if !npc.next_respawn_at.is_some_and(|at| at <= now) {
                continue;
            }

            npc.entity = npc.entity.instantiate();
            npc.next_respawn_at = None;
            npc.rotation = npc.spawn_rotation;
            npc.release_attack();
            npc.returning = false;
            npc.path.clear();
            npc.current_animation = None;
            npc.next_attack_at = None;
            npc.set_next_travel_time(now, &mut self.rng, min_s, max_s);
            let spawn = npc.spawn_position;

            if let Err(e) = self.relocate(&id, spawn).and_then(|_| self.show(&id)) {
                warn!("⚠️ Failed to respawn NPC {}: {}", id, e);
                continue;
            }
            debug!("NPC {} respawned at {:?}", id, spawn);

            let Some(snapshot) = self.objects.get(&id).map(|o| o.snapshot(false)) else {
                continue;
            };
            let recipients = self.observers(&id);
            self.emit(recipients, Spawn::Object(snapshot));
        }
    }

    /// Starts patrol legs for idle NPCs and advances every NPC along its path.
    pub(super) fn walk_pass(&mut self) {
        let now = self.now;
        let allowance = self.config.step_allowance_ms;
        let (min_s, max_s) = (self.config.patrol_delay_min_s, self.config.patrol_delay_max_s);

        for id in self.ids_with_role(ObjectRole::Npc) {
            let Some(npc) = self.objects.get_mut(&id) else {
                continue;
            };
            if npc.is_dead() || !npc.is_visible() {
                continue;
            }

            let idle = npc.next_destination_at.map_or(true, |at| now >= at)
                && npc.path.is_empty()
                && npc.attack_target.is_none()
                && !npc.returning;
            if idle && !npc.waypoints.is_empty() {
                match npc.next_random_waypoint(&mut self.rng) {
                    Some(waypoint) => {
                        npc.path_target_angle = Some(waypoint.rot_y);
                        if self.set_destination(&id, waypoint.x, waypoint.z).is_err() {
                            // Try again once the next patrol deadline passes
                            if let Some(npc) = self.objects.get_mut(&id) {
                                npc.set_next_travel_time(now, &mut self.rng, min_s, max_s);
                            }
                        }
                    }
                    None => npc.set_next_travel_time(now, &mut self.rng, min_s, max_s),
                }
            }

            let Some(npc) = self.objects.get_mut(&id) else {
                continue;
            };
            let before = npc.position;
            let outcome = npc.step_along_path(now, allowance);
            if outcome == StepOutcome::Idle {
                continue;
            }
            if outcome == StepOutcome::Finished {
                npc.set_next_travel_time(now, &mut self.rng, min_s, max_s);
                npc.returning = false;
            }
            let position = npc.position;

            if let Err(e) = self.relocate(&id, position) {
                warn!("⚠️ NPC {} stepped outside the world: {}", id, e);
                if let Some(npc) = self.objects.get_mut(&id) {
                    npc.position = before;
                    npc.path.clear();
                }
                continue;
            }
            self.emit_movement(&id);
        }
    }

    pub(super) fn attack_pass(&mut self) {
        for id in self.ids_with_role(ObjectRole::Npc) {
            self.attack_step(&id);
        }
    }

    fn attack_step(&mut self, id: &ObjectId) {
        let Some(npc) = self.objects.get(id) else {
            return;
        };
        if !npc.entity.can_aggro || npc.is_dead() || npc.returning || !npc.is_visible() {
            return;
        }
        let Some(range) = npc.attack_range() else {
            return;
        };

        if let Some(target_id) = npc.attack_target.clone() {
            let target = self
                .objects
                .get(&target_id)
                .filter(|t| !t.is_dead() && t.is_visible())
                .map(|t| t.position);
            match target {
                Some(position) => self.engage(id, &target_id, position, range),
                None => self.disengage(id),
            }
            return;
        }

        self.acquire_target(id);
    }

    /// Picks the nearest living player within aggro range among the neighbors.
    fn acquire_target(&mut self, id: &ObjectId) {
        let aggro = self.config.aggro_radius;
        let Some(npc) = self.objects.get(id) else {
            return;
        };
        let nearest = npc
            .neighbors
            .iter()
            .filter_map(|n| self.objects.get(n))
            .filter(|o| o.is_player() && !o.is_dead() && o.is_visible())
            .map(|o| (o.id.clone(), npc.position.distance(o.position)))
            .filter(|(_, distance)| *distance <= aggro)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((target, distance)) = nearest {
            debug!("NPC {} aggroed on {} at {:.2}", id, target, distance);
            if let Some(npc) = self.objects.get_mut(id) {
                npc.attack_target = Some(target);
                npc.attack_attempts = 0;
            }
        }
    }

    /// Drops a lost target and resumes patrolling.
    fn disengage(&mut self, id: &ObjectId) {
        let Some(npc) = self.objects.get_mut(id) else {
            return;
        };
        trace!("NPC {} lost its target", id);
        npc.release_attack();
        if let Some(waypoint) = npc.next_random_waypoint(&mut self.rng) {
            npc.path_target_angle = Some(waypoint.rot_y);
            let _ = self.set_destination(id, waypoint.x, waypoint.z);
        }
        self.reset_animation(id);
    }

    fn engage(&mut self, id: &ObjectId, target: &ObjectId, target_position: Vector3, range: f64) {
        let now = self.now;
        let Some(npc) = self.objects.get_mut(id) else {
            return;
        };
        let distance = npc.position.distance(target_position);

        if distance > range {
            npc.target_position = None;
            let pursuing = npc.path.is_empty();
            let spawn = npc.spawn_point();
            let leashed = npc.position.distance(spawn) > self.config.leash_distance;

            self.reset_animation(id);
            if leashed {
                self.return_to_spawn(id, spawn);
            } else if pursuing {
                let _ = self.set_destination(id, target_position.x, target_position.z);
            }
            return;
        }

        npc.path.clear();
        npc.next_step_at = None;
        if npc.target_position != Some(target_position) {
            let rotation = npc.look_at(target_position);
            npc.target_position = Some(target_position);
            let recipients = self.observers(id);
            self.emit(
                recipients,
                TransformRotation {
                    object_id: id.clone(),
                    rotation,
                },
            );
        }

        let Some(npc) = self.objects.get_mut(id) else {
            return;
        };
        if npc.next_attack_at.is_some_and(|at| now < at) || npc.entity.is_reload_in_progress(now) {
            return;
        }
        if npc.entity.is_clip_empty() {
            npc.entity.start_reload(now);
            self.emit_animation(id, RELOAD_ANIMATION, 1.0, false);
            return;
        }
        let Some(attack_speed) = npc.attack_speed() else {
            return;
        };

        npc.entity.decrement_clip();
        npc.attack_attempts += 1;
        let interval = secs_to_ms(attack_speed);
        npc.next_attack_at = Some(now + interval);
        let animation = npc.entity.interact_animation();
        npc.current_animation = animation.map(str::to_string);

        if let Some(name) = animation {
            self.emit_animation(id, name, 1.0, false);
        }
        let delay = (interval as f64 * self.config.damage_delay_fraction).round() as u64;
        self.schedule(
            now + delay,
            Effect::DelayedDamage {
                source: id.clone(),
                target: target.clone(),
            },
        );
        trace!("NPC {} swung at {} (attempt {})", id, target, self.objects.get(id).map_or(0, |o| o.attack_attempts));
    }

    fn return_to_spawn(&mut self, id: &ObjectId, spawn: Vector3) {
        if let Some(npc) = self.objects.get_mut(id) {
            debug!("NPC {} strayed too far, returning to spawn", id);
            npc.path.clear();
            npc.returning = true;
            npc.release_attack();
        }
        if self.set_destination(id, spawn.x, spawn.z).is_err() {
            // Without a way back the NPC patrols from where it stands
            if let Some(npc) = self.objects.get_mut(id) {
                npc.returning = false;
            }
        }
    }

    /// Applies damage scheduled by an NPC swing, if both parties still qualify.
    fn land_damage(&mut self, source: &ObjectId, target: &ObjectId) {
        let now = self.now;
        let Some(damage) = self
            .objects
            .get(source)
            .filter(|s| !s.is_dead() && s.is_visible())
            .and_then(|s| s.attack_max_damage())
        else {
            trace!("Dropping stale damage from {}", source);
            return;
        };
        let Some(victim) = self
            .objects
            .get_mut(target)
            .filter(|t| !t.is_dead() && t.is_visible())
        else {
            trace!("Dropping damage to missing target {}", target);
            return;
        };

        let killed = victim.take_damage(damage, now);
        let payload = Damage {
            object_id: target.clone(),
            amount: damage,
            is_crit: false,
            health_current: victim.entity.health,
            health_max: victim.entity.max_health,
        };
        let victim_is_player = victim.is_player();
        let recipients = self.observers_and_self(target);
        self.emit(recipients, payload);

        if killed {
            debug!("{} killed {}", source, target);
            if let Some(attacker) = self.objects.get_mut(source) {
                attacker.release_attack();
            }
            self.reset_animation(source);
            if victim_is_player {
                self.schedule_revive(target);
            }
        }
    }

    pub(super) fn schedule_revive(&mut self, player: &ObjectId) {
        let due = self.now + self.config.player_revive_delay_ms;
        self.schedule(
            due,
            Effect::PlayerRevive {
                player: player.clone(),
            },
        );
    }

    /// Brings a dead player back at the main anchor with full health.
    fn revive_player(&mut self, id: &ObjectId) {
        let Some(player) = self.objects.get(id).filter(|p| p.is_player() && p.is_dead()) else {
            return;
        };
        let (position, rotation) = match self.find_teleport(MAIN_TELEPORT) {
            Ok(anchor) => (anchor.position, anchor.rotation),
            Err(e) => {
                warn!("⚠️ Reviving {} in place: {}", id, e);
                (player.position, player.rotation)
            }
        };
        let was_hidden = !player.is_visible();

        if let Some(player) = self.objects.get_mut(id) {
            player.entity.health = player.entity.max_health;
            player.rotation = rotation;
        }
        if let Err(e) = self.relocate(id, position).and_then(|_| self.show(id)) {
            warn!("⚠️ Failed to revive {}: {}", id, e);
            return;
        }
        debug!("Player {} revived at {:?}", id, position);

        if was_hidden {
            if let Some(snapshot) = self.objects.get(id).map(|o| o.snapshot(false)) {
                let recipients = self.observers(id);
                self.emit(recipients, Spawn::Object(snapshot));
            }
        }
        let recipients = self.observers_and_self(id);
        self.emit(
            recipients,
            Teleport {
                object_id: id.clone(),
                position,
                rotation,
            },
        );
    }

    /// Stops the current animation, telling observers if one was playing.
    pub(super) fn reset_animation(&mut self, id: &ObjectId) {
        let Some(name) = self.objects.get_mut(id).and_then(|o| o.current_animation.take()) else {
            return;
        };
        self.emit_animation(id, &name, 0.0, true);
    }

    pub(super) fn emit_animation(&mut self, id: &ObjectId, name: &str, speed: f32, is_stop: bool) {
        let recipients = self.observers(id);
        self.emit(
            recipients,
            Animation {
                object_id: id.clone(),
                name: name.to_string(),
                speed,
                is_stop,
            },
        );
    }

    pub(super) fn emit_movement(&mut self, id: &ObjectId) {
        let Some(payload) = self.objects.get(id).map(|o| Transform {
            object_id: id.clone(),
            position: o.position,
            rotation: o.rotation,
            speed: o.entity.speed,
        }) else {
            return;
        };
        let recipients = self.observers(id);
        self.emit(recipients, payload);
    }
}

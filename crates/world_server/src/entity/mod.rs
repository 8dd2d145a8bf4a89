//! Entity templates and equipment.
//!
//! An [`Entity`] describes what a world object *is*: its name, stats and
//! equipment. Templates come from the [`catalog`] and are copied into live
//! objects with [`Entity::instantiate`]; only the copy is ever mutated.
//!
//! ## Stat Resolution
//!
//! Attack range, damage and speed prefer the right-hand item's stat when it
//! is positive, then fall back to the entity's own stat, and are absent when
//! neither is set. An absent range or damage means the object cannot attack.

pub mod catalog;

use crate::SimTime;
use meridian_event_system::{HumanSlotSnapshot, HumanSnapshot, ItemSnapshot};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Broad weapon/tool category; decides the attack animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Axe,
    Pistol,
}

/// Weapon or tool carried in a hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
    pub resource: String,
    pub variation: String,
    pub attack_damage: i32,
    pub attack_range: f64,
    pub attack_speed: f64,
    pub attack_radius: f32,
    /// Rounds per reload; 0 for weapons without a clip
    pub clip_size: u32,
    pub clip: u32,
    /// Seconds
    pub reload_time: f64,
    #[serde(skip)]
    pub reload_finished_at: Option<SimTime>,
}

impl Item {
    pub fn has_clip(&self) -> bool {
        self.clip_size > 0
    }

    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            resource: self.resource.clone(),
            variation: self.variation.clone(),
            attack_radius: self.attack_radius,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquippedItems {
    pub right_hand: Option<Item>,
    pub left_hand: Option<Item>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanSlot {
    pub recipe: String,
    pub color: String,
}

impl HumanSlot {
    pub fn new(recipe: &str, color: &str) -> Self {
        Self {
            recipe: recipe.to_string(),
            color: color.to_string(),
        }
    }
}

/// Humanoid appearance: a gender and a set of named slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanCharacter {
    pub gender: String,
    pub slots: BTreeMap<String, HumanSlot>,
}

impl HumanCharacter {
    pub fn male(slots: impl IntoIterator<Item = (&'static str, HumanSlot)>) -> Self {
        Self {
            gender: "male".to_string(),
            slots: slots
                .into_iter()
                .map(|(name, slot)| (name.to_string(), slot))
                .collect(),
        }
    }

    pub fn snapshot(&self) -> HumanSnapshot {
        HumanSnapshot {
            gender: self.gender.clone(),
            slots: self
                .slots
                .iter()
                .map(|(name, slot)| {
                    (
                        name.clone(),
                        HumanSlotSnapshot {
                            recipe: slot.recipe.clone(),
                            color: slot.color.clone(),
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Combat and movement template of a world object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub internal_name: String,
    pub resource: String,
    pub max_health: i32,
    pub health: i32,
    /// Seconds until a dead NPC respawns or a depleted node regrows
    pub respawn_interval: u64,
    /// Percent chance an interaction succeeds; 0 means always
    pub interact_chance: u32,
    pub damage_sound: String,
    pub can_aggro: bool,
    pub attack_damage: i32,
    pub attack_range: f64,
    pub attack_speed: f64,
    pub attack_radius: f32,
    pub speed: f32,
    pub variation: String,
    pub equipped: EquippedItems,
    pub human: Option<HumanCharacter>,
}

impl Default for Entity {
    fn default() -> Self {
        Self {
            name: String::new(),
            internal_name: String::new(),
            resource: String::new(),
            max_health: 0,
            health: 0,
            respawn_interval: 0,
            interact_chance: 0,
            damage_sound: String::new(),
            can_aggro: false,
            attack_damage: 0,
            attack_range: 0.0,
            attack_speed: 0.0,
            attack_radius: 0.0,
            speed: 0.0,
            variation: String::new(),
            equipped: EquippedItems::default(),
            human: None,
        }
    }
}

impl Entity {
    /// Live copy of this template: full health, every clip loaded.
    pub fn instantiate(&self) -> Entity {
        let mut entity = self.clone();
        entity.health = entity.max_health;
        for item in [&mut entity.equipped.right_hand, &mut entity.equipped.left_hand]
            .into_iter()
            .flatten()
        {
            item.clip = item.clip_size;
            item.reload_finished_at = None;
        }
        entity
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    fn right_hand(&self) -> Option<&Item> {
        self.equipped.right_hand.as_ref()
    }

    pub fn attack_range(&self) -> Option<f64> {
        resolve(self.right_hand().map(|i| i.attack_range), self.attack_range)
    }

    pub fn attack_max_damage(&self) -> Option<i32> {
        match self.right_hand() {
            Some(item) if item.attack_damage > 0 => Some(item.attack_damage),
            _ if self.attack_damage > 0 => Some(self.attack_damage),
            _ => None,
        }
    }

    /// Seconds between attacks.
    pub fn attack_speed(&self) -> Option<f64> {
        resolve(self.right_hand().map(|i| i.attack_speed), self.attack_speed)
    }

    /// Consumes one round; no-op for clip-less weapons.
    pub fn decrement_clip(&mut self) {
        if let Some(item) = self.equipped.right_hand.as_mut() {
            if item.has_clip() {
                item.clip = item.clip.saturating_sub(1);
            }
        }
    }

    pub fn is_clip_empty(&self) -> bool {
        self.right_hand()
            .is_some_and(|item| item.has_clip() && item.clip == 0)
    }

    /// Refills the clip and arms the reload deadline.
    pub fn start_reload(&mut self, now: SimTime) {
        if let Some(item) = self.equipped.right_hand.as_mut() {
            if item.reload_time <= 0.0 {
                return;
            }
            item.clip = item.clip_size;
            item.reload_finished_at = Some(now + secs_to_ms(item.reload_time));
        }
    }

    pub fn is_reload_in_progress(&self, now: SimTime) -> bool {
        self.right_hand()
            .and_then(|item| item.reload_finished_at)
            .is_some_and(|deadline| now < deadline)
    }

    pub fn can_interact(&self, rng: &mut impl Rng) -> bool {
        if self.interact_chance == 0 {
            return true;
        }
        rng.gen_range(0.0..100.0) <= self.interact_chance as f64
    }

    pub fn interact_animation(&self) -> Option<&'static str> {
        self.right_hand().map(|item| match item.kind {
            ItemKind::Axe => "AttackAxe",
            ItemKind::Pistol => "PistolShoot",
        })
    }

    /// Clamps at zero and returns the health left.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        self.health = (self.health - amount.max(0)).max(0);
        self.health
    }
}

fn resolve(item_stat: Option<f64>, base: f64) -> Option<f64> {
    match item_stat {
        Some(stat) if stat > 0.0 => Some(stat),
        _ if base > 0.0 => Some(base),
        _ => None,
    }
}

/// Converts a duration in (possibly fractional) seconds to whole milliseconds.
pub fn secs_to_ms(seconds: f64) -> SimTime {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as SimTime
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_stats_prefer_right_hand_then_base() {
        let mut bandit = catalog::bandit().instantiate();
        assert_eq!(bandit.attack_range(), Some(1.5));
        assert_eq!(bandit.attack_max_damage(), Some(1));
        assert_eq!(bandit.attack_speed(), Some(2.0));

        bandit.equipped.right_hand = None;
        assert_eq!(bandit.attack_range(), None);
        assert_eq!(bandit.attack_max_damage(), None);

        bandit.attack_range = 3.0;
        bandit.attack_damage = 7;
        assert_eq!(bandit.attack_range(), Some(3.0));
        assert_eq!(bandit.attack_max_damage(), Some(7));
    }

    #[test]
    fn test_clip_and_reload_cycle() {
        let mut shooter = Entity {
            max_health: 10,
            equipped: EquippedItems {
                right_hand: Some(catalog::pistol()),
                left_hand: None,
            },
            ..Entity::default()
        }
        .instantiate();

        assert!(!shooter.is_clip_empty());
        for _ in 0..100 {
            shooter.decrement_clip();
        }
        assert!(shooter.is_clip_empty());
        shooter.decrement_clip();
        assert!(shooter.is_clip_empty());

        shooter.start_reload(1_000);
        assert!(!shooter.is_clip_empty());
        assert!(shooter.is_reload_in_progress(1_000));
        assert!(shooter.is_reload_in_progress(3_499));
        assert!(!shooter.is_reload_in_progress(3_500));
        assert_eq!(shooter.interact_animation(), Some("PistolShoot"));
    }

    #[test]
    fn test_clipless_weapon_never_runs_dry() {
        let mut bandit = catalog::bandit().instantiate();
        for _ in 0..10 {
            bandit.decrement_clip();
        }
        assert!(!bandit.is_clip_empty());
        bandit.start_reload(0);
        assert!(!bandit.is_reload_in_progress(0));
        assert_eq!(bandit.interact_animation(), Some("AttackAxe"));
    }

    #[test]
    fn test_take_damage_clamps_at_zero() {
        let mut tree = catalog::tree().instantiate();
        assert_eq!(tree.take_damage(35), 65);
        assert_eq!(tree.take_damage(500), 0);
        assert!(tree.is_dead());
        assert_eq!(tree.take_damage(-10), 0);
    }

    #[test]
    fn test_zero_interact_chance_always_succeeds() {
        let mut rng = StdRng::seed_from_u64(1);
        let entity = Entity::default();
        assert!((0..50).all(|_| entity.can_interact(&mut rng)));

        let never = Entity {
            interact_chance: 100,
            ..Entity::default()
        };
        assert!(never.can_interact(&mut rng));
    }
}

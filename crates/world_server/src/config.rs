//! Simulation configuration types and defaults.
//!
//! Every gameplay radius, delay and budget the simulation uses is a field of
//! [`WorldConfig`]. Defaults reproduce the tuning of the shipped level: a
//! 25 Hz tick, a 30 unit interest cube and a 10 unit aggro radius.

use serde::{Deserialize, Serialize};

fn default_tick_interval_ms() -> u64 {
    40 // 25 ticks per second
}
fn default_world_half_size() -> f64 {
    1000.0
}
fn default_interest_radius() -> f64 {
    30.0
}
fn default_aggro_radius() -> f64 {
    10.0
}
fn default_leash_distance() -> f64 {
    20.0
}
fn default_sound_radius() -> f64 {
    50.0
}
fn default_sound_volume() -> f32 {
    0.5
}
fn default_harvest_range() -> f64 {
    1.5
}
fn default_harvest_damage() -> i32 {
    35
}
fn default_loot_lifetime_ms() -> u64 {
    10_000
}
fn default_player_revive_delay_ms() -> u64 {
    4_000
}
fn default_transform_throttle_ms() -> u64 {
    40
}
fn default_damage_delay_fraction() -> f64 {
    0.2
}
fn default_step_allowance_ms() -> u64 {
    20
}
fn default_patrol_delay_min_s() -> u64 {
    15
}
fn default_patrol_delay_max_s() -> u64 {
    135
}
fn default_max_path_iterations() -> usize {
    1000
}
fn default_queue_capacity() -> usize {
    1024
}

/// Configuration of the world simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Tick interval in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Half-size of the octree root cube when the level does not specify one
    #[serde(default = "default_world_half_size")]
    pub world_half_size: f64,
    /// Half-size of the cube that defines an object's neighbors
    #[serde(default = "default_interest_radius")]
    pub interest_radius: f64,
    /// NPCs acquire players at or within this distance
    #[serde(default = "default_aggro_radius")]
    pub aggro_radius: f64,
    /// NPCs abandon a chase beyond this distance from their spawn point
    #[serde(default = "default_leash_distance")]
    pub leash_distance: f64,
    /// Players within this cube hear positional sounds
    #[serde(default = "default_sound_radius")]
    pub sound_radius: f64,
    /// Volume of harvesting sounds
    #[serde(default = "default_sound_volume")]
    pub sound_volume: f32,
    /// Maximum distance to a resource node for `Interact`
    #[serde(default = "default_harvest_range")]
    pub harvest_range: f64,
    /// Damage dealt to a resource node per `Interact`
    #[serde(default = "default_harvest_damage")]
    pub harvest_damage: i32,
    /// Lifetime of dropped loot in milliseconds
    #[serde(default = "default_loot_lifetime_ms")]
    pub loot_lifetime_ms: u64,
    /// Delay between a player's death and their revival
    #[serde(default = "default_player_revive_delay_ms")]
    pub player_revive_delay_ms: u64,
    /// Minimum interval between accepted movement reports per object
    #[serde(default = "default_transform_throttle_ms")]
    pub transform_throttle_ms: u64,
    /// Fraction of the attack interval after which NPC damage lands
    #[serde(default = "default_damage_delay_fraction")]
    pub damage_delay_fraction: f64,
    /// Subtracted from every NPC step duration to absorb tick jitter
    #[serde(default = "default_step_allowance_ms")]
    pub step_allowance_ms: u64,
    /// Lower bound of the idle time before an NPC picks a new waypoint
    #[serde(default = "default_patrol_delay_min_s")]
    pub patrol_delay_min_s: u64,
    /// Upper bound (exclusive) of the idle time before a new waypoint
    #[serde(default = "default_patrol_delay_max_s")]
    pub patrol_delay_max_s: u64,
    /// A* search budget; exceeding it reports no path
    #[serde(default = "default_max_path_iterations")]
    pub max_path_iterations: usize,
    /// Capacity of each notification queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Seed for patrol/interaction randomness; random when absent
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            world_half_size: default_world_half_size(),
            interest_radius: default_interest_radius(),
            aggro_radius: default_aggro_radius(),
            leash_distance: default_leash_distance(),
            sound_radius: default_sound_radius(),
            sound_volume: default_sound_volume(),
            harvest_range: default_harvest_range(),
            harvest_damage: default_harvest_damage(),
            loot_lifetime_ms: default_loot_lifetime_ms(),
            player_revive_delay_ms: default_player_revive_delay_ms(),
            transform_throttle_ms: default_transform_throttle_ms(),
            damage_delay_fraction: default_damage_delay_fraction(),
            step_allowance_ms: default_step_allowance_ms(),
            patrol_delay_min_s: default_patrol_delay_min_s(),
            patrol_delay_max_s: default_patrol_delay_max_s(),
            max_path_iterations: default_max_path_iterations(),
            queue_capacity: default_queue_capacity(),
            rng_seed: None,
        }
    }
}

impl WorldConfig {
    /// Validates the configuration for consistency.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is usable, or a description of the first
    /// problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be greater than 0".to_string());
        }
        if self.world_half_size <= 0.0 {
            return Err("world_half_size must be positive".to_string());
        }

        for (name, value) in [
            ("interest_radius", self.interest_radius),
            ("aggro_radius", self.aggro_radius),
            ("leash_distance", self.leash_distance),
            ("sound_radius", self.sound_radius),
            ("harvest_range", self.harvest_range),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{name} must be a positive number, got {value}"));
            }
        }

        if self.aggro_radius > self.interest_radius {
            // Targets are picked from the neighbor set, so anything farther is invisible
            return Err(format!(
                "aggro_radius ({}) cannot exceed interest_radius ({})",
                self.aggro_radius, self.interest_radius
            ));
        }
        if !(0.0..=1.0).contains(&self.damage_delay_fraction) {
            return Err("damage_delay_fraction must be within 0.0..=1.0".to_string());
        }
        if self.patrol_delay_min_s >= self.patrol_delay_max_s {
            return Err("patrol_delay_min_s must be less than patrol_delay_max_s".to_string());
        }
        if self.max_path_iterations == 0 {
            return Err("max_path_iterations must be greater than 0".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("queue_capacity must be greater than 0".to_string());
        }

        Ok(())
    }
}

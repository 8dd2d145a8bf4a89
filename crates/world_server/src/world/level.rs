//! World bootstrap from a level description.
//!
//! The binary level format is decoded elsewhere; this module consumes the
//! decoded object list (accepted as JSON by the server binary).

use super::World;
use crate::config::WorldConfig;
use crate::entity::catalog;
use crate::error::WorldError;
use crate::object::{GameObject, ObjectKind, Waypoint};
use crate::pathfinding::PathFinder;
use crate::spatial::Bounds;
use meridian_event_system::{ObjectId, ObjectRole, Vector3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Teleport anchors are stored slightly above the ground they were placed on.
const TELEPORT_LIFT: f64 = 0.6;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelDescription {
    /// Half-size of the playable cube; the configured default when absent
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub objects: Vec<LevelObject>,
    #[serde(default)]
    pub teleports: Vec<LevelTeleport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelObject {
    pub uid: i32,
    pub kind: ObjectKind,
    /// Internal entity name, e.g. `tree` or `adam`
    pub entity: String,
    pub position: Vector3,
    #[serde(default)]
    pub rotation: Vector3,
    #[serde(default)]
    pub variation: i32,
    /// Extra patrol points of an NPC
    #[serde(default)]
    pub waypoints: Vec<LevelWaypoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelWaypoint {
    pub x: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelTeleport {
    pub name: String,
    pub position: Vector3,
    #[serde(default)]
    pub rotation: Vector3,
}

impl LevelDescription {
    pub fn from_json(json: &str) -> Result<Self, WorldError> {
        serde_json::from_str(json).map_err(|e| WorldError::MalformedInput(e.to_string()))
    }
}

impl World {
    /// Builds a world populated with the level's scenery, NPCs and anchors.
    pub fn from_level(
        config: WorldConfig,
        level: &LevelDescription,
        pathfinder: Arc<dyn PathFinder>,
    ) -> Result<Self, WorldError> {
        let half_size = level.size.unwrap_or(config.world_half_size);
        let (min_s, max_s) = (config.patrol_delay_min_s, config.patrol_delay_max_s);
        let mut world = World::new(config, Bounds::symmetric(half_size), pathfinder);

        for teleport in &level.teleports {
            let mut position = teleport.position;
            position.y += TELEPORT_LIFT;
            world.add_teleport(teleport.name.clone(), position, teleport.rotation);
        }

        let mut skipped = 0;
        for placed in &level.objects {
            let Some(template) = catalog::by_internal_name(&placed.entity) else {
                warn!("⚠️ Level object {} uses unknown entity '{}'", placed.uid, placed.entity);
                skipped += 1;
                continue;
            };

            let object = match placed.kind {
                ObjectKind::Npc => {
                    let extra: Vec<Waypoint> = placed
                        .waypoints
                        .iter()
                        .map(|wp| Waypoint::new(wp.x, wp.z, 0.0))
                        .collect();
                    let mut npc = GameObject::npc(template, placed.position, placed.rotation, &extra);
                    npc.set_next_travel_time(0, &mut world.rng, min_s, max_s);
                    npc
                }
                ObjectKind::Teleport => continue,
                kind => {
                    let mut scenery = GameObject::new(
                        ObjectId::for_level_object(placed.uid),
                        template,
                        ObjectRole::VariantMapObject,
                        placed.position,
                        placed.rotation,
                    );
                    scenery.kind = kind;
                    scenery.variation_index = placed.variation;
                    scenery
                }
            };
            world.insert(object)?;
        }

        let stats = world.stats();
        info!(
            "🌍 Level loaded: {} objects ({} NPCs), {} teleports, {} skipped",
            stats.objects,
            stats.npcs,
            level.teleports.len(),
            skipped
        );
        Ok(world)
    }
}

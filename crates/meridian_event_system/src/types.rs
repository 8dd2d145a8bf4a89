//! # Core Type Definitions
//!
//! Fundamental types shared by the simulation core, the dispatch fabric and
//! whatever transport ends up attached to the server.
//!
//! ## Key Types
//!
//! - [`ObjectId`] - Process-unique identifier of a live world object
//! - [`Vector3`] - Double-precision point/rotation triple
//! - [`ObjectRole`] - Runtime role of an object (player, NPC, scenery, loot)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a live object in the world.
///
/// Players and NPCs receive random UUIDs; scenery placed by the level keeps a
/// stable `object-<uid>` identifier so clients can address it across restarts
/// of the level file.
///
/// # Examples
///
/// ```rust
/// use meridian_event_system::ObjectId;
///
/// let npc = ObjectId::generate();
/// let tree = ObjectId::from("object-42");
/// assert_ne!(npc, tree);
/// assert_eq!(tree.as_str(), "object-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub String);

impl ObjectId {
    /// Creates a new random object ID using UUID v4.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Identifier used for objects placed by the level description.
    pub fn for_level_object(uid: i32) -> Self {
        Self(format!("object-{uid}"))
    }

    /// Borrows the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A 3D vector used for positions and Euler rotations (degrees).
///
/// Positions use double precision so large levels keep exact grid
/// coordinates; the octree relies on exact equality of inserted points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    /// X coordinate (east-west axis)
    pub x: f64,
    /// Y coordinate (vertical axis)
    pub y: f64,
    /// Z coordinate (north-south axis)
    pub z: f64,
}

impl Vector3 {
    /// Creates a new vector with the specified components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: Vector3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Components as an array, the representation stored by the octree.
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Runtime role of a world object.
///
/// The role decides which tick passes touch the object and who is notified
/// about it: only players are ever recipients of notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectRole {
    /// A connected client's avatar
    Player,
    /// A server-driven character with patrol and combat behavior
    Npc,
    /// Server-placed scenery with discrete variations (trees, ore)
    VariantMapObject,
    /// Dropped loot that despawns on a timer
    #[serde(rename = "loot_object")]
    Loot,
}

impl ObjectRole {
    /// Stable wire name of the role.
    pub const fn as_str(self) -> &'static str {
        match self {
            ObjectRole::Player => "player",
            ObjectRole::Npc => "npc",
            ObjectRole::VariantMapObject => "variant_map_object",
            ObjectRole::Loot => "loot_object",
        }
    }
}

impl std::fmt::Display for ObjectRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_object_ids_are_stable() {
        assert_eq!(ObjectId::for_level_object(7), ObjectId::from("object-7"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(ObjectId::generate(), ObjectId::generate());
    }

    #[test]
    fn test_distance_is_euclidean() {
        let a = Vector3::new(0.0, 0.0, 0.0);
        let b = Vector3::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance(b), 5.0);
    }

    #[test]
    fn test_object_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&ObjectId::from("abc")).unwrap();
        assert_eq!(json, "\"abc\"");
    }

    #[test]
    fn test_roles_use_wire_names() {
        assert_eq!(ObjectRole::Loot.to_string(), "loot_object");
        let json = serde_json::to_string(&ObjectRole::VariantMapObject).unwrap();
        assert_eq!(json, "\"variant_map_object\"");
    }
}

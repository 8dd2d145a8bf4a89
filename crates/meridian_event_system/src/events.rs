//! # Notification Payloads
//!
//! Every state change the simulation wants observers to know about is
//! described by one of the payload types in this module. Payloads are
//! snapshots: they copy the ids, stats and transforms they need at the moment
//! they are recorded, so an object that despawns before its notification is
//! delivered does not need to be kept alive.
//!
//! ## Notification Kinds
//!
//! Each [`NotificationKind`] owns a distinct bounded queue in the dispatch
//! fabric (see [`crate::dispatch`]):
//!
//! | Kind | Payload |
//! |------|---------|
//! | `spawn` | [`Spawn`] (single object or a connect-time batch) |
//! | `destroy` | [`DestroyObject`] |
//! | `movement` | [`Transform`] |
//! | `variation` | [`VariationChange`] |
//! | `animation` | [`Animation`] |
//! | `damage` | [`Damage`] |
//! | `rotation` | [`TransformRotation`] |
//! | `teleport` | [`Teleport`] |
//! | `sound` | [`PlaySound`] |
//! | `interact_queue` | [`InteractQueued`] |

use crate::types::{ObjectId, ObjectRole, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Equipped item as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub resource: String,
    pub variation: String,
    pub attack_radius: f32,
}

/// One humanoid appearance slot (hair, chest, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanSlotSnapshot {
    pub recipe: String,
    pub color: String,
}

/// Humanoid appearance descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanSnapshot {
    pub gender: String,
    pub slots: BTreeMap<String, HumanSlotSnapshot>,
}

/// Full description of an object, sent when it becomes visible to a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub object_id: ObjectId,
    pub name: String,
    pub resource: String,
    pub role: ObjectRole,
    pub speed: f32,
    pub variation: String,
    pub position: Vector3,
    pub rotation: Vector3,
    /// True only in the batch a connecting player receives about itself
    pub is_self: bool,
    pub right_hand: Option<ItemSnapshot>,
    pub left_hand: Option<ItemSnapshot>,
    pub human: Option<HumanSnapshot>,
}

/// Discrete variation state of a scenery object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationState {
    pub object_id: ObjectId,
    pub variation_index: i32,
}

/// Initial world view for a player that just connected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectBatch {
    pub objects: Vec<ObjectSnapshot>,
    pub states: Vec<VariationState>,
}

/// Payload of the spawn queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Spawn {
    Object(ObjectSnapshot),
    Batch(ObjectBatch),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestroyObject {
    pub object_id: ObjectId,
}

/// Position/rotation/speed update for a moving object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub object_id: ObjectId,
    pub position: Vector3,
    pub rotation: Vector3,
    pub speed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariationChange {
    pub object_id: ObjectId,
    pub variation_index: i32,
}

/// Starts or stops a named animation on an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub object_id: ObjectId,
    pub name: String,
    pub speed: f32,
    pub is_stop: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Damage {
    pub object_id: ObjectId,
    pub amount: i32,
    pub is_crit: bool,
    pub health_current: i32,
    pub health_max: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformRotation {
    pub object_id: ObjectId,
    pub rotation: Vector3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teleport {
    pub object_id: ObjectId,
    pub position: Vector3,
    pub rotation: Vector3,
}

/// A positional sound; recipients are the players within hearing range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaySound {
    pub resource: String,
    pub position: Vector3,
    pub volume: f32,
}

/// Tells a player its repeated interaction (e.g. chopping) may continue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractQueued {
    pub object_id: ObjectId,
}

/// Discriminant of the per-kind dispatch queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Spawn,
    Destroy,
    Movement,
    Variation,
    Animation,
    Damage,
    Rotation,
    Teleport,
    Sound,
    InteractQueue,
}

impl NotificationKind {
    /// All kinds, in the order their consumers are started.
    pub const ALL: [NotificationKind; 10] = [
        NotificationKind::Spawn,
        NotificationKind::Destroy,
        NotificationKind::Movement,
        NotificationKind::Variation,
        NotificationKind::Animation,
        NotificationKind::Damage,
        NotificationKind::Rotation,
        NotificationKind::Teleport,
        NotificationKind::Sound,
        NotificationKind::InteractQueue,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Spawn => "spawn",
            NotificationKind::Destroy => "destroy",
            NotificationKind::Movement => "movement",
            NotificationKind::Variation => "variation",
            NotificationKind::Animation => "animation",
            NotificationKind::Damage => "damage",
            NotificationKind::Rotation => "rotation",
            NotificationKind::Teleport => "teleport",
            NotificationKind::Sound => "sound",
            NotificationKind::InteractQueue => "interact_queue",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged union over every payload type.
///
/// This is what sinks receive; the dispatch fabric unwraps it into the
/// strongly typed per-kind queues and wraps it back up on delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Payload {
    Spawn(Spawn),
    Destroy(DestroyObject),
    Movement(Transform),
    Variation(VariationChange),
    Animation(Animation),
    Damage(Damage),
    Rotation(TransformRotation),
    Teleport(Teleport),
    Sound(PlaySound),
    InteractQueue(InteractQueued),
}

impl Payload {
    /// The queue this payload travels on.
    pub const fn kind(&self) -> NotificationKind {
        match self {
            Payload::Spawn(_) => NotificationKind::Spawn,
            Payload::Destroy(_) => NotificationKind::Destroy,
            Payload::Movement(_) => NotificationKind::Movement,
            Payload::Variation(_) => NotificationKind::Variation,
            Payload::Animation(_) => NotificationKind::Animation,
            Payload::Damage(_) => NotificationKind::Damage,
            Payload::Rotation(_) => NotificationKind::Rotation,
            Payload::Teleport(_) => NotificationKind::Teleport,
            Payload::Sound(_) => NotificationKind::Sound,
            Payload::InteractQueue(_) => NotificationKind::InteractQueue,
        }
    }

    /// Serializes the payload to JSON bytes for a transport.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self).map_err(|e| {
            tracing::error!("🔴 Payload serialization failed for kind '{}': {}", self.kind(), e);
            e
        })
    }
}

macro_rules! payload_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Payload {
                fn from(value: $ty) -> Self {
                    Payload::$variant(value)
                }
            }
        )*
    };
}

payload_from! {
    Spawn => Spawn,
    Destroy => DestroyObject,
    Movement => Transform,
    Variation => VariationChange,
    Animation => Animation,
    Damage => Damage,
    Rotation => TransformRotation,
    Teleport => Teleport,
    Sound => PlaySound,
    InteractQueue => InteractQueued,
}

/// A payload together with the players it must reach.
///
/// Recipients are resolved when the notification is recorded, from the
/// subject's interest set at that moment.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub recipients: Vec<ObjectId>,
    pub payload: Payload,
}

impl Notification {
    pub fn new(recipients: Vec<ObjectId>, payload: impl Into<Payload>) -> Self {
        Self {
            recipients,
            payload: payload.into(),
        }
    }

    pub const fn kind(&self) -> NotificationKind {
        self.payload.kind()
    }
}

//! Error types for world operations.
//!
//! None of these are fatal to the simulation: tick passes treat misses as
//! no-ops, and ingress handlers log and hand the error back to the transport
//! task that called them.

use crate::pathfinding::PathError;
use crate::spatial::OctreeError;
use meridian_event_system::{DispatchError, ObjectId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    /// Object lookup missed; usually the object despawned in the meantime
    #[error("Object not found: {0}")]
    NotFound(ObjectId),

    #[error("Teleport anchor not found: {0}")]
    TeleportNotFound(String),

    #[error("No path: {0}")]
    NoPath(#[from] PathError),

    /// Attack attempted without a resolvable range or damage
    #[error("Object {0} has no attack capability")]
    NoCapability(ObjectId),

    #[error("Target {target} is out of range ({distance:.2} > {range:.2})")]
    OutOfRange {
        target: ObjectId,
        distance: f64,
        range: f64,
    },

    /// Ingress message could not be decoded or referenced an invalid subject
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Spatial index error: {0}")]
    OutOfBounds(#[from] OctreeError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

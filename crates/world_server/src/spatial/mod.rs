//! Spatial indexing for world objects.
//!
//! The world keeps every visible object in an [`Octree`] keyed by position.
//! The tree stores only object ids; the world registry owns the objects.

mod bounds;
mod octree;

#[cfg(test)]
mod tests;

pub use bounds::Bounds;
pub use octree::{NodeHandle, Octree, OctreeError, OctreeStats, MAX_DEPTH};

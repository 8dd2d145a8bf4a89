//! # World Server - Authoritative Simulation Core
//!
//! Tracks every object in a game world, answers proximity queries through an
//! octree, drives NPC patrol and combat on a fixed tick, and records
//! notifications for the players that can see each change.
//!
//! ## Architecture Overview
//!
//! * [`spatial`] - Octree over object ids
//! * [`entity`] - Entity/item templates, stat resolution and the built-in catalog
//! * [`object`] - Live objects and their per-object state
//! * [`pathfinding`] - The [`PathFinder`] seam and the grid A* behind it
//! * [`world`] - The world context: registry, interest sets, tick passes, ingress
//! * [`scheduler`] - Fixed-rate driver publishing through the dispatch fabric
//!
//! ### Flow
//!
//! 1. The [`Simulation`] tick loop takes the world write lock and calls [`World::tick`]
//! 2. Tick passes mutate objects and record notifications in the world outbox
//! 3. The outbox is drained and the lock released
//! 4. Notifications are published onto the typed queues of `meridian_event_system`
//!
//! Player input follows the same path through [`Simulation::handle_action`].
//!
//! ## Time
//!
//! Deadlines are [`SimTime`] milliseconds. The scheduler feeds wall-clock
//! time since startup; tests drive [`World::tick`] with virtual time.

pub mod config;
pub mod entity;
pub mod error;
pub mod object;
pub mod pathfinding;
pub mod scheduler;
pub mod spatial;
pub mod world;

#[cfg(test)]
mod tests;

pub use config::WorldConfig;
pub use error::WorldError;
pub use object::{GameObject, NpcState, ObjectKind, Waypoint};
pub use pathfinding::{NavGrid, PathError, PathFinder};
pub use scheduler::Simulation;
pub use world::{Action, LevelDescription, World, WorldStats};

/// Simulation time in milliseconds since the world started.
pub type SimTime = u64;

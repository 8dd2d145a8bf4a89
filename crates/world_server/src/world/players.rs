//! Player sessions entering and leaving the world.

use super::World;
use crate::entity::catalog;
use crate::error::WorldError;
use crate::object::GameObject;
use meridian_event_system::{DestroyObject, ObjectBatch, ObjectId, ObjectRole, Spawn, Vector3};
use tracing::info;

const ENTRY_TELEPORT: &str = "main";

impl World {
    /// Spawns a player avatar at the `main` anchor.
    ///
    /// The player receives one batch with itself and everything around it;
    /// nearby players receive a spawn of the newcomer.
    pub fn connect_player(&mut self, id: Option<ObjectId>) -> Result<ObjectId, WorldError> {
        let anchor = self.find_teleport(ENTRY_TELEPORT)?;
        let position = anchor.position;
        let rotation = Vector3::new(0.0, anchor.rotation.y, 0.0);
        let id = id.unwrap_or_else(ObjectId::generate);

        let player = GameObject::player(id.clone(), catalog::player(), position, rotation);
        self.insert(player)?;

        let Some(player) = self.objects.get(&id) else {
            return Err(WorldError::NotFound(id));
        };
        let mut batch = ObjectBatch {
            objects: vec![player.snapshot(true)],
            states: Vec::new(),
        };
        let mut observers = Vec::new();
        for neighbor in player.neighbors.iter().filter_map(|n| self.objects.get(n)) {
            match neighbor.role {
                ObjectRole::Player => {
                    observers.push(neighbor.id.clone());
                    batch.objects.push(neighbor.snapshot(false));
                }
                ObjectRole::Npc | ObjectRole::Loot => batch.objects.push(neighbor.snapshot(false)),
                ObjectRole::VariantMapObject => batch.states.push(neighbor.variation_state()),
            }
        }
        let announcement = player.snapshot(false);

        info!(
            "🎮 Player {} connected ({} objects in view)",
            id,
            batch.objects.len() - 1
        );
        self.emit(vec![id.clone()], Spawn::Batch(batch));
        self.emit(observers, Spawn::Object(announcement));
        Ok(id)
    }

    /// Removes a player and tells the players around it.
    pub fn disconnect_player(&mut self, id: &ObjectId) -> Result<(), WorldError> {
        if !self.objects.get(id).is_some_and(|o| o.is_player()) {
            return Err(WorldError::NotFound(id.clone()));
        }
        let recipients = self.observers(id);
        self.remove(id);
        info!("👋 Player {} disconnected", id);
        self.emit(
            recipients,
            DestroyObject {
                object_id: id.clone(),
            },
        );
        Ok(())
    }
}

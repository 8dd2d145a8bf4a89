//! Map-object timers: variation changes and despawns.

use super::World;
use meridian_event_system::{DestroyObject, ObjectId, VariationChange};
use tracing::debug;

impl World {
    /// Applies variation changes whose deadline has elapsed.
    pub(super) fn variation_pass(&mut self) {
        let now = self.now;
        let due: Vec<ObjectId> = self
            .objects
            .values()
            .filter(|o| o.next_variation.is_some_and(|v| v.at <= now))
            .map(|o| o.id.clone())
            .collect();

        for id in due {
            let Some(object) = self.objects.get_mut(&id) else {
                continue;
            };
            let Some(change) = object.next_variation.take() else {
                continue;
            };
            if change.reset_health {
                object.entity.health = object.entity.max_health;
            }
            object.variation_index = change.variation_index;
            debug!("{} switched to variation {}", id, change.variation_index);
            self.emit_variation(&id);
        }
    }

    /// Removes objects whose destroy deadline has elapsed.
    pub(super) fn destroy_pass(&mut self) {
        let now = self.now;
        let due: Vec<ObjectId> = self
            .objects
            .values()
            .filter(|o| o.destroy_at.is_some_and(|at| at <= now))
            .map(|o| o.id.clone())
            .collect();

        for id in due {
            let recipients = self.observers(&id);
            if self.remove(&id).is_some() {
                self.emit(recipients, DestroyObject { object_id: id });
            }
        }
    }

    pub(super) fn emit_variation(&mut self, id: &ObjectId) {
        let Some(variation_index) = self.objects.get(id).map(|o| o.variation_index) else {
            return;
        };
        let recipients = self.observers(id);
        self.emit(
            recipients,
            VariationChange {
                object_id: id.clone(),
                variation_index,
            },
        );
    }
}

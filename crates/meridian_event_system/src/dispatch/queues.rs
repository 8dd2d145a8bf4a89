//! Per-kind bounded queues and the publishing handle.

use super::{DispatchError, Envelope};
use crate::events::{
    Animation, Damage, DestroyObject, InteractQueued, Notification, NotificationKind, Payload,
    PlaySound, Spawn, Teleport, Transform, TransformRotation, VariationChange,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

/// Publishing side of the fabric.
///
/// Cheap to clone; every clone feeds the same queues. The queues close once
/// all clones are dropped.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    spawn: mpsc::Sender<Envelope<Spawn>>,
    destroy: mpsc::Sender<Envelope<DestroyObject>>,
    movement: mpsc::Sender<Envelope<Transform>>,
    variation: mpsc::Sender<Envelope<VariationChange>>,
    animation: mpsc::Sender<Envelope<Animation>>,
    damage: mpsc::Sender<Envelope<Damage>>,
    rotation: mpsc::Sender<Envelope<TransformRotation>>,
    teleport: mpsc::Sender<Envelope<Teleport>>,
    sound: mpsc::Sender<Envelope<PlaySound>>,
    interact_queue: mpsc::Sender<Envelope<InteractQueued>>,
    published: Arc<[AtomicU64; 10]>,
}

/// Consuming side of the fabric, handed to [`super::spawn_consumers`].
#[derive(Debug)]
pub struct DispatchReceivers {
    pub spawn: mpsc::Receiver<Envelope<Spawn>>,
    pub destroy: mpsc::Receiver<Envelope<DestroyObject>>,
    pub movement: mpsc::Receiver<Envelope<Transform>>,
    pub variation: mpsc::Receiver<Envelope<VariationChange>>,
    pub animation: mpsc::Receiver<Envelope<Animation>>,
    pub damage: mpsc::Receiver<Envelope<Damage>>,
    pub rotation: mpsc::Receiver<Envelope<TransformRotation>>,
    pub teleport: mpsc::Receiver<Envelope<Teleport>>,
    pub sound: mpsc::Receiver<Envelope<PlaySound>>,
    pub interact_queue: mpsc::Receiver<Envelope<InteractQueued>>,
}

/// Count of notifications accepted per queue since startup.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchStats {
    pub per_kind: Vec<(NotificationKind, u64)>,
    pub total: u64,
}

/// Creates the ten bounded queues, each holding at most `capacity` envelopes.
///
/// # Arguments
///
/// * `capacity` - Per-queue bound; clamped to at least 1
///
/// # Returns
///
/// The publishing handle and the receivers for the consumer tasks.
pub fn dispatch_channels(capacity: usize) -> (Dispatcher, DispatchReceivers) {
    let capacity = capacity.max(1);
    let (spawn_tx, spawn_rx) = mpsc::channel(capacity);
    let (destroy_tx, destroy_rx) = mpsc::channel(capacity);
    let (movement_tx, movement_rx) = mpsc::channel(capacity);
    let (variation_tx, variation_rx) = mpsc::channel(capacity);
    let (animation_tx, animation_rx) = mpsc::channel(capacity);
    let (damage_tx, damage_rx) = mpsc::channel(capacity);
    let (rotation_tx, rotation_rx) = mpsc::channel(capacity);
    let (teleport_tx, teleport_rx) = mpsc::channel(capacity);
    let (sound_tx, sound_rx) = mpsc::channel(capacity);
    let (interact_tx, interact_rx) = mpsc::channel(capacity);

    let dispatcher = Dispatcher {
        spawn: spawn_tx,
        destroy: destroy_tx,
        movement: movement_tx,
        variation: variation_tx,
        animation: animation_tx,
        damage: damage_tx,
        rotation: rotation_tx,
        teleport: teleport_tx,
        sound: sound_tx,
        interact_queue: interact_tx,
        published: Arc::new(Default::default()),
    };
    let receivers = DispatchReceivers {
        spawn: spawn_rx,
        destroy: destroy_rx,
        movement: movement_rx,
        variation: variation_rx,
        animation: animation_rx,
        damage: damage_rx,
        rotation: rotation_rx,
        teleport: teleport_rx,
        sound: sound_rx,
        interact_queue: interact_rx,
    };
    (dispatcher, receivers)
}

async fn send_typed<T>(
    sender: &mpsc::Sender<Envelope<T>>,
    kind: NotificationKind,
    recipients: Vec<crate::types::ObjectId>,
    payload: T,
) -> Result<(), DispatchError> {
    sender
        .send(Envelope { recipients, payload })
        .await
        .map_err(|_| DispatchError::QueueClosed(kind))
}

impl Dispatcher {
    /// Routes one notification to the queue of its kind.
    ///
    /// Waits for free capacity when the queue is full. Notifications with no
    /// recipients are dropped without touching the queue.
    pub async fn publish(&self, notification: Notification) -> Result<(), DispatchError> {
        let kind = notification.kind();
        if notification.recipients.is_empty() {
            trace!("Dropping '{}' notification without recipients", kind);
            return Ok(());
        }

        let recipients = notification.recipients;
        match notification.payload {
            Payload::Spawn(p) => send_typed(&self.spawn, kind, recipients, p).await,
            Payload::Destroy(p) => send_typed(&self.destroy, kind, recipients, p).await,
            Payload::Movement(p) => send_typed(&self.movement, kind, recipients, p).await,
            Payload::Variation(p) => send_typed(&self.variation, kind, recipients, p).await,
            Payload::Animation(p) => send_typed(&self.animation, kind, recipients, p).await,
            Payload::Damage(p) => send_typed(&self.damage, kind, recipients, p).await,
            Payload::Rotation(p) => send_typed(&self.rotation, kind, recipients, p).await,
            Payload::Teleport(p) => send_typed(&self.teleport, kind, recipients, p).await,
            Payload::Sound(p) => send_typed(&self.sound, kind, recipients, p).await,
            Payload::InteractQueue(p) => {
                send_typed(&self.interact_queue, kind, recipients, p).await
            }
        }?;

        self.published[kind as usize].fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Publishes a batch in order, stopping at the first closed queue.
    ///
    /// # Returns
    ///
    /// The number of notifications handed to a queue.
    pub async fn publish_all(
        &self,
        notifications: impl IntoIterator<Item = Notification>,
    ) -> Result<usize, DispatchError> {
        let mut count = 0;
        for notification in notifications {
            self.publish(notification).await?;
            count += 1;
        }
        Ok(count)
    }

    /// Snapshot of the publish counters.
    pub fn stats(&self) -> DispatchStats {
        let per_kind: Vec<(NotificationKind, u64)> = NotificationKind::ALL
            .iter()
            .map(|kind| (*kind, self.published[*kind as usize].load(Ordering::Relaxed)))
            .collect();
        let total = per_kind.iter().map(|(_, n)| n).sum();
        DispatchStats { per_kind, total }
    }
}

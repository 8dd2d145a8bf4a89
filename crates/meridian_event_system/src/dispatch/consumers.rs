//! Long-lived consumer tasks, one per queue.

use super::{DispatchReceivers, Envelope, NotificationSink};
use crate::events::{NotificationKind, Payload};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Join handles of the running consumer tasks.
///
/// Each task resolves to the number of deliveries it performed.
#[derive(Debug)]
pub struct ConsumerHandles {
    handles: Vec<(NotificationKind, JoinHandle<u64>)>,
}

impl ConsumerHandles {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Waits for every consumer to drain its queue and exit.
    ///
    /// Consumers only exit after all dispatchers are dropped, so drop them
    /// first.
    ///
    /// # Returns
    ///
    /// Total deliveries across all queues.
    pub async fn join_all(self) -> u64 {
        let (kinds, handles): (Vec<_>, Vec<_>) = self.handles.into_iter().unzip();
        let results = futures::future::join_all(handles).await;

        let mut total = 0;
        for (kind, result) in kinds.into_iter().zip(results) {
            match result {
                Ok(delivered) => total += delivered,
                Err(e) => error!("❌ Consumer for '{}' queue panicked: {}", kind, e),
            }
        }
        info!("✅ Notification consumers stopped after {} deliveries", total);
        total
    }

    /// Aborts every consumer without draining.
    pub fn abort_all(&self) {
        for (_, handle) in &self.handles {
            handle.abort();
        }
    }
}

/// Starts one consumer task per notification kind.
///
/// # Arguments
///
/// * `receivers` - Consuming ends created by [`super::dispatch_channels`]
/// * `sink` - Destination of every delivered payload
pub fn spawn_consumers(
    receivers: DispatchReceivers,
    sink: Arc<dyn NotificationSink>,
) -> ConsumerHandles {
    let DispatchReceivers {
        spawn,
        destroy,
        movement,
        variation,
        animation,
        damage,
        rotation,
        teleport,
        sound,
        interact_queue,
    } = receivers;

    let handles = vec![
        spawn_consumer(NotificationKind::Spawn, spawn, sink.clone()),
        spawn_consumer(NotificationKind::Destroy, destroy, sink.clone()),
        spawn_consumer(NotificationKind::Movement, movement, sink.clone()),
        spawn_consumer(NotificationKind::Variation, variation, sink.clone()),
        spawn_consumer(NotificationKind::Animation, animation, sink.clone()),
        spawn_consumer(NotificationKind::Damage, damage, sink.clone()),
        spawn_consumer(NotificationKind::Rotation, rotation, sink.clone()),
        spawn_consumer(NotificationKind::Teleport, teleport, sink.clone()),
        spawn_consumer(NotificationKind::Sound, sound, sink.clone()),
        spawn_consumer(NotificationKind::InteractQueue, interact_queue, sink),
    ];

    info!("📨 Started {} notification consumers", handles.len());
    ConsumerHandles { handles }
}

fn spawn_consumer<T>(
    kind: NotificationKind,
    mut receiver: mpsc::Receiver<Envelope<T>>,
    sink: Arc<dyn NotificationSink>,
) -> (NotificationKind, JoinHandle<u64>)
where
    T: Into<Payload> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut delivered = 0u64;
        while let Some(envelope) = receiver.recv().await {
            let payload: Payload = envelope.payload.into();
            for recipient in &envelope.recipients {
                if !sink.is_recipient_active(recipient).await {
                    debug!("Skipping '{}' notification for inactive {}", kind, recipient);
                    continue;
                }
                match sink.deliver(recipient, &payload).await {
                    Ok(()) => delivered += 1,
                    Err(e) => error!(
                        "❌ Failed to deliver '{}' notification to {}: {}",
                        kind, recipient, e
                    ),
                }
            }
        }
        debug!("'{}' queue closed after {} deliveries", kind, delivered);
        delivered
    });
    (kind, handle)
}

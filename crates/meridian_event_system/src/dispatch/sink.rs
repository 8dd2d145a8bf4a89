use crate::events::Payload;
use crate::types::ObjectId;
use async_trait::async_trait;

/// Delivery seam between the dispatch fabric and whatever transport is
/// attached to the server.
///
/// Implemented by the connection layer in production and by recording mocks
/// in tests. A consumer calls [`deliver`](NotificationSink::deliver) once per
/// recipient of each envelope, in queue order.
#[async_trait]
pub trait NotificationSink: Send + Sync + std::fmt::Debug {
    /// Deliver a payload to one player.
    async fn deliver(&self, recipient: &ObjectId, payload: &Payload) -> Result<(), String>;

    /// Whether the recipient can still receive payloads.
    async fn is_recipient_active(&self, _recipient: &ObjectId) -> bool {
        true
    }
}

//! Stand-in transport that writes every delivery to the log.
//!
//! The server ships without a network layer; this sink is attached to the
//! dispatch consumers so the notification stream can be inspected with
//! `RUST_LOG=lib_meridian=trace`.

use meridian_event_system::{async_trait, NotificationSink, ObjectId, Payload};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

#[derive(Debug, Default)]
pub struct LoggingSink {
    delivered: AtomicU64,
    bytes: AtomicU64,
}

impl LoggingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliveries made so far.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Encoded payload bytes written so far.
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl NotificationSink for LoggingSink {
    async fn deliver(&self, recipient: &ObjectId, payload: &Payload) -> Result<(), String> {
        let encoded = payload.to_json().map_err(|e| e.to_string())?;
        self.delivered.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(encoded.len() as u64, Ordering::Relaxed);

        debug!("📨 {} <- {} ({} bytes)", recipient, payload.kind(), encoded.len());
        trace!("{}", String::from_utf8_lossy(&encoded));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_event_system::DestroyObject;

    #[tokio::test]
    async fn test_counts_deliveries_and_bytes() {
        let sink = LoggingSink::new();
        let payload = Payload::from(DestroyObject {
            object_id: ObjectId::from("npc-1"),
        });
        let expected = payload.to_json().unwrap().len() as u64;

        sink.deliver(&ObjectId::from("p1"), &payload).await.unwrap();
        sink.deliver(&ObjectId::from("p2"), &payload).await.unwrap();

        assert_eq!(sink.delivered(), 2);
        assert_eq!(sink.bytes(), expected * 2);
        assert!(sink.is_recipient_active(&ObjectId::from("p1")).await);
    }
}

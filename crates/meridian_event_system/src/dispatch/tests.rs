use super::*;
use crate::events::{
    Damage, DestroyObject, InteractQueued, Notification, NotificationKind, Payload, Transform,
};
use crate::types::{ObjectId, Vector3};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct RecordingSink {
    delivered: Mutex<Vec<(ObjectId, Payload)>>,
    inactive: Vec<ObjectId>,
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, recipient: &ObjectId, payload: &Payload) -> Result<(), String> {
        self.delivered
            .lock()
            .unwrap()
            .push((recipient.clone(), payload.clone()));
        Ok(())
    }

    async fn is_recipient_active(&self, recipient: &ObjectId) -> bool {
        !self.inactive.contains(recipient)
    }
}

fn destroy(recipients: &[&str], object: &str) -> Notification {
    Notification::new(
        recipients.iter().map(|r| ObjectId::from(*r)).collect(),
        DestroyObject {
            object_id: ObjectId::from(object),
        },
    )
}

fn movement(recipient: &str, object: &str, x: f64) -> Notification {
    Notification::new(
        vec![ObjectId::from(recipient)],
        Transform {
            object_id: ObjectId::from(object),
            position: Vector3::new(x, 0.0, 0.0),
            rotation: Vector3::zero(),
            speed: 2.0,
        },
    )
}

#[tokio::test]
async fn test_each_recipient_receives_payload_once() {
    let sink = Arc::new(RecordingSink::default());
    let (dispatcher, receivers) = dispatch_channels(8);
    let consumers = spawn_consumers(receivers, sink.clone());

    dispatcher.publish(destroy(&["p1", "p2"], "npc")).await.unwrap();
    drop(dispatcher);
    let total = consumers.join_all().await;

    assert_eq!(total, 2);
    let delivered = sink.delivered.lock().unwrap();
    let recipients: Vec<&str> = delivered.iter().map(|(r, _)| r.as_str()).collect();
    assert_eq!(recipients, vec!["p1", "p2"]);
    assert!(delivered
        .iter()
        .all(|(_, p)| p.kind() == NotificationKind::Destroy));
}

#[tokio::test]
async fn test_queue_preserves_fifo_order() {
    let sink = Arc::new(RecordingSink::default());
    let (dispatcher, receivers) = dispatch_channels(4);
    let consumers = spawn_consumers(receivers, sink.clone());

    let batch = (0..20).map(|i| movement("p1", "npc", i as f64));
    assert_eq!(dispatcher.publish_all(batch).await.unwrap(), 20);
    drop(dispatcher);
    consumers.join_all().await;

    let delivered = sink.delivered.lock().unwrap();
    let xs: Vec<f64> = delivered
        .iter()
        .filter_map(|(_, p)| match p {
            Payload::Movement(t) => Some(t.position.x),
            _ => None,
        })
        .collect();
    assert_eq!(xs, (0..20).map(|i| i as f64).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_full_queue_applies_backpressure() {
    let (dispatcher, mut receivers) = dispatch_channels(1);

    dispatcher.publish(destroy(&["p1"], "a")).await.unwrap();
    let blocked = tokio::time::timeout(
        Duration::from_millis(50),
        dispatcher.publish(destroy(&["p1"], "b")),
    )
    .await;
    assert!(blocked.is_err(), "second publish should wait for capacity");

    // Other queues are unaffected by a full destroy queue
    let other = tokio::time::timeout(
        Duration::from_millis(50),
        dispatcher.publish(movement("p1", "a", 1.0)),
    )
    .await;
    assert!(other.is_ok());

    let first = receivers.destroy.recv().await.unwrap();
    assert_eq!(first.payload.object_id, ObjectId::from("a"));
    dispatcher.publish(destroy(&["p1"], "b")).await.unwrap();
}

#[tokio::test]
async fn test_publish_to_closed_queue_fails() {
    let (dispatcher, receivers) = dispatch_channels(4);
    drop(receivers);

    let result = dispatcher.publish(destroy(&["p1"], "a")).await;
    assert_eq!(
        result,
        Err(DispatchError::QueueClosed(NotificationKind::Destroy))
    );
}

#[tokio::test]
async fn test_notifications_without_recipients_are_dropped() {
    let (dispatcher, mut receivers) = dispatch_channels(4);

    dispatcher.publish(destroy(&[], "a")).await.unwrap();
    assert!(receivers.destroy.try_recv().is_err());
    assert_eq!(dispatcher.stats().total, 0);
}

#[tokio::test]
async fn test_stats_count_per_kind() {
    let (dispatcher, _receivers) = dispatch_channels(8);

    dispatcher.publish(destroy(&["p1"], "a")).await.unwrap();
    dispatcher.publish(destroy(&["p1"], "b")).await.unwrap();
    dispatcher
        .publish(Notification::new(
            vec![ObjectId::from("p1")],
            Damage {
                object_id: ObjectId::from("a"),
                amount: 3,
                is_crit: false,
                health_current: 7,
                health_max: 10,
            },
        ))
        .await
        .unwrap();

    let stats = dispatcher.stats();
    assert_eq!(stats.total, 3);
    assert!(stats
        .per_kind
        .contains(&(NotificationKind::Destroy, 2)));
    assert!(stats.per_kind.contains(&(NotificationKind::Damage, 1)));
}

#[tokio::test]
async fn test_inactive_recipients_are_skipped() {
    let sink = Arc::new(RecordingSink {
        delivered: Mutex::new(Vec::new()),
        inactive: vec![ObjectId::from("gone")],
    });
    let (dispatcher, receivers) = dispatch_channels(4);
    let consumers = spawn_consumers(receivers, sink.clone());

    dispatcher
        .publish(Notification::new(
            vec![ObjectId::from("gone"), ObjectId::from("here")],
            InteractQueued {
                object_id: ObjectId::from("tree"),
            },
        ))
        .await
        .unwrap();
    drop(dispatcher);

    assert_eq!(consumers.join_all().await, 1);
    let delivered = sink.delivered.lock().unwrap();
    assert_eq!(delivered[0].0, ObjectId::from("here"));
}

//! # Typed Dispatch Fabric
//!
//! Notifications produced by the simulation travel from the world's outbox to
//! observers through one bounded queue per [`NotificationKind`]. Each queue is
//! strongly typed on its payload and is drained by a dedicated long-lived
//! consumer task which hands every payload to the attached
//! [`NotificationSink`] once per recipient.
//!
//! ```text
//!   scheduler / ingress ──publish──► [spawn queue]    ──► consumer ──► sink
//!                                    [destroy queue]  ──► consumer ──► sink
//!                                    [movement queue] ──► consumer ──► sink
//!                                          ...
//! ```
//!
//! ## Guarantees
//!
//! - FIFO order within a single queue. There is no ordering across queues.
//! - Publishing awaits free capacity, so a slow sink eventually stalls the
//!   publisher instead of growing memory without bound.
//! - Consumers exit once every [`Dispatcher`] clone has been dropped and their
//!   queue is drained.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use meridian_event_system::dispatch::{dispatch_channels, spawn_consumers};
//! # use meridian_event_system::dispatch::NotificationSink;
//! # async fn run(sink: std::sync::Arc<dyn NotificationSink>) {
//! let (dispatcher, receivers) = dispatch_channels(1024);
//! let consumers = spawn_consumers(receivers, sink);
//! // hand `dispatcher` to the scheduler, then on shutdown:
//! drop(dispatcher);
//! consumers.join_all().await;
//! # }
//! ```

mod consumers;
mod queues;
mod sink;

#[cfg(test)]
mod tests;

pub use consumers::{spawn_consumers, ConsumerHandles};
pub use queues::{dispatch_channels, DispatchReceivers, DispatchStats, Dispatcher};
pub use sink::NotificationSink;

use crate::events::NotificationKind;
use crate::types::ObjectId;

/// A payload of type `T` on its way to a set of recipients.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub recipients: Vec<ObjectId>,
    pub payload: T,
}

/// Errors raised by the dispatch fabric.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    /// The consumer side of a queue is gone; nothing published on it will be delivered
    #[error("Notification queue '{0}' is closed")]
    QueueClosed(NotificationKind),
    /// The sink could not deliver a payload to a recipient
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

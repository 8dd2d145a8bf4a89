//! # Meridian Event System
//!
//! Shared vocabulary of the Meridian world server: object identifiers, vector
//! math, the notification payloads the simulation emits, and the typed,
//! bounded dispatch fabric that carries those payloads to observers.
//!
//! ## Core Features
//!
//! - **Typed Queues**: one bounded queue per notification kind, FIFO within a
//!   queue
//! - **Backpressure**: publishing waits for capacity instead of buffering
//!   without bound
//! - **Snapshot Payloads**: notifications never borrow world state
//! - **Transport Seam**: the [`NotificationSink`] trait is the only thing a
//!   network layer has to implement
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meridian_event_system::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct PrintSink;
//!
//! #[async_trait::async_trait]
//! impl NotificationSink for PrintSink {
//!     async fn deliver(&self, recipient: &ObjectId, payload: &Payload) -> Result<(), String> {
//!         println!("{recipient} <- {:?}", payload.kind());
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (dispatcher, receivers) = dispatch_channels(1024);
//!     let consumers = spawn_consumers(receivers, Arc::new(PrintSink));
//!
//!     dispatcher
//!         .publish(Notification::new(
//!             vec![ObjectId::from("player-1")],
//!             DestroyObject { object_id: ObjectId::from("object-7") },
//!         ))
//!         .await?;
//!
//!     drop(dispatcher);
//!     consumers.join_all().await;
//!     Ok(())
//! }
//! ```

pub mod dispatch;
pub mod events;
pub mod shutdown;
pub mod types;

pub use dispatch::{
    dispatch_channels, spawn_consumers, ConsumerHandles, DispatchError, DispatchReceivers,
    DispatchStats, Dispatcher, Envelope, NotificationSink,
};
pub use events::*;
pub use shutdown::ShutdownState;
pub use types::{ObjectId, ObjectRole, Vector3};

// Re-exported so sink implementors share the crate's version
pub use async_trait::async_trait;

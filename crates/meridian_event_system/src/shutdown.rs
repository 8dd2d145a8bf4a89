//! Shutdown coordination between the tick scheduler and the notification
//! consumers.
//!
//! Shutdown happens in two phases. Once initiated, the scheduler stops
//! ticking. Once complete, the dispatch queues have drained and the process
//! may exit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Shared shutdown flags, cloned into every long-lived task.
#[derive(Debug, Clone, Default)]
pub struct ShutdownState {
    initiated: Arc<AtomicBool>,
    complete: Arc<AtomicBool>,
}

impl ShutdownState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once no further ticks should be run.
    pub fn is_shutdown_initiated(&self) -> bool {
        self.initiated.load(Ordering::Acquire)
    }

    /// True once pending notifications have been delivered.
    pub fn is_shutdown_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    /// Stops the scheduler after its current tick. Idempotent.
    pub fn initiate_shutdown(&self) {
        if !self.initiated.swap(true, Ordering::AcqRel) {
            info!("🛑 Shutdown initiated - simulation will stop after the current tick");
        }
    }

    /// Marks the notification queues as drained.
    pub fn complete_shutdown(&self) {
        self.complete.store(true, Ordering::Release);
        info!("✅ Pending notifications delivered - ready for final cleanup");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let state = ShutdownState::new();
        let clone = state.clone();
        assert!(!clone.is_shutdown_initiated());

        state.initiate_shutdown();
        state.initiate_shutdown();
        assert!(clone.is_shutdown_initiated());
        assert!(!clone.is_shutdown_complete());

        clone.complete_shutdown();
        assert!(state.is_shutdown_complete());
    }
}

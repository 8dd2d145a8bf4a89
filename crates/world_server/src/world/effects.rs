//! Scheduled effects.
//!
//! Work that must happen some time after the action that caused it (NPC
//! damage landing mid-swing, a dead player coming back) is queued here and
//! applied by the tick that first sees it due. Entries carry ids only; the
//! world re-checks that the effect still makes sense when it fires.

use crate::SimTime;
use meridian_event_system::ObjectId;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// `source` hits `target` with its current max damage
    DelayedDamage { source: ObjectId, target: ObjectId },
    /// Restore a dead player at the main teleport anchor
    PlayerRevive { player: ObjectId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Scheduled {
    due: SimTime,
    seq: u64,
    effect: Effect,
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Equal due times fire in scheduling order
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of effects keyed by due time.
#[derive(Debug, Default)]
pub struct EffectQueue {
    heap: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl EffectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: SimTime, effect: Effect) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Scheduled { due, seq, effect }));
    }

    /// Removes and returns the earliest effect due at or before `now`.
    pub fn pop_due(&mut self, now: SimTime) -> Option<Effect> {
        if self.heap.peek()?.0.due > now {
            return None;
        }
        self.heap.pop().map(|Reverse(entry)| entry.effect)
    }

    pub fn next_due(&self) -> Option<SimTime> {
        self.heap.peek().map(|Reverse(entry)| entry.due)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revive(id: &str) -> Effect {
        Effect::PlayerRevive {
            player: ObjectId::from(id),
        }
    }

    #[test]
    fn test_effects_pop_in_due_then_schedule_order() {
        let mut queue = EffectQueue::new();
        queue.schedule(300, revive("c"));
        queue.schedule(100, revive("a"));
        queue.schedule(100, revive("b"));
        assert_eq!(queue.next_due(), Some(100));

        assert_eq!(queue.pop_due(99), None);
        assert_eq!(queue.pop_due(100), Some(revive("a")));
        assert_eq!(queue.pop_due(100), Some(revive("b")));
        assert_eq!(queue.pop_due(299), None);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop_due(1_000), Some(revive("c")));
        assert!(queue.is_empty());
    }
}

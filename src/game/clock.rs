//! Virtual-time timer queue.
//!
//! Every delay in a round (spawn attempts, occupant lifetimes, enter/exit
//! transitions, the countdown) is a [`TimerEvent`] parked here until the host
//! advances time past its due instant. Handles are cancellable; a cancelled
//! timer is removed from the queue and can never fire.

use std::collections::BTreeMap;

use super::{HoleId, OccupantKind};

/// Handle to a scheduled timer. Ordering is (due time, scheduling order).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId {
    due_ms: u64,
    seq: u64,
}

impl TimerId {
    pub fn due_ms(&self) -> u64 {
        self.due_ms
    }
}

/// Payload delivered when a timer fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    SpawnAttempt { hole: HoleId, kind: OccupantKind },
    Lifetime { hole: HoleId, serial: u32 },
    TransitionDone { hole: HoleId, serial: u32 },
    CountdownTick,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_seq: u64,
    pending: BTreeMap<TimerId, TimerEvent>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn schedule(&mut self, delay_ms: u64, event: TimerEvent) -> TimerId {
        let id = TimerId {
            due_ms: self.now_ms.saturating_add(delay_ms),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.pending.insert(id, event);
        id
    }

    /// Returns true if the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Cancels the handle stored in `slot`, leaving `None` behind.
    pub fn cancel_slot(&mut self, slot: &mut Option<TimerId>) {
        if let Some(id) = slot.take() {
            self.cancel(id);
        }
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Next timer due at or before `until_ms`, removed from the queue. The clock
    /// jumps to the fired timer's due instant so follow-up timers scheduled from
    /// its callback are relative to when it fired, not to `until_ms`.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerId, TimerEvent)> {
        let (&id, _) = self.pending.first_key_value()?;
        if id.due_ms > until_ms {
            return None;
        }
        let event = self.pending.remove(&id)?;
        self.now_ms = self.now_ms.max(id.due_ms);
        Some((id, event))
    }

    /// Moves the clock forward without firing anything. Never moves backwards.
    pub fn settle(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(hole: u16) -> TimerEvent {
        TimerEvent::SpawnAttempt {
            hole: HoleId(hole),
            kind: OccupantKind::Bruin,
        }
    }

    #[test]
    fn fires_in_due_order_then_scheduling_order() {
        let mut clock = Scheduler::new();
        clock.schedule(300, spawn(0));
        clock.schedule(100, spawn(1));
        clock.schedule(100, spawn(2));
        let fired: Vec<_> = std::iter::from_fn(|| clock.pop_due(1_000))
            .map(|(_, e)| e)
            .collect();
        assert_eq!(fired, vec![spawn(1), spawn(2), spawn(0)]);
        assert_eq!(clock.now_ms(), 300);
    }

    #[test]
    fn pop_due_respects_horizon() {
        let mut clock = Scheduler::new();
        clock.schedule(500, TimerEvent::CountdownTick);
        assert!(clock.pop_due(499).is_none());
        assert_eq!(clock.now_ms(), 0);
        assert!(clock.pop_due(500).is_some());
        assert_eq!(clock.now_ms(), 500);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut clock = Scheduler::new();
        let id = clock.schedule(10, TimerEvent::CountdownTick);
        let mut slot = Some(clock.schedule(20, spawn(3)));
        assert!(clock.cancel(id));
        assert!(!clock.cancel(id));
        clock.cancel_slot(&mut slot);
        assert!(slot.is_none());
        assert!(clock.pop_due(u64::MAX).is_none());
        assert_eq!(clock.pending_len(), 0);
    }

    #[test]
    fn follow_up_delays_are_relative_to_fire_time() {
        let mut clock = Scheduler::new();
        clock.schedule(1_000, TimerEvent::CountdownTick);
        let _ = clock.pop_due(5_000);
        let next = clock.schedule(1_000, TimerEvent::CountdownTick);
        assert_eq!(next.due_ms(), 2_000);
        clock.settle(5_000);
        clock.settle(10);
        assert_eq!(clock.now_ms(), 5_000);
    }
}

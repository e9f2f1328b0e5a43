//! `EventQueue` — sparse future-event queue over integer simulation time.
//!
//! # Why this shape
//!
//! Most of the simulator is idle at any given instant; only a handful of
//! timers (discovery rounds, metric windows, walk legs) are outstanding per
//! node.  A `BTreeMap` keyed by `(time, sequence)` gives O(log n) insert and
//! pop-min over exactly the outstanding events, and the sequence component
//! makes same-instant firing order identical to insertion order — which is
//! what keeps runs bit-reproducible.
//!
//! Cancellation is O(1): the event id is tombstoned, and the tree entry is
//! discarded unseen when its timestamp comes up.

use std::collections::{BTreeMap, HashSet};

use llt_core::SimTime;

/// Handle to a scheduled event, usable for cancellation.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct EventId(u64);

/// One event popped from the queue.
#[derive(Debug, PartialEq, Eq)]
pub struct Firing<E> {
    pub id: EventId,
    pub time: SimTime,
    pub payload: E,
}

/// A future-event queue mapping `(time, insertion seq)` → payload.
///
/// Generic over the payload so the scheduling core stays independent of what
/// the simulation actually does when an event fires.
pub struct EventQueue<E> {
    inner: BTreeMap<(SimTime, u64), E>,
    /// Sequence numbers of events still scheduled and not cancelled.
    live: HashSet<u64>,
    next_seq: u64,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self {
            inner: BTreeMap::new(),
            live: HashSet::new(),
            next_seq: 0,
        }
    }
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` to fire at absolute time `at`.
    pub fn schedule_at(&mut self, at: SimTime, payload: E) -> EventId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.inner.insert((at, seq), payload);
        self.live.insert(seq);
        EventId(seq)
    }

    /// Cancel a previously scheduled event.  O(1).
    ///
    /// Returns `false` if the event already fired or was already cancelled.
    pub fn cancel(&mut self, id: EventId) -> bool {
        self.live.remove(&id.0)
    }

    /// Remove and return the earliest live event, skipping cancelled slots.
    ///
    /// Returns `None` when the queue holds no live events.
    pub fn pop(&mut self) -> Option<Firing<E>> {
        while let Some(entry) = self.inner.pop_first() {
            let ((time, seq), payload) = entry;
            if !self.live.remove(&seq) {
                continue; // cancelled — drop unseen
            }
            return Some(Firing { id: EventId(seq), time, payload });
        }
        None
    }

    /// Timestamp of the earliest live event, or `None` if empty.
    pub fn next_time(&self) -> Option<SimTime> {
        self.inner
            .iter()
            .find(|((_, seq), _)| self.live.contains(seq))
            .map(|(&(time, _), _)| time)
    }

    /// Number of live (non-cancelled) pending events.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

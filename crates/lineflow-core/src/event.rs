//! Time-ordered queue of future simulation events.
//!
//! A binary min-heap keyed by `(time, seq)`. `seq` is a monotonic counter
//! assigned on insertion, so events scheduled for the same instant pop in the
//! order they were pushed. This makes simultaneous completions claim shared
//! downstream capacity in a fixed, reproducible order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::fixed::SimTime;
use crate::id::{EntityId, StationId};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// What happens when an event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// For a Source: the periodic generation tick. Otherwise: an entity
    /// delivered from upstream.
    Arrival,
    /// An entity finished service at the target station.
    ProcessEnd,
}

/// A scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub time: SimTime,
    pub kind: EventKind,
    pub station: StationId,
    /// Absent for Source generation ticks.
    pub entity: Option<EntityId>,
}

impl Event {
    pub fn arrival(time: SimTime, station: StationId, entity: Option<EntityId>) -> Self {
        Self {
            time,
            kind: EventKind::Arrival,
            station,
            entity,
        }
    }

    pub fn process_end(time: SimTime, station: StationId, entity: EntityId) -> Self {
        Self {
            time,
            kind: EventKind::ProcessEnd,
            station,
            entity: Some(entity),
        }
    }
}

/// Heap entry. Ordering looks only at `(time, seq)`.
#[derive(Debug, Clone, Copy)]
struct Scheduled {
    time: SimTime,
    seq: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

// ---------------------------------------------------------------------------
// EventQueue
// ---------------------------------------------------------------------------

/// Min-priority queue of events with FIFO tie-breaking.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event. O(log n).
    pub fn push(&mut self, event: Event) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Scheduled {
            time: event.time,
            seq,
            event,
        }));
    }

    /// Remove and return the earliest event. O(log n).
    pub fn pop(&mut self) -> Option<Event> {
        self.heap.pop().map(|Reverse(s)| s.event)
    }

    /// The earliest event without removing it.
    pub fn peek(&self) -> Option<&Event> {
        self.heap.peek().map(|Reverse(s)| &s.event)
    }

    /// Time of the earliest event.
    pub fn next_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|Reverse(s)| s.time)
    }

    /// Pop the earliest event if it is due at or before `limit`.
    pub fn pop_due(&mut self, limit: SimTime) -> Option<Event> {
        match self.next_time() {
            Some(t) if t <= limit => self.pop(),
            _ => None,
        }
    }

    /// Pop the earliest event if it is due strictly before `limit`.
    pub fn pop_before(&mut self, limit: SimTime) -> Option<Event> {
        match self.next_time() {
            Some(t) if t < limit => self.pop(),
            _ => None,
        }
    }

    /// Drop every pending event. The sequence counter keeps counting.
    pub fn clear(&mut self) {
        self.heap.clear();
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
    use crate::fixed::secs;
    use slotmap::SlotMap;

    fn stations(n: usize) -> Vec<StationId> {
        let mut map: SlotMap<StationId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn t(v: f64) -> SimTime {
        secs(v).unwrap()
    }

    #[test]
    fn pops_in_time_order() {
        let s = stations(1)[0];
        let mut q = EventQueue::new();
        q.push(Event::arrival(t(3.0), s, None));
        q.push(Event::arrival(t(1.0), s, None));
        q.push(Event::arrival(t(2.0), s, None));

        let times: Vec<SimTime> = std::iter::from_fn(|| q.pop()).map(|e| e.time).collect();
        assert_eq!(times, vec![t(1.0), t(2.0), t(3.0)]);
        assert!(q.is_empty());
    }

    #[test]
    fn equal_times_pop_in_insertion_order() {
        let ids = stations(5);
        let mut q = EventQueue::new();
        for &s in &ids {
            q.push(Event::arrival(t(1.0), s, None));
        }
        // Interleave an earlier event to disturb the heap layout.
        q.push(Event::arrival(t(0.5), ids[4], None));

        assert_eq!(q.pop().unwrap().time, t(0.5));
        let order: Vec<StationId> = std::iter::from_fn(|| q.pop()).map(|e| e.station).collect();
        assert_eq!(order, ids);
    }

    #[test]
    fn peek_and_len() {
        let s = stations(1)[0];
        let mut q = EventQueue::new();
        assert!(q.peek().is_none());
        q.push(Event::arrival(t(4.0), s, None));
        q.push(Event::arrival(t(2.0), s, None));
        assert_eq!(q.len(), 2);
        assert_eq!(q.peek().unwrap().time, t(2.0));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn pop_due_respects_limit() {
        let s = stations(1)[0];
        let mut q = EventQueue::new();
        q.push(Event::arrival(t(1.0), s, None));
        q.push(Event::arrival(t(2.0), s, None));

        assert!(q.pop_due(t(0.5)).is_none());
        assert_eq!(q.pop_due(t(1.0)).unwrap().time, t(1.0));
        assert!(q.pop_before(t(2.0)).is_none());
        assert_eq!(q.pop_due(t(2.0)).unwrap().time, t(2.0));
        assert!(q.pop_due(t(100.0)).is_none());
    }

    #[test]
    fn clear_empties_queue() {
        let s = stations(1)[0];
        let mut q = EventQueue::new();
        for i in 0..10 {
            q.push(Event::arrival(t(i as f64), s, None));
        }
        q.clear();
        assert!(q.is_empty());
        assert_eq!(q.len(), 0);
        assert!(q.pop().is_none());
    }
}

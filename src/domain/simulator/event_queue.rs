use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::domain::simulator::time::{snap_time, to_ticks};
use crate::domain::task::Task;

#[derive(Debug, Clone)]
pub enum EventKind {
    TaskArrival(Task),
}

/// An event waiting in the queue. Ordered by (tick, insertion sequence).
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub time_s: f64,
    tick: i64,
    seq: u64,
    pub kind: EventKind,
}

impl ScheduledEvent {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

// BinaryHeap is a max-heap, so the comparison is reversed to pop the earliest event first.
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        other.tick.cmp(&self.tick).then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick && self.seq == other.seq
    }
}

impl Eq for ScheduledEvent {}

/// Future event list of the simulation.
///
/// Timestamps are snapped onto the tick grid on insertion. Events with the same
/// snapped timestamp pop in insertion order.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<ScheduledEvent>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self { heap: BinaryHeap::new(), next_seq: 0 }
    }

    pub fn push(&mut self, time_s: f64, kind: EventKind) -> u64 {
        let time_s = snap_time(time_s);
        let seq = self.next_seq;
        self.next_seq += 1;

        self.heap.push(ScheduledEvent { time_s, tick: to_ticks(time_s), seq, kind });
        seq
    }

    pub fn pop(&mut self) -> Option<ScheduledEvent> {
        self.heap.pop()
    }

    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|event| event.time_s)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

use rand::Rng;
use rand::seq::index;

use crate::domain::learning::transition::Transition;

/// Fixed-capacity experience store. Once full, every push overwrites the oldest entry.
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    capacity: usize,
    buffer: Vec<Transition>,
    /// Slot the next push writes to once the buffer is full.
    position: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, buffer: Vec::with_capacity(capacity), position: 0 }
    }

    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(transition);
        } else {
            self.buffer[self.position] = transition;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    /// Uniform sample of `batch_size` distinct entries (fewer if the buffer holds fewer).
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, batch_size: usize) -> Vec<&Transition> {
        let amount = batch_size.min(self.buffer.len());
        index::sample(rng, self.buffer.len(), amount).into_iter().map(|i| &self.buffer[i]).collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        let split = if self.buffer.len() < self.capacity { 0 } else { self.position };
        self.buffer[split..].iter().chain(self.buffer[..split].iter())
    }
}

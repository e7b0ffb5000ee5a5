use std::collections::VecDeque;

use crate::synth::message::{SynthMessage, TimedMessage};

/// Pending events ordered by sample offset.
///
/// Offsets are relative to the start of the next `tick` window. Events with
/// equal offsets keep their arrival order.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: VecDeque<TimedMessage>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, event: TimedMessage) {
        let at = self.queue.partition_point(|e| e.offset <= event.offset);
        self.queue.insert(at, event);
    }

    /// Pop the next event due at or before `sample`.
    pub fn pop_due(&mut self, sample: usize) -> Option<SynthMessage> {
        match self.queue.front() {
            Some(event) if event.offset <= sample => self.queue.pop_front().map(|e| e.message),
            _ => None,
        }
    }

    /// Move the window forward by `frames`; remaining offsets are rebased.
    pub fn tick(&mut self, frames: usize) {
        for event in &mut self.queue {
            event.offset = event.offset.saturating_sub(frames);
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

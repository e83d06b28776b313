// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Pending queue of events not yet accepted by the session store

use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::core::Event;

/// FIFO of undelivered events. Drain and requeue are atomic with respect
/// to concurrent pushes.
#[derive(Debug, Default)]
pub struct PendingQueue {
    events: Mutex<VecDeque<Event>>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Event) {
        self.events.lock().push_back(event);
    }

    /// Take every queued event, leaving the queue empty
    pub fn drain(&self) -> Vec<Event> {
        self.events.lock().drain(..).collect()
    }

    /// Put a failed batch back ahead of anything queued since it was drained
    pub fn requeue_front(&self, batch: Vec<Event>) {
        let mut events = self.events.lock();
        for event in batch.into_iter().rev() {
            events.push_front(event);
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EventType;
    use chrono::Utc;

    fn event(detail: &str) -> Event {
        Event::with_detail(EventType::FaceFound, Utc::now(), detail)
    }

    fn details(events: &[Event]) -> Vec<String> {
        events.iter().filter_map(|e| e.detail.clone()).collect()
    }

    #[test]
    fn test_drain_empties() {
        let queue = PendingQueue::new();
        queue.push(event("a"));
        queue.push(event("b"));
        assert_eq!(details(&queue.drain()), vec!["a", "b"]);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_requeue_goes_ahead_of_newer_events() {
        let queue = PendingQueue::new();
        queue.push(event("a"));
        queue.push(event("b"));
        let batch = queue.drain();

        queue.push(event("c"));
        queue.requeue_front(batch);
        queue.push(event("d"));

        assert_eq!(details(&queue.snapshot()), vec!["a", "b", "c", "d"]);
        assert_eq!(queue.len(), 4);
    }
}

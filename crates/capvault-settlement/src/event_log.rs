//! Bounded, append-only audit trail of committed events.
//!
//! Records carry a sequence number that keeps increasing across evictions,
//! so a reader can resume with [`EventLog::since`] and detect a gap when the
//! oldest retained sequence is past the one it expected.

use std::collections::VecDeque;

use capvault_types::{EventRecord, VaultEvent};

pub struct EventLog {
    /// Front = oldest.
    records: VecDeque<EventRecord>,
    next_sequence: u64,
    max_size: usize,
}

impl EventLog {
    /// Create a log retaining at most `max_size` records.
    ///
    /// # Panics
    /// Panics if `max_size` is zero.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        assert!(max_size > 0, "EventLog max_size must be > 0");
        Self {
            records: VecDeque::new(),
            next_sequence: 0,
            max_size,
        }
    }

    /// Append `event`, evicting the oldest record when full. Returns its sequence.
    pub fn publish(&mut self, event: VaultEvent) -> u64 {
        if self.records.len() >= self.max_size {
            self.records.pop_front();
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        tracing::debug!(sequence, kind = %event.kind(), "Event published");
        self.records.push_back(EventRecord::new(sequence, event));
        sequence
    }

    /// Retained records, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<EventRecord> {
        self.records.iter().cloned().collect()
    }

    /// Retained records with `sequence >= from`.
    #[must_use]
    pub fn since(&self, from: u64) -> Vec<EventRecord> {
        self.records
            .iter()
            .filter(|record| record.sequence >= from)
            .cloned()
            .collect()
    }

    /// Sequence the next published record will get.
    #[must_use]
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacity_event(new: u128) -> VaultEvent {
        VaultEvent::CapacityUpdated { old: 0, new }
    }

    #[test]
    fn sequences_are_monotonic() {
        let mut log = EventLog::new(10);
        assert_eq!(log.publish(capacity_event(1)), 0);
        assert_eq!(log.publish(capacity_event(2)), 1);
        assert_eq!(log.len(), 2);
        assert_eq!(log.next_sequence(), 2);
    }

    #[test]
    fn evicts_oldest() {
        let mut log = EventLog::new(3);
        for i in 0..5 {
            log.publish(capacity_event(i));
        }
        let records = log.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].sequence, 2);
        assert_eq!(records[2].sequence, 4);
    }

    #[test]
    fn since_filters_by_sequence() {
        let mut log = EventLog::new(10);
        for i in 0..4 {
            log.publish(capacity_event(i));
        }
        let tail = log.since(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].event, capacity_event(2));
        assert!(log.since(4).is_empty());
    }

    #[test]
    #[should_panic(expected = "max_size must be > 0")]
    fn zero_capacity_panics() {
        let _ = EventLog::new(0);
    }
}

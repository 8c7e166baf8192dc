//! Consumer-side polling API.
//!
//! Everything here is synchronous and returns immediately. An empty queue is
//! a normal outcome ([`NoteEvent::EMPTY`] or `None`), never an error.

use crate::state::SharedState;
use notepoll_core::{NoteEvent, NoteSnapshot, RawPacket, Result, SNAPSHOT_LEN};
use std::sync::Arc;

/// Queue occupancy and eviction counters at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    pub pending_events: usize,
    pub event_capacity: usize,
    pub events_evicted: u64,
    pub pending_raw: usize,
    pub raw_capacity: usize,
    pub raw_evicted: u64,
}

/// Polling handle for a game loop or UI thread. Clone is cheap.
#[derive(Clone)]
pub struct NotePoller {
    shared: Arc<SharedState>,
}

impl NotePoller {
    pub(crate) fn new(shared: Arc<SharedState>) -> Self {
        Self { shared }
    }

    /// Pop the oldest note event, or [`NoteEvent::EMPTY`] when none is queued.
    #[inline]
    pub fn drain_next_event(&self) -> NoteEvent {
        self.try_next_event().unwrap_or(NoteEvent::EMPTY)
    }

    #[inline]
    pub fn try_next_event(&self) -> Option<NoteEvent> {
        self.shared.lock().events.pop_front()
    }

    /// Every queued note event, oldest first.
    pub fn drain_events(&self) -> Vec<NoteEvent> {
        self.shared.lock().events.drain()
    }

    /// Oldest queued event in packed form, without removing it.
    pub fn peek_packed(&self) -> Option<u32> {
        self.shared.lock().events.peek_packed_u32()
    }

    /// Pop the oldest event in packed form; 0 when none is queued.
    pub fn drain_next_packed(&self) -> u32 {
        self.drain_next_event().packed_u32()
    }

    pub fn drain_next_raw(&self) -> Option<RawPacket> {
        self.shared.lock().raw.pop_front()
    }

    /// Velocities for note ids 1..=128; element `i` is note `i + 1`.
    pub fn snapshot_velocities(&self) -> [u8; SNAPSHOT_LEN] {
        self.shared.lock().table.snapshot_velocities()
    }

    pub fn snapshot_timestamps(&self) -> [f64; SNAPSHOT_LEN] {
        self.shared.lock().table.snapshot_timestamps()
    }

    /// Velocities and timestamps from the same instant.
    pub fn snapshot(&self) -> NoteSnapshot {
        self.shared.lock().table.snapshot()
    }

    /// Velocity at a raw table index (0..=129).
    pub fn query_velocity(&self, note_id: usize) -> Result<u8> {
        self.shared.lock().table.velocity(note_id)
    }

    pub fn query_timestamp(&self, note_id: usize) -> Result<f64> {
        self.shared.lock().table.timestamp(note_id)
    }

    /// Held notes as `(note_id, velocity)`.
    pub fn active_notes(&self) -> Vec<(usize, u8)> {
        self.shared.lock().table.active_notes().collect()
    }

    pub fn pending_events(&self) -> usize {
        self.shared.lock().events.len()
    }

    pub fn pending_raw(&self) -> usize {
        self.shared.lock().raw.len()
    }

    pub fn stats(&self) -> QueueStats {
        let state = self.shared.lock();
        QueueStats {
            pending_events: state.events.len(),
            event_capacity: state.events.capacity(),
            events_evicted: state.events.evicted(),
            pending_raw: state.raw.len(),
            raw_capacity: state.raw.capacity(),
            raw_evicted: state.raw.evicted(),
        }
    }
}

impl std::fmt::Debug for NotePoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotePoller")
            .field("shared", &self.shared)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::IngestEngine;
    use notepoll_core::Error;
    use std::num::NonZeroUsize;

    fn pair() -> (IngestEngine, NotePoller) {
        let cap = NonZeroUsize::new(4).unwrap();
        let shared = Arc::new(SharedState::new(cap, cap));
        (IngestEngine::new(shared.clone()), NotePoller::new(shared))
    }

    #[test]
    fn test_drain_empty_returns_sentinel() {
        let (_engine, poller) = pair();
        let before = poller.stats();

        let event = poller.drain_next_event();
        assert_eq!(event, NoteEvent::EMPTY);
        assert!(event.is_empty());
        assert_eq!(poller.drain_next_packed(), 0);
        assert_eq!(poller.try_next_event(), None);
        assert_eq!(poller.stats(), before);
    }

    #[test]
    fn test_drain_in_arrival_order() {
        let (engine, poller) = pair();
        engine.handle(0.1, &[144, 60, 100]);
        engine.handle(0.2, &[144, 64, 90]);

        assert_eq!(poller.pending_events(), 2);
        assert_eq!(poller.drain_next_event().note_id, 60);
        assert_eq!(poller.drain_next_event().note_id, 64);
        assert!(poller.drain_next_event().is_empty());
    }

    #[test]
    fn test_packed_views() {
        let (engine, poller) = pair();
        engine.handle(0.1, &[144, 60, 100]);

        assert_eq!(poller.peek_packed(), Some(0x903C_6400));
        assert_eq!(poller.pending_events(), 1);
        assert_eq!(poller.drain_next_packed(), 0x903C_6400);
        assert_eq!(poller.peek_packed(), None);
    }

    #[test]
    fn test_snapshots_follow_table() {
        let (engine, poller) = pair();
        engine.handle(0.5, &[144, 60, 100]);
        engine.handle(0.25, &[144, 1, 10]);

        let velocities = poller.snapshot_velocities();
        let timestamps = poller.snapshot_timestamps();
        for i in 0..SNAPSHOT_LEN {
            assert_eq!(velocities[i], poller.query_velocity(i + 1).unwrap());
            assert_eq!(timestamps[i], poller.query_timestamp(i + 1).unwrap());
        }
        assert_eq!(velocities[59], 100);
        assert_eq!(timestamps[0], 0.25);
        assert_eq!(poller.active_notes(), vec![(1, 10), (60, 100)]);

        let snapshot = poller.snapshot();
        assert_eq!(snapshot.velocities, velocities);
    }

    #[test]
    fn test_query_out_of_range() {
        let (engine, poller) = pair();
        engine.handle(0.5, &[144, 60, 100]);
        let before = poller.snapshot();

        assert_eq!(
            poller.query_velocity(130),
            Err(Error::IndexOutOfRange { note_id: 130 })
        );
        assert_eq!(poller.query_velocity(129), Ok(0));
        assert_eq!(poller.query_velocity(0), Ok(0));
        assert_eq!(poller.snapshot(), before);
    }

    #[test]
    fn test_raw_trace_drain() {
        let (engine, poller) = pair();
        engine.handle(0.0, &[0xFE]);
        engine.handle(0.1, &[144, 60, 100]);

        assert_eq!(poller.pending_raw(), 2);
        assert_eq!(poller.drain_next_raw().unwrap().status(), Some(0xFE));
        assert_eq!(poller.drain_next_raw().unwrap().status(), Some(144));
        assert!(poller.drain_next_raw().is_none());
    }

    #[test]
    fn test_stats_count_evictions() {
        let (engine, poller) = pair();
        for note in 60..66 {
            engine.handle(0.0, &[144, note, 100]);
        }

        let stats = poller.stats();
        assert_eq!(stats.pending_events, 4);
        assert_eq!(stats.event_capacity, 4);
        assert_eq!(stats.events_evicted, 2);
        assert_eq!(stats.raw_evicted, 2);

        let notes: Vec<_> = poller.drain_events().iter().map(|e| e.note_id).collect();
        assert_eq!(notes, vec![62, 63, 64, 65]);
    }
}

//! Shared note state: table plus both queues behind one lock.
//!
//! The producer (device callback) and the consumer (poller) only ever touch
//! these through [`SharedState::lock`], and each critical section is a handful
//! of array writes or ring-buffer operations. The lifecycle flag lives inside
//! the same lock so that a teardown can never interleave with an in-flight
//! update.

use notepoll_core::{BoundedQueue, NoteEvent, NoteTable, RawPacket};
use parking_lot::{Mutex, MutexGuard};
use std::num::NonZeroUsize;

pub(crate) struct BridgeState {
    pub(crate) active: bool,
    pub(crate) table: NoteTable,
    pub(crate) events: BoundedQueue<NoteEvent>,
    pub(crate) raw: BoundedQueue<RawPacket>,
}

pub(crate) struct SharedState {
    state: Mutex<BridgeState>,
}

impl SharedState {
    pub(crate) fn new(event_capacity: NonZeroUsize, raw_capacity: NonZeroUsize) -> Self {
        Self {
            state: Mutex::new(BridgeState {
                active: true,
                table: NoteTable::new(),
                events: BoundedQueue::new(event_capacity),
                raw: BoundedQueue::new(raw_capacity),
            }),
        }
    }

    #[inline]
    pub(crate) fn lock(&self) -> MutexGuard<'_, BridgeState> {
        self.state.lock()
    }

    pub(crate) fn is_active(&self) -> bool {
        self.state.lock().active
    }

    pub(crate) fn activate(&self) {
        self.state.lock().active = true;
    }

    /// Stop accepting packets and reset table, queues and eviction counters in
    /// one critical section.
    pub(crate) fn teardown(&self) {
        let mut state = self.state.lock();
        state.active = false;
        state.table.reset();
        state.events.reset();
        state.raw.reset();
    }
}

impl std::fmt::Debug for SharedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SharedState")
            .field("active", &state.active)
            .field("events", &state.events)
            .field("raw", &state.raw)
            .finish()
    }
}

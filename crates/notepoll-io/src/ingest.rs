//! Callback-side ingestion.
//!
//! [`IngestEngine::handle`] is what the device layer registers as its input
//! callback. It may run on any thread, at any rate, and must return promptly:
//! every packet is traced, note packets are decoded into the table and the
//! event queue, and anything malformed is dropped with a debug log.

use crate::state::SharedState;
use notepoll_core::{NoteEvent, RawPacket};
use std::sync::Arc;
use tracing::{debug, trace};

/// What happened to a single packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IngestOutcome {
    /// Recorded in the raw trace only (not a note message).
    Traced,
    /// Decoded, applied to the table and queued.
    Decoded(NoteEvent),
    /// Note message that could not be applied. Still traced.
    Rejected(notepoll_core::Error),
    /// The bridge has been torn down; the packet was dropped.
    Inactive,
}

/// Registration point for the device callback. Clone is cheap.
#[derive(Clone)]
pub struct IngestEngine {
    shared: Arc<SharedState>,
}

impl IngestEngine {
    pub(crate) fn new(shared: Arc<SharedState>) -> Self {
        Self { shared }
    }

    /// Device callback entry point. Never fails and never panics.
    #[inline]
    pub fn handle(&self, delta_time: f64, bytes: &[u8]) {
        let _ = self.ingest(delta_time, bytes);
    }

    /// Same as [`handle`](Self::handle), reporting the outcome.
    pub fn ingest(&self, delta_time: f64, bytes: &[u8]) -> IngestOutcome {
        // Decode and copy before taking the lock
        let decoded = NoteEvent::decode(bytes, delta_time);
        let packet = RawPacket::new(bytes, delta_time);

        let mut state = self.shared.lock();
        if !state.active {
            return IngestOutcome::Inactive;
        }

        let raw_evicted = state.raw.push(packet).is_some();
        let mut event_evicted = false;
        let outcome = match decoded {
            Ok(None) => IngestOutcome::Traced,
            Ok(Some(event)) => match state.table.apply(&event) {
                Ok(()) => {
                    event_evicted = state.events.push(event).is_some();
                    IngestOutcome::Decoded(event)
                }
                Err(e) => IngestOutcome::Rejected(e),
            },
            Err(e) => IngestOutcome::Rejected(e),
        };
        drop(state);

        if raw_evicted {
            trace!("Raw trace queue full, dropped oldest packet");
        }
        if event_evicted {
            trace!("Note event queue full, dropped oldest event");
        }
        if let IngestOutcome::Rejected(e) = outcome {
            debug!("Rejected MIDI packet {:02X?}: {}", bytes, e);
        }
        outcome
    }
}

impl std::fmt::Debug for IngestEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestEngine").finish_non_exhaustive()
    }
}

//! # notepoll - MIDI note-state bridge
//!
//! Turns callback-driven MIDI input into state a game loop or UI can poll.
//!
//! ## Architecture
//!
//! notepoll is an umbrella crate over:
//! - **notepoll-core** - Note events, the note table and bounded drop-oldest queues
//! - **notepoll-io** - Ingestion, the polling API, lifecycle and hardware I/O
//!
//! ## Quick Start
//!
//! ```ignore
//! use notepoll::prelude::*;
//!
//! let bridge = NoteBridge::builder().io().build()?;
//! bridge.connect(PortSelection::First)?;
//!
//! let poller = bridge.poller();
//! // every frame
//! let event = poller.drain_next_event();
//! let velocities = poller.snapshot_velocities();
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Hardware I/O enabled
//! - `midi-io` - Device enumeration and connection via midir

/// Re-export of notepoll-core for direct access
pub use notepoll_core as core;

/// Re-export of notepoll-io for direct access
pub use notepoll_io as io;

pub use notepoll_core::{
    BoundedQueue, NoteCode, NoteEvent, NoteSnapshot, NoteTable, RawPacket, DEFAULT_QUEUE_CAPACITY,
    NOTE_RANGE, SNAPSHOT_LEN, TABLE_SIZE,
};

pub use notepoll_io::{
    BridgeConfig, IngestEngine, IngestOutcome, NoteBridge, NoteBridgeBuilder, NotePoller,
    QueueStats,
};

#[cfg(feature = "midi-io")]
pub use notepoll_io::{MidiDevice, MidiOutputMessage, PortSelection};

mod error;
pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        BridgeConfig, IngestEngine, NoteBridge, NoteEvent, NotePoller, NoteSnapshot, Result,
        SNAPSHOT_LEN,
    };

    #[cfg(feature = "midi-io")]
    pub use crate::PortSelection;
}

//! MIDI note-state bridge.
//!
//! A device callback feeds packets into an [`IngestEngine`]; a game loop or UI
//! thread reads them back through a [`NotePoller`] at its own pace. Both share
//! a note table and two bounded, drop-oldest queues owned by a [`NoteBridge`].
//!
//! ```
//! use notepoll_io::NoteBridge;
//!
//! let bridge = NoteBridge::builder().build()?;
//! bridge.ingest_engine().handle(0.5, &[144, 60, 100]);
//!
//! let poller = bridge.poller();
//! assert_eq!(poller.query_velocity(60)?, 100);
//! assert_eq!(poller.drain_next_event().note_id, 60);
//! assert!(poller.drain_next_event().is_empty());
//! # Ok::<(), notepoll_io::Error>(())
//! ```
//!
//! Feature gates: `midi-io` (hardware I/O via midir, on by default).

pub mod error;
pub use error::{Error, Result};

mod state;

mod ingest;
pub use ingest::{IngestEngine, IngestOutcome};

mod poller;
pub use poller::{NotePoller, QueueStats};

mod bridge;
pub use bridge::{BridgeConfig, NoteBridge, NoteBridgeBuilder};

#[cfg(feature = "midi-io")]
pub(crate) mod io;

#[cfg(feature = "midi-io")]
pub use io::{MidiDevice, MidiOutputMessage, PortSelection};

pub use notepoll_core::{
    NoteCode, NoteEvent, NoteSnapshot, NoteTable, RawPacket, NOTE_RANGE, SNAPSHOT_LEN, TABLE_SIZE,
};
pub use notepoll_core::Error as NoteError;

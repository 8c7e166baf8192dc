//! Note-state types for notepoll.
//!
//! Pure data structures with no device access:
//!
//! - [`NoteEvent`]: a decoded note-on/note-off with its device delta-time
//! - [`NoteTable`]: last velocity and timestamp per note, indexed by raw note number
//! - [`BoundedQueue`]: fixed-capacity FIFO that drops the oldest item on overflow
//!
//! # Example
//!
//! ```
//! use notepoll_core::{NoteEvent, NoteTable};
//!
//! let mut table = NoteTable::new();
//! let event = NoteEvent::decode(&[0x90, 60, 100], 0.5).unwrap().unwrap();
//! table.apply(&event).unwrap();
//!
//! assert_eq!(table.velocity(60).unwrap(), 100);
//! assert_eq!(table.snapshot_velocities()[59], 100);
//! ```

pub mod error;
pub use error::{Error, Result};

pub(crate) mod event;
pub use event::{NoteCode, NoteEvent};

pub(crate) mod table;
pub use table::{NoteSnapshot, NoteTable, NOTE_RANGE, SNAPSHOT_LEN, TABLE_SIZE};

pub(crate) mod queue;
pub use queue::{BoundedQueue, RawPacket, DEFAULT_QUEUE_CAPACITY};

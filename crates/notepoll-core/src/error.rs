//! Error types for note decoding and table access.

use thiserror::Error;

use crate::table::TABLE_SIZE;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A note status byte arrived without both data bytes.
    #[error("malformed packet: status {status} with {len} byte(s), note messages need 3")]
    MalformedPacket { status: u8, len: usize },

    #[error("note id {note_id} out of range (table has {} slots)", TABLE_SIZE)]
    IndexOutOfRange { note_id: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

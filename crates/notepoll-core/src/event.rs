//! Decoded note events.
//!
//! Only the two channel-1 note status bytes are recognised (`0x90` note on,
//! `0x80` note off). Everything else stays a raw packet.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Note message discriminant, stored on the wire as the status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NoteCode {
    NoteOff = 0x80,
    NoteOn = 0x90,
}

impl NoteCode {
    #[inline]
    pub const fn status(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn from_status(status: u8) -> Option<Self> {
        match status {
            0x90 => Some(NoteCode::NoteOn),
            0x80 => Some(NoteCode::NoteOff),
            _ => None,
        }
    }
}

impl From<NoteCode> for u8 {
    fn from(code: NoteCode) -> Self {
        code.status()
    }
}

/// A note-on or note-off as seen by the consumer.
///
/// `code` keeps the raw status byte so that [`NoteEvent::EMPTY`] (all zero)
/// can be returned from a drained queue without an `Option`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub code: u8,
    pub note_id: u8,
    pub velocity: u8,
    /// Seconds since the previous packet, as reported by the device.
    pub timestamp: f64,
}

impl NoteEvent {
    /// Returned by polling operations when nothing is queued.
    pub const EMPTY: NoteEvent = NoteEvent {
        code: 0,
        note_id: 0,
        velocity: 0,
        timestamp: 0.0,
    };

    #[inline]
    pub fn new(code: NoteCode, note_id: u8, velocity: u8, timestamp: f64) -> Self {
        let velocity = match code {
            NoteCode::NoteOn => velocity,
            NoteCode::NoteOff => 0,
        };
        Self {
            code: code.status(),
            note_id,
            velocity,
            timestamp,
        }
    }

    #[inline]
    pub fn note_on(note_id: u8, velocity: u8, timestamp: f64) -> Self {
        Self::new(NoteCode::NoteOn, note_id, velocity, timestamp)
    }

    #[inline]
    pub fn note_off(note_id: u8, timestamp: f64) -> Self {
        Self::new(NoteCode::NoteOff, note_id, 0, timestamp)
    }

    /// Decode the first three bytes of a packet.
    ///
    /// Returns `Ok(None)` for empty packets and for any status byte other than
    /// note on/off. Trailing bytes past the third are ignored. A note-off
    /// always decodes with velocity 0.
    pub fn decode(bytes: &[u8], timestamp: f64) -> Result<Option<Self>> {
        let Some(&status) = bytes.first() else {
            return Ok(None);
        };
        let Some(code) = NoteCode::from_status(status) else {
            return Ok(None);
        };
        match bytes {
            [_, note_id, velocity, ..] => Ok(Some(Self::new(code, *note_id, *velocity, timestamp))),
            _ => Err(Error::MalformedPacket {
                status,
                len: bytes.len(),
            }),
        }
    }

    #[inline]
    pub fn kind(&self) -> Option<NoteCode> {
        NoteCode::from_status(self.code)
    }

    #[inline]
    pub fn is_note_on(&self) -> bool {
        self.code == NoteCode::NoteOn.status()
    }

    #[inline]
    pub fn is_note_off(&self) -> bool {
        self.code == NoteCode::NoteOff.status()
    }

    /// True for the [`NoteEvent::EMPTY`] sentinel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.code == 0
    }

    /// `code` in the high byte, then `note_id`, then `velocity`; low byte zero.
    /// The timestamp is not carried.
    #[inline]
    pub fn packed_u32(&self) -> u32 {
        (self.code as u32) << 24 | (self.note_id as u32) << 16 | (self.velocity as u32) << 8
    }

    /// Same bytes as [`packed_u32`](Self::packed_u32), in the upper half of a `u64`.
    #[deprecated(note = "use `packed_u32`; the 64-bit layout is kept for old consumers")]
    #[inline]
    pub fn packed_u64(&self) -> u64 {
        (self.packed_u32() as u64) << 32
    }

    /// Inverse of [`packed_u32`](Self::packed_u32). The timestamp comes back as 0.
    #[inline]
    pub fn from_packed_u32(packed: u32) -> Self {
        let [code, note_id, velocity, _] = packed.to_be_bytes();
        Self {
            code,
            note_id,
            velocity,
            timestamp: 0.0,
        }
    }
}

impl Default for NoteEvent {
    fn default() -> Self {
        Self::EMPTY
    }
}

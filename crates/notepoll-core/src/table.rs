//! Per-note last-known velocity and timestamp.
//!
//! The table is indexed directly by raw MIDI note number. It has two more
//! slots than the 128 notes so that ids 1..=128 map onto themselves; slot 0
//! and slot 129 are guards that snapshots skip.

use std::ops::RangeInclusive;

use crate::error::{Error, Result};
use crate::event::NoteEvent;

/// Number of slots in the table, guards included.
pub const TABLE_SIZE: usize = 130;

/// Note ids covered by snapshots.
pub const NOTE_RANGE: RangeInclusive<usize> = 1..=128;

/// Length of a snapshot.
pub const SNAPSHOT_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub struct NoteTable {
    velocities: [u8; TABLE_SIZE],
    timestamps: [f64; TABLE_SIZE],
}

/// Velocities and timestamps for note ids 1..=128, copied together.
///
/// Element `i` describes note id `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteSnapshot {
    pub velocities: [u8; SNAPSHOT_LEN],
    pub timestamps: [f64; SNAPSHOT_LEN],
}

impl NoteSnapshot {
    /// Velocity for a raw note id, `None` outside 1..=128.
    pub fn velocity(&self, note_id: usize) -> Option<u8> {
        NOTE_RANGE
            .contains(&note_id)
            .then(|| self.velocities[note_id - 1])
    }

    pub fn timestamp(&self, note_id: usize) -> Option<f64> {
        NOTE_RANGE
            .contains(&note_id)
            .then(|| self.timestamps[note_id - 1])
    }
}

impl NoteTable {
    pub fn new() -> Self {
        Self {
            velocities: [0; TABLE_SIZE],
            timestamps: [0.0; TABLE_SIZE],
        }
    }

    #[inline]
    fn check(note_id: usize) -> Result<()> {
        if note_id < TABLE_SIZE {
            Ok(())
        } else {
            Err(Error::IndexOutOfRange { note_id })
        }
    }

    /// Overwrite both slots for `note_id`. No ordering check is made against
    /// the stored timestamp: the last write wins.
    pub fn update(&mut self, note_id: usize, velocity: u8, timestamp: f64) -> Result<()> {
        Self::check(note_id)?;
        self.velocities[note_id] = velocity;
        self.timestamps[note_id] = timestamp;
        Ok(())
    }

    /// Record a decoded event. Note-offs write velocity 0.
    pub fn apply(&mut self, event: &NoteEvent) -> Result<()> {
        let velocity = if event.is_note_off() { 0 } else { event.velocity };
        self.update(event.note_id as usize, velocity, event.timestamp)
    }

    pub fn velocity(&self, note_id: usize) -> Result<u8> {
        Self::check(note_id)?;
        Ok(self.velocities[note_id])
    }

    pub fn timestamp(&self, note_id: usize) -> Result<f64> {
        Self::check(note_id)?;
        Ok(self.timestamps[note_id])
    }

    pub fn snapshot_velocities(&self) -> [u8; SNAPSHOT_LEN] {
        let mut out = [0; SNAPSHOT_LEN];
        out.copy_from_slice(&self.velocities[NOTE_RANGE]);
        out
    }

    pub fn snapshot_timestamps(&self) -> [f64; SNAPSHOT_LEN] {
        let mut out = [0.0; SNAPSHOT_LEN];
        out.copy_from_slice(&self.timestamps[NOTE_RANGE]);
        out
    }

    pub fn snapshot(&self) -> NoteSnapshot {
        NoteSnapshot {
            velocities: self.snapshot_velocities(),
            timestamps: self.snapshot_timestamps(),
        }
    }

    /// Held notes in 1..=128 as `(note_id, velocity)`.
    pub fn active_notes(&self) -> impl Iterator<Item = (usize, u8)> + '_ {
        NOTE_RANGE
            .map(move |id| (id, self.velocities[id]))
            .filter(|&(_, velocity)| velocity > 0)
    }

    pub fn reset(&mut self) {
        self.velocities.fill(0);
        self.timestamps.fill(0.0);
    }
}

impl Default for NoteTable {
    fn default() -> Self {
        Self::new()
    }
}

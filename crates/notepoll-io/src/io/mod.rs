//! Hardware MIDI I/O.
//!
//! Device enumeration, connection, and real-time I/O via midir.
//! Requires the `midi-io` feature.

mod input;
mod output;
mod selection;

pub use input::MidiDevice;
pub(crate) use input::MidiInputManager;
pub use output::MidiOutputMessage;
pub(crate) use output::MidiOutputManager;
pub use selection::PortSelection;

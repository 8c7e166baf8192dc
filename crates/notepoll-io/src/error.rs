//! Error types for the bridge and its device layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Note(#[from] notepoll_core::Error),

    #[error("MIDI port error: {0}")]
    MidiPort(String),

    #[error("MIDI device error: {0}")]
    MidiDevice(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("MIDI {0} is not connected")]
    NotConnected(&'static str),

    #[error("MIDI {0} thread not running")]
    ThreadStopped(&'static str),
}

#[cfg(feature = "midi-io")]
impl From<midir::InitError> for Error {
    fn from(e: midir::InitError) -> Self {
        Error::MidiDevice(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiInput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        Error::MidiPort(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiOutput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        Error::MidiPort(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

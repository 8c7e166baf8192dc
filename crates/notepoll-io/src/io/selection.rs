//! Port selection rules shared by input and output.

use crate::error::{Error, Result};

/// Which device port to open.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PortSelection {
    /// First available port, or a virtual port when none exist.
    #[default]
    First,
    /// Port by index. Indices past the end open the last port; a virtual port
    /// is opened when no ports exist.
    Index(usize),
    /// First port whose name contains this text (case-insensitive).
    Name(String),
    /// Always open a virtual port (unix only).
    Virtual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolvedPort {
    Device(usize),
    Virtual,
}

impl PortSelection {
    pub(crate) fn resolve(&self, port_names: &[String]) -> Result<ResolvedPort> {
        match self {
            PortSelection::Virtual => Ok(ResolvedPort::Virtual),
            PortSelection::First | PortSelection::Index(_) if port_names.is_empty() => {
                Ok(ResolvedPort::Virtual)
            }
            PortSelection::First => Ok(ResolvedPort::Device(0)),
            PortSelection::Index(index) => {
                Ok(ResolvedPort::Device((*index).min(port_names.len() - 1)))
            }
            PortSelection::Name(name) => {
                let needle = name.to_lowercase();
                port_names
                    .iter()
                    .position(|port| port.to_lowercase().contains(&needle))
                    .map(ResolvedPort::Device)
                    .ok_or_else(|| {
                        Error::MidiDevice(format!("No MIDI device matching '{}' found", name))
                    })
            }
        }
    }
}

impl From<usize> for PortSelection {
    fn from(index: usize) -> Self {
        PortSelection::Index(index)
    }
}

impl From<&str> for PortSelection {
    fn from(name: &str) -> Self {
        PortSelection::Name(name.to_string())
    }
}

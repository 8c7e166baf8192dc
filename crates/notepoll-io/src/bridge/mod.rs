//! The bridge context: owns the shared note state, its lifecycle and the
//! device connections.
//!
//! ## Quick Start
//!
//! ```ignore
//! use notepoll_io::{NoteBridge, PortSelection};
//!
//! let bridge = NoteBridge::builder().io().build()?;
//! bridge.connect(PortSelection::First)?;
//!
//! // Once per frame
//! let poller = bridge.poller();
//! loop {
//!     let event = poller.drain_next_event();
//!     if event.is_empty() {
//!         break;
//!     }
//!     // ...
//! }
//! let held = poller.snapshot_velocities();
//!
//! bridge.teardown();
//! ```

mod builder;

pub use builder::{BridgeConfig, NoteBridgeBuilder};

use crate::error::Result;
use crate::ingest::IngestEngine;
use crate::poller::NotePoller;
use crate::state::SharedState;
use std::sync::Arc;
use tracing::debug;

#[cfg(feature = "midi-io")]
use crate::error::Error;
#[cfg(feature = "midi-io")]
use crate::io::{MidiDevice, MidiInputManager, MidiOutputManager, MidiOutputMessage, PortSelection};

/// Note-state bridge. Clone is cheap (Arc internally).
#[derive(Clone)]
pub struct NoteBridge {
    inner: Arc<NoteBridgeInner>,
}

pub(crate) struct NoteBridgeInner {
    pub(crate) config: BridgeConfig,
    pub(crate) shared: Arc<SharedState>,
    pub(crate) engine: IngestEngine,
    #[cfg(feature = "midi-io")]
    pub(crate) input_manager: Option<MidiInputManager>,
    #[cfg(feature = "midi-io")]
    pub(crate) output_manager: Option<MidiOutputManager>,
}

impl NoteBridge {
    pub fn builder() -> NoteBridgeBuilder {
        NoteBridgeBuilder::default()
    }

    /// Build a bridge without device I/O.
    pub fn from_config(config: BridgeConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Callback handle for whatever delivers MIDI packets.
    pub fn ingest_engine(&self) -> IngestEngine {
        self.inner.engine.clone()
    }

    pub fn poller(&self) -> NotePoller {
        NotePoller::new(Arc::clone(&self.inner.shared))
    }

    pub fn is_active(&self) -> bool {
        self.inner.shared.is_active()
    }

    /// Accept packets again after a [`teardown`](Self::teardown).
    pub fn activate(&self) {
        self.inner.shared.activate();
        debug!("Note bridge activated");
    }

    /// Close the device input, then stop ingestion and clear the table and
    /// both queues in a single critical section.
    ///
    /// Packets arriving afterwards are dropped until [`activate`](Self::activate).
    pub fn teardown(&self) {
        #[cfg(feature = "midi-io")]
        if let Some(ref input) = self.inner.input_manager {
            input.disconnect();
        }
        self.inner.shared.teardown();
        debug!("Note bridge torn down");
    }

    // ==================== Hardware Device Connection ====================

    #[cfg(feature = "midi-io")]
    pub fn list_input_devices(&self) -> Vec<MidiDevice> {
        MidiInputManager::list_devices(&self.inner.config.client_name)
    }

    #[cfg(feature = "midi-io")]
    pub fn list_output_devices(&self) -> Vec<MidiDevice> {
        MidiOutputManager::list_devices(&self.inner.config.client_name)
    }

    /// Open input and output with the same selection rules.
    ///
    /// Returns the input port name. If the output cannot be opened the input
    /// is closed again, so a failed connect leaves nothing open.
    #[cfg(feature = "midi-io")]
    pub fn connect(&self, selection: PortSelection) -> Result<String> {
        let input = self.input()?;
        let name = input.connect(selection.clone(), self.ingest_engine())?;
        if let Err(e) = self.connect_output(selection) {
            input.disconnect();
            debug!("Closed MIDI input {} after output connect failed", name);
            return Err(e);
        }
        Ok(name)
    }

    /// Open an input port and route its packets into this bridge.
    #[cfg(feature = "midi-io")]
    pub fn connect_input(&self, selection: PortSelection) -> Result<String> {
        self.input()?.connect(selection, self.ingest_engine())
    }

    #[cfg(feature = "midi-io")]
    pub fn connect_output(&self, selection: PortSelection) -> Result<String> {
        self.output()?.connect(selection)
    }

    #[cfg(feature = "midi-io")]
    pub fn disconnect(&self) {
        if let Some(ref input) = self.inner.input_manager {
            input.disconnect();
        }
        if let Some(ref output) = self.inner.output_manager {
            output.disconnect();
        }
    }

    /// True only when both input and output are open.
    #[cfg(feature = "midi-io")]
    pub fn is_connected(&self) -> bool {
        self.is_input_open() && self.is_output_open()
    }

    #[cfg(feature = "midi-io")]
    pub fn is_input_open(&self) -> bool {
        self.inner
            .input_manager
            .as_ref()
            .map(|m| m.is_connected())
            .unwrap_or(false)
    }

    #[cfg(feature = "midi-io")]
    pub fn is_output_open(&self) -> bool {
        self.inner
            .output_manager
            .as_ref()
            .map(|m| m.is_connected())
            .unwrap_or(false)
    }

    /// Name of the connected input port.
    #[cfg(feature = "midi-io")]
    pub fn device_name(&self) -> Option<String> {
        self.inner
            .input_manager
            .as_ref()
            .and_then(|m| m.connected_device_name())
    }

    // ==================== Output ====================

    /// * `note` - MIDI note number (0-127)
    /// * `velocity` - Velocity (0-127)
    /// * `channel` - MIDI channel (0-15)
    ///
    /// Ingestion only decodes status bytes 144 and 128, i.e. channel 0. Notes
    /// sent on any other channel and looped back into a bridge are traced but
    /// never reach the table or the event queue.
    #[cfg(feature = "midi-io")]
    pub fn send_note_on(&self, note: u8, velocity: u8, channel: u8) -> Result<()> {
        self.output()?
            .send(MidiOutputMessage::note_on(channel, note, velocity))
    }

    /// Velocity is always 0. The same channel 0 restriction as
    /// [`send_note_on`](Self::send_note_on) applies on loopback.
    #[cfg(feature = "midi-io")]
    pub fn send_note_off(&self, note: u8, channel: u8) -> Result<()> {
        self.output()?.send(MidiOutputMessage::note_off(channel, note))
    }

    #[cfg(feature = "midi-io")]
    fn input(&self) -> Result<&MidiInputManager> {
        self.inner
            .input_manager
            .as_ref()
            .ok_or_else(|| Error::InvalidConfig("MIDI I/O not enabled".to_string()))
    }

    #[cfg(feature = "midi-io")]
    fn output(&self) -> Result<&MidiOutputManager> {
        self.inner
            .output_manager
            .as_ref()
            .ok_or_else(|| Error::InvalidConfig("MIDI I/O not enabled".to_string()))
    }
}

impl std::fmt::Debug for NoteBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteBridge")
            .field("config", &self.inner.config)
            .field("shared", &self.inner.shared)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notepoll_core::NoteEvent;

    #[test]
    fn test_handles_share_state() {
        let bridge = NoteBridge::builder().build().unwrap();
        let engine = bridge.ingest_engine();
        let poller = bridge.clone().poller();

        engine.handle(0.5, &[144, 60, 100]);
        assert_eq!(poller.query_velocity(60), Ok(100));
        assert_eq!(bridge.poller().drain_next_event().note_id, 60);
    }

    #[test]
    fn test_teardown_and_reactivate() {
        let bridge = NoteBridge::builder().build().unwrap();
        let engine = bridge.ingest_engine();
        let poller = bridge.poller();
        engine.handle(0.5, &[144, 60, 100]);

        bridge.teardown();
        assert!(!bridge.is_active());
        assert_eq!(poller.query_velocity(60), Ok(0));
        assert_eq!(poller.drain_next_event(), NoteEvent::EMPTY);
        assert_eq!(poller.pending_raw(), 0);

        engine.handle(0.1, &[144, 61, 90]);
        assert_eq!(poller.pending_events(), 0);

        bridge.activate();
        engine.handle(0.1, &[144, 61, 90]);
        assert_eq!(poller.query_velocity(61), Ok(90));
    }

    #[test]
    fn test_reactivated_bridge_starts_fresh_stats() {
        let bridge = NoteBridge::builder().queue_capacity(2).build().unwrap();
        let engine = bridge.ingest_engine();
        let poller = bridge.poller();
        for note in 60..65 {
            engine.handle(0.0, &[144, note, 100]);
        }
        assert_eq!(poller.stats().events_evicted, 3);
        assert_eq!(poller.stats().raw_evicted, 3);

        bridge.teardown();
        bridge.activate();
        let stats = poller.stats();
        assert_eq!(stats.pending_events, 0);
        assert_eq!(stats.events_evicted, 0);
        assert_eq!(stats.pending_raw, 0);
        assert_eq!(stats.raw_evicted, 0);
    }

    #[test]
    fn test_from_config() {
        let config = BridgeConfig {
            event_capacity: 2,
            raw_capacity: 3,
            client_name: "test".to_string(),
        };
        let bridge = NoteBridge::from_config(config).unwrap();
        assert_eq!(bridge.config().client_name, "test");
        assert_eq!(bridge.poller().stats().raw_capacity, 3);
    }

    #[cfg(feature = "midi-io")]
    #[test]
    fn test_io_disabled() {
        let bridge = NoteBridge::builder().build().unwrap();
        assert!(!bridge.is_connected());
        assert!(bridge.device_name().is_none());
        assert!(matches!(
            bridge.connect(PortSelection::First),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            bridge.send_note_on(60, 100, 0),
            Err(Error::InvalidConfig(_))
        ));
        // Disconnect and teardown without I/O are no-ops
        bridge.disconnect();
        bridge.teardown();
    }

    #[cfg(feature = "midi-io")]
    #[test]
    fn test_send_without_connection() {
        let bridge = NoteBridge::builder().io().build().unwrap();
        assert!(!bridge.is_output_open());
        assert!(matches!(
            bridge.send_note_off(60, 0),
            Err(Error::NotConnected("output"))
        ));
    }
}

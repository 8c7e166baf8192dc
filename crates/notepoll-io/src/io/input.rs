//! MIDI input: device enumeration and connection.
//!
//! The midir connection lives on a dedicated thread and is driven by
//! commands. Incoming packets go straight from midir's callback into an
//! [`IngestEngine`].

use super::selection::{PortSelection, ResolvedPort};
use crate::error::{Error, Result};
use crate::ingest::IngestEngine;
use arc_swap::ArcSwap;
use crossbeam_channel::{bounded, Receiver, Sender};
use midir::{Ignore, MidiInput, MidiInputConnection};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// An enumerated MIDI port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiDevice {
    pub index: usize,
    pub name: String,
}

/// Turns midir's microsecond stamps into seconds since the previous packet.
#[derive(Debug, Default)]
pub(crate) struct DeltaClock {
    last: Option<u64>,
}

impl DeltaClock {
    /// The first packet after connecting reports 0.0.
    pub(crate) fn delta_secs(&mut self, stamp_us: u64) -> f64 {
        let delta = match self.last {
            Some(prev) => stamp_us.saturating_sub(prev) as f64 / 1_000_000.0,
            None => 0.0,
        };
        self.last = Some(stamp_us);
        delta
    }
}

enum InputCommand {
    Connect {
        selection: PortSelection,
        engine: IngestEngine,
        reply: Sender<Result<String>>,
    },
    Disconnect {
        reply: Sender<()>,
    },
    Shutdown,
}

pub(crate) struct MidiInputManager {
    command_sender: Sender<InputCommand>,
    connected_device: Arc<ArcSwap<Option<String>>>,
    is_connected: Arc<AtomicBool>,
}

impl MidiInputManager {
    pub(crate) fn new(client_name: &str) -> Result<Self> {
        let (command_sender, command_receiver) = bounded(16);
        let connected_device = Arc::new(ArcSwap::from_pointee(None));
        let is_connected = Arc::new(AtomicBool::new(false));

        let client_name = client_name.to_string();
        let connected_device_clone = Arc::clone(&connected_device);
        let is_connected_clone = Arc::clone(&is_connected);

        thread::Builder::new()
            .name("midi-input-thread".to_string())
            .spawn(move || {
                Self::midi_input_thread(
                    client_name,
                    command_receiver,
                    connected_device_clone,
                    is_connected_clone,
                );
            })
            .map_err(|e| Error::MidiDevice(format!("Failed to spawn MIDI input thread: {}", e)))?;

        Ok(Self {
            command_sender,
            connected_device,
            is_connected,
        })
    }

    fn midi_input_thread(
        client_name: String,
        command_receiver: Receiver<InputCommand>,
        connected_device: Arc<ArcSwap<Option<String>>>,
        is_connected: Arc<AtomicBool>,
    ) {
        let mut connection: Option<MidiInputConnection<DeltaClock>> = None;

        let close = |connection: &mut Option<MidiInputConnection<DeltaClock>>| {
            if let Some(conn) = connection.take() {
                conn.close();
                is_connected.store(false, Ordering::SeqCst);
                connected_device.store(Arc::new(None));
            }
        };

        for command in command_receiver.iter() {
            match command {
                InputCommand::Connect {
                    selection,
                    engine,
                    reply,
                } => {
                    close(&mut connection);
                    let result = Self::open(&client_name, &selection, engine).map(|(conn, name)| {
                        connection = Some(conn);
                        is_connected.store(true, Ordering::SeqCst);
                        connected_device.store(Arc::new(Some(name.clone())));
                        name
                    });
                    if let Err(e) = &result {
                        debug!("MIDI input connect failed: {}", e);
                    }
                    let _ = reply.send(result);
                }
                InputCommand::Disconnect { reply } => {
                    close(&mut connection);
                    let _ = reply.send(());
                }
                InputCommand::Shutdown => {
                    close(&mut connection);
                    break;
                }
            }
        }
    }

    fn open(
        client_name: &str,
        selection: &PortSelection,
        engine: IngestEngine,
    ) -> Result<(MidiInputConnection<DeltaClock>, String)> {
        let mut midi_input = MidiInput::new(client_name)?;
        // Sysex, clock and active sensing never reach the callback
        midi_input.ignore(Ignore::All);

        let ports = midi_input.ports();
        let names: Vec<String> = ports
            .iter()
            .enumerate()
            .map(|(index, port)| {
                midi_input
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Device {}", index))
            })
            .collect();

        let callback = move |stamp: u64, message: &[u8], clock: &mut DeltaClock| {
            engine.handle(clock.delta_secs(stamp), message);
        };

        match selection.resolve(&names)? {
            ResolvedPort::Device(index) => {
                let name = names[index].clone();
                debug!("Connecting MIDI input {}: {}", index, name);
                let conn = midi_input.connect(
                    &ports[index],
                    "notepoll-input",
                    callback,
                    DeltaClock::default(),
                )?;
                Ok((conn, name))
            }
            ResolvedPort::Virtual => {
                let name = format!("{} virtual input", client_name);
                debug!("Opening virtual MIDI input: {}", name);
                let conn = Self::open_virtual(midi_input, &name, callback)?;
                Ok((conn, name))
            }
        }
    }

    #[cfg(unix)]
    fn open_virtual<F>(
        midi_input: MidiInput,
        name: &str,
        callback: F,
    ) -> Result<MidiInputConnection<DeltaClock>>
    where
        F: FnMut(u64, &[u8], &mut DeltaClock) + Send + 'static,
    {
        use midir::os::unix::VirtualInput;
        Ok(midi_input.create_virtual(name, callback, DeltaClock::default())?)
    }

    #[cfg(not(unix))]
    fn open_virtual<F>(
        _midi_input: MidiInput,
        _name: &str,
        _callback: F,
    ) -> Result<MidiInputConnection<DeltaClock>>
    where
        F: FnMut(u64, &[u8], &mut DeltaClock) + Send + 'static,
    {
        Err(Error::MidiPort(
            "virtual MIDI ports are not supported on this platform".to_string(),
        ))
    }

    pub(crate) fn list_devices(client_name: &str) -> Vec<MidiDevice> {
        let mut devices = Vec::new();
        if let Ok(midi_input) = MidiInput::new(client_name) {
            for (index, port) in midi_input.ports().iter().enumerate() {
                let name = midi_input
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index));
                devices.push(MidiDevice { index, name });
            }
        }
        devices
    }

    /// Blocks until the input thread has opened (or failed to open) the port.
    pub(crate) fn connect(&self, selection: PortSelection, engine: IngestEngine) -> Result<String> {
        let (reply, reply_rx) = bounded(1);
        self.command_sender
            .send(InputCommand::Connect {
                selection,
                engine,
                reply,
            })
            .map_err(|_| Error::ThreadStopped("input"))?;
        reply_rx.recv().map_err(|_| Error::ThreadStopped("input"))?
    }

    /// Blocks until the connection is closed, so no callback is in flight afterwards.
    pub(crate) fn disconnect(&self) {
        let (reply, reply_rx) = bounded(1);
        if self
            .command_sender
            .send(InputCommand::Disconnect { reply })
            .is_ok()
        {
            let _ = reply_rx.recv();
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::SeqCst)
    }

    pub(crate) fn connected_device_name(&self) -> Option<String> {
        self.connected_device.load().as_ref().clone()
    }
}

impl Drop for MidiInputManager {
    fn drop(&mut self) {
        let _ = self.command_sender.send(InputCommand::Shutdown);
    }
}

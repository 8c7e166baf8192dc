//! MIDI output: device enumeration, connection, and note sending via a dedicated thread.

use super::input::MidiDevice;
use super::selection::{PortSelection, ResolvedPort};
use crate::error::{Error, Result};
use arc_swap::ArcSwap;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use midir::{MidiOutput, MidiOutputConnection};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiOutputMessage {
    pub bytes: [u8; 3],
}

impl MidiOutputMessage {
    /// Status is `0x90 | channel`; only channel 0 produces the 144 that
    /// ingestion decodes.
    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        let channel = channel.min(15); // MIDI channels are 0-15
        Self {
            bytes: [0x90 | channel, note & 0x7F, velocity & 0x7F],
        }
    }

    /// Note off always carries velocity 0.
    pub fn note_off(channel: u8, note: u8) -> Self {
        let channel = channel.min(15);
        Self {
            bytes: [0x80 | channel, note & 0x7F, 0],
        }
    }
}

enum OutputCommand {
    Connect {
        selection: PortSelection,
        reply: Sender<Result<String>>,
    },
    Disconnect {
        reply: Sender<()>,
    },
    Send(MidiOutputMessage),
    Shutdown,
}

pub(crate) struct MidiOutputManager {
    command_sender: Sender<OutputCommand>,
    connected_device: Arc<ArcSwap<Option<String>>>,
    is_connected: Arc<AtomicBool>,
}

impl MidiOutputManager {
    pub(crate) fn new(client_name: &str) -> Result<Self> {
        let (command_sender, command_receiver) = bounded(1024);
        let connected_device = Arc::new(ArcSwap::from_pointee(None));
        let is_connected = Arc::new(AtomicBool::new(false));

        let client_name = client_name.to_string();
        let connected_device_clone = Arc::clone(&connected_device);
        let is_connected_clone = Arc::clone(&is_connected);

        thread::Builder::new()
            .name("midi-output-thread".to_string())
            .spawn(move || {
                Self::midi_output_thread(
                    client_name,
                    command_receiver,
                    connected_device_clone,
                    is_connected_clone,
                );
            })
            .map_err(|e| Error::MidiDevice(format!("Failed to spawn MIDI output thread: {}", e)))?;

        Ok(Self {
            command_sender,
            connected_device,
            is_connected,
        })
    }

    fn midi_output_thread(
        client_name: String,
        command_receiver: Receiver<OutputCommand>,
        connected_device: Arc<ArcSwap<Option<String>>>,
        is_connected: Arc<AtomicBool>,
    ) {
        let mut connection: Option<MidiOutputConnection> = None;

        let close = |connection: &mut Option<MidiOutputConnection>| {
            if let Some(conn) = connection.take() {
                conn.close();
                is_connected.store(false, Ordering::SeqCst);
                connected_device.store(Arc::new(None));
            }
        };

        for command in command_receiver.iter() {
            match command {
                OutputCommand::Connect { selection, reply } => {
                    close(&mut connection);
                    let result = Self::open(&client_name, &selection).map(|(conn, name)| {
                        connection = Some(conn);
                        is_connected.store(true, Ordering::SeqCst);
                        connected_device.store(Arc::new(Some(name.clone())));
                        name
                    });
                    if let Err(e) = &result {
                        debug!("MIDI output connect failed: {}", e);
                    }
                    let _ = reply.send(result);
                }
                OutputCommand::Disconnect { reply } => {
                    close(&mut connection);
                    let _ = reply.send(());
                }
                OutputCommand::Send(msg) => match connection.as_mut() {
                    Some(conn) => {
                        if let Err(e) = conn.send(&msg.bytes) {
                            debug!("Failed to send MIDI message {:02X?}: {}", msg.bytes, e);
                        }
                    }
                    None => debug!("Cannot send MIDI message: no device connected"),
                },
                OutputCommand::Shutdown => {
                    close(&mut connection);
                    break;
                }
            }
        }
    }

    fn open(client_name: &str, selection: &PortSelection) -> Result<(MidiOutputConnection, String)> {
        let midi_output = MidiOutput::new(client_name)?;

        let ports = midi_output.ports();
        let names: Vec<String> = ports
            .iter()
            .enumerate()
            .map(|(index, port)| {
                midi_output
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Device {}", index))
            })
            .collect();

        match selection.resolve(&names)? {
            ResolvedPort::Device(index) => {
                let name = names[index].clone();
                debug!("Connecting MIDI output {}: {}", index, name);
                let conn = midi_output.connect(&ports[index], "notepoll-output")?;
                Ok((conn, name))
            }
            ResolvedPort::Virtual => {
                let name = format!("{} virtual output", client_name);
                debug!("Opening virtual MIDI output: {}", name);
                let conn = Self::open_virtual(midi_output, &name)?;
                Ok((conn, name))
            }
        }
    }

    #[cfg(unix)]
    fn open_virtual(midi_output: MidiOutput, name: &str) -> Result<MidiOutputConnection> {
        use midir::os::unix::VirtualOutput;
        Ok(midi_output.create_virtual(name)?)
    }

    #[cfg(not(unix))]
    fn open_virtual(_midi_output: MidiOutput, _name: &str) -> Result<MidiOutputConnection> {
        Err(Error::MidiPort(
            "virtual MIDI ports are not supported on this platform".to_string(),
        ))
    }

    pub(crate) fn list_devices(client_name: &str) -> Vec<MidiDevice> {
        let mut devices = Vec::new();
        if let Ok(midi_output) = MidiOutput::new(client_name) {
            for (index, port) in midi_output.ports().iter().enumerate() {
                let name = midi_output
                    .port_name(port)
                    .unwrap_or_else(|_| format!("Unknown Device {}", index));
                devices.push(MidiDevice { index, name });
            }
        }
        devices
    }

    pub(crate) fn connect(&self, selection: PortSelection) -> Result<String> {
        let (reply, reply_rx) = bounded(1);
        self.command_sender
            .send(OutputCommand::Connect { selection, reply })
            .map_err(|_| Error::ThreadStopped("output"))?;
        reply_rx.recv().map_err(|_| Error::ThreadStopped("output"))?
    }

    pub(crate) fn disconnect(&self) {
        let (reply, reply_rx) = bounded(1);
        if self
            .command_sender
            .send(OutputCommand::Disconnect { reply })
            .is_ok()
        {
            let _ = reply_rx.recv();
        }
    }

    /// Queue a message for the output thread. Never blocks; a full queue drops the message.
    pub(crate) fn send(&self, msg: MidiOutputMessage) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected("output"));
        }
        match self.command_sender.try_send(OutputCommand::Send(msg)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                debug!("MIDI output queue full, dropping message");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(Error::ThreadStopped("output")),
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.is_connected.load(Ordering::SeqCst)
    }

    pub(crate) fn connected_device_name(&self) -> Option<String> {
        self.connected_device.load().as_ref().clone()
    }
}

impl Drop for MidiOutputManager {
    fn drop(&mut self) {
        let _ = self.command_sender.send(OutputCommand::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_message() {
        let msg = MidiOutputMessage::note_on(0, 60, 100);
        assert_eq!(msg.bytes, [0x90, 60, 100]);

        let msg = MidiOutputMessage::note_on(9, 36, 127);
        assert_eq!(msg.bytes, [0x99, 36, 127]);
    }

    #[test]
    fn test_note_off_message() {
        let msg = MidiOutputMessage::note_off(0, 60);
        assert_eq!(msg.bytes, [0x80, 60, 0]);
    }

    #[test]
    fn test_channel_clamping() {
        let msg = MidiOutputMessage::note_on(20, 60, 100);
        assert_eq!(msg.bytes[0], 0x9F);
    }

    #[test]
    fn test_value_masking() {
        let msg = MidiOutputMessage::note_on(0, 200, 255);
        assert_eq!(msg.bytes[1], 200 & 0x7F);
        assert_eq!(msg.bytes[2], 0x7F);
    }

    #[test]
    fn test_send_requires_connection() {
        let manager = MidiOutputManager::new("notepoll-test").unwrap();
        assert!(!manager.is_connected());
        assert!(matches!(
            manager.send(MidiOutputMessage::note_on(0, 60, 100)),
            Err(Error::NotConnected("output"))
        ));
    }

    #[test]
    fn test_list_devices() {
        let devices = MidiOutputManager::list_devices("notepoll-test");
        for (i, device) in devices.iter().enumerate() {
            assert_eq!(device.index, i);
        }
    }
}

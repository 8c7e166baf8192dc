//! Connects to a MIDI device and polls note state at ~60 Hz, the way a game
//! loop would.
//!
//!   cargo run -p notepoll-io --example poll_loop -- [device name]

use notepoll_io::{NoteBridge, PortSelection};
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let bridge = NoteBridge::builder().io().build()?;

    println!("=== MIDI Input Devices ===");
    let devices = bridge.list_input_devices();
    if devices.is_empty() {
        println!("  (none found, opening a virtual port)");
    }
    for dev in &devices {
        println!("  [{}] {}", dev.index, dev.name);
    }

    let selection = match std::env::args().nth(1) {
        Some(name) => PortSelection::Name(name),
        None => PortSelection::First,
    };
    let name = bridge.connect_input(selection)?;
    println!("\nListening on {} (Ctrl-C to quit)", name);

    let poller = bridge.poller();
    let frame = Duration::from_micros(16_667);
    loop {
        while let Some(event) = poller.try_next_event() {
            let kind = if event.is_note_on() { "on " } else { "off" };
            println!(
                "note {} {:3} vel {:3} (+{:.3}s)",
                kind, event.note_id, event.velocity, event.timestamp
            );
        }

        let held: Vec<_> = poller
            .active_notes()
            .into_iter()
            .map(|(note, _)| note)
            .collect();
        if !held.is_empty() {
            println!("held: {:?}", held);
        }

        thread::sleep(frame);
    }
}

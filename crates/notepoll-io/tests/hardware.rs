//! Hardware loopback tests using virtual MIDI ports.
//!
//! A second bridge opens virtual ports and the first one connects to them by
//! name. Needs a unix MIDI backend (ALSA or CoreMIDI). All tests are
//! `#[ignore]` so CI doesn't fail without one.
//!
//! Run with:
//!   cargo test -p notepoll-io --test hardware -- --ignored --test-threads=1

#![cfg(all(feature = "midi-io", unix))]

use notepoll_io::{NoteBridge, NoteEvent, PortSelection};
use std::thread;
use std::time::Duration;

const SETTLE: Duration = Duration::from_millis(200);
const SEND_READ_DELAY: Duration = Duration::from_millis(100);

/// Returns (receiver, sender): `sender` output feeds `receiver` input.
fn loopback() -> (NoteBridge, NoteBridge) {
    let host = NoteBridge::builder()
        .client_name("notepoll-host")
        .io()
        .build()
        .expect("Failed to build host bridge");
    host.connect_input(PortSelection::Virtual)
        .expect("Failed to open virtual input");
    thread::sleep(SETTLE);

    let sender = NoteBridge::builder()
        .client_name("notepoll-sender")
        .io()
        .build()
        .expect("Failed to build sender bridge");
    sender
        .connect_output(PortSelection::Name("notepoll-host virtual input".into()))
        .expect("Virtual input not visible to other clients");
    thread::sleep(SETTLE);

    (host, sender)
}

#[test]
#[ignore]
fn test_virtual_input_reports_name() {
    let (host, _sender) = loopback();
    assert!(host.is_input_open());
    assert!(!host.is_connected(), "Output was never opened");
    assert_eq!(
        host.device_name().as_deref(),
        Some("notepoll-host virtual input")
    );
}

#[test]
#[ignore]
fn test_note_on_loopback() {
    let (host, sender) = loopback();
    let poller = host.poller();

    sender.send_note_on(60, 100, 0).unwrap();
    thread::sleep(SEND_READ_DELAY);

    let event = poller.drain_next_event();
    assert!(event.is_note_on());
    assert_eq!(event.note_id, 60);
    assert_eq!(event.velocity, 100);
    assert_eq!(poller.query_velocity(60).unwrap(), 100);
}

#[test]
#[ignore]
fn test_note_off_loopback() {
    let (host, sender) = loopback();
    let poller = host.poller();

    sender.send_note_on(64, 90, 0).unwrap();
    sender.send_note_off(64, 0).unwrap();
    thread::sleep(SEND_READ_DELAY);

    let events = poller.drain_events();
    assert_eq!(events.len(), 2);
    assert!(events[1].is_note_off());
    assert_eq!(poller.query_velocity(64).unwrap(), 0);
}

#[test]
#[ignore]
fn test_first_packet_delta_is_zero() {
    let (host, sender) = loopback();
    let poller = host.poller();

    sender.send_note_on(60, 100, 0).unwrap();
    thread::sleep(SEND_READ_DELAY);
    sender.send_note_on(61, 100, 0).unwrap();
    thread::sleep(SEND_READ_DELAY);

    let first = poller.drain_next_event();
    let second = poller.drain_next_event();
    assert_eq!(first.timestamp, 0.0);
    assert!(second.timestamp > 0.05, "delta was {}", second.timestamp);
}

#[test]
#[ignore]
fn test_teardown_closes_input() {
    let (host, sender) = loopback();
    let poller = host.poller();

    host.teardown();
    assert!(!host.is_input_open());

    let _ = sender.send_note_on(60, 100, 0);
    thread::sleep(SEND_READ_DELAY);
    assert_eq!(poller.drain_next_event(), NoteEvent::EMPTY);
}

#[test]
#[ignore]
fn test_failed_connect_leaves_input_closed() {
    // A virtual output is visible to other clients as an input port only
    let host = NoteBridge::builder()
        .client_name("notepoll-source")
        .io()
        .build()
        .expect("Failed to build host bridge");
    host.connect_output(PortSelection::Virtual)
        .expect("Failed to open virtual output");
    thread::sleep(SETTLE);

    let bridge = NoteBridge::builder()
        .client_name("notepoll-reader")
        .io()
        .build()
        .expect("Failed to build reader bridge");
    let result = bridge.connect(PortSelection::Name("notepoll-source virtual output".into()));

    assert!(result.is_err(), "No output port carries that name");
    assert!(!bridge.is_input_open(), "Input must be closed again");
    assert!(!bridge.is_connected());
    assert!(bridge.device_name().is_none());
}

//! Integration tests for the serial fork: fan-in order and fan-out.

use flightlink::adapters::uart::UartPort;
use flightlink::config::LinkConfig;
use flightlink::transport::channel::Channel;
use flightlink::transport::cobs::{CobsDecoder, DecodeStatus, encode_frame};
use flightlink::transport::fork::{Link, PacketHandler, SerialFork};

use super::mock_channel::MockChannel;

/// Handler that copies every payload out.
#[derive(Default)]
struct Recorder {
    frames: Vec<Vec<u8>>,
}

impl PacketHandler for Recorder {
    fn process_data(&mut self, payload: &[u8]) {
        self.frames.push(payload.to_vec());
    }
}

const CON: &[u8] = b"\r\nCON\r\n";

#[test]
fn poll_drains_higher_priority_channel_first() {
    let a = MockChannel::with_frames(true, &[b"F1", b"F2"]);
    let b = MockChannel::with_frames(false, &[b"F3"]);
    let mut fork = SerialFork::new([a, b]);

    let mut rec = Recorder::default();
    assert_eq!(fork.poll(&mut rec), 3);
    assert_eq!(rec.frames, vec![b"F1".to_vec(), b"F2".to_vec(), b"F3".to_vec()]);

    // Nothing left for a second poll.
    assert_eq!(fork.poll(&mut rec), 0);
}

#[test]
fn frames_arriving_between_polls_keep_priority() {
    let mut fork = SerialFork::new([MockChannel::new(true), MockChannel::new(true)]);
    fork.channels_mut()[1].push_frame(b"low");
    fork.channels_mut()[0].push_frame(b"high");

    let mut rec = Recorder::default();
    fork.poll(&mut rec);
    assert_eq!(rec.frames, vec![b"high".to_vec(), b"low".to_vec()]);
}

#[test]
fn write_reaches_every_channel_once_regardless_of_connectivity() {
    let mut fork = SerialFork::new([MockChannel::new(true), MockChannel::new(false)]);
    fork.write(&[0x03, 0xAA, 0xBB, 0x00]);

    for channel in fork.channels() {
        assert_eq!(channel.writes, vec![vec![0x03, 0xAA, 0xBB, 0x00]]);
    }
}

#[test]
fn send_frame_broadcasts_stuffed_bytes() {
    let mut fork = SerialFork::new([MockChannel::new(true), MockChannel::new(true)]);
    fork.send_frame(&[0x11, 0x00, 0x22]).unwrap();

    let expected = encode_frame(&[0x11, 0x00, 0x22]).unwrap().to_vec();
    for channel in fork.channels() {
        assert_eq!(channel.writes, vec![expected.clone()]);
    }
}

#[test]
fn dyn_handler_is_accepted() {
    let mut fork = SerialFork::new([MockChannel::with_frames(true, &[b"x"])]);
    let mut rec = Recorder::default();
    let handler: &mut dyn PacketHandler = &mut rec;
    assert_eq!(fork.poll(handler), 1);
    assert_eq!(rec.frames, vec![b"x".to_vec()]);
}

// ── Full stack over simulated UARTs ──────────────────────────

fn usb(fork: &mut SerialFork<Link<UartPort, UartPort>, 2>) -> &mut UartPort {
    match &mut fork.channels_mut()[0] {
        Link::Wired(c) => c.port_mut(),
        Link::Bluetooth(_) => unreachable!("channel 0 is wired"),
    }
}

fn bt(fork: &mut SerialFork<Link<UartPort, UartPort>, 2>) -> &mut UartPort {
    match &mut fork.channels_mut()[1] {
        Link::Bluetooth(c) => c.port_mut(),
        Link::Wired(_) => unreachable!("channel 1 is wireless"),
    }
}

#[test]
fn wired_and_wireless_frames_reach_handler_in_priority_order() {
    let mut fork =
        SerialFork::from_config(UartPort::new(), UartPort::new(), &LinkConfig::default());

    bt(&mut fork).inject_rx(CON);
    bt(&mut fork).inject_rx(&encode_frame(b"bt-1").unwrap());
    usb(&mut fork).inject_rx(&encode_frame(b"usb-1").unwrap());
    usb(&mut fork).inject_rx(&encode_frame(b"usb-2").unwrap());

    let mut rec = Recorder::default();
    assert_eq!(fork.poll(&mut rec), 3);
    assert_eq!(
        rec.frames,
        vec![b"usb-1".to_vec(), b"usb-2".to_vec(), b"bt-1".to_vec()]
    );
    assert_eq!(fork.connected_count(), 2);
}

#[test]
fn wireless_frames_before_handshake_are_never_delivered() {
    let mut fork =
        SerialFork::from_config(UartPort::new(), UartPort::new(), &LinkConfig::default());
    bt(&mut fork).inject_rx(&encode_frame(b"early").unwrap());

    let mut rec = Recorder::default();
    assert_eq!(fork.poll(&mut rec), 0);
    assert!(!fork.channels()[1].is_connected());
}

#[test]
fn outbound_frame_decodes_on_the_wired_link() {
    let mut fork =
        SerialFork::from_config(UartPort::new(), UartPort::new(), &LinkConfig::default());
    assert_eq!(usb(&mut fork).baud_rate(), 9_600);

    fork.send_frame(b"telemetry\x00ok").unwrap();

    let wire = usb(&mut fork).take_tx();
    let mut decoder = CobsDecoder::new();
    let mut frames = Vec::new();
    for b in wire {
        if decoder.append(b) == DecodeStatus::Complete {
            frames.push(decoder.payload().to_vec());
        }
    }
    assert_eq!(frames, vec![b"telemetry\x00ok".to_vec()]);
}

#[test]
fn wired_read_errors_are_absorbed() {
    let mut fork =
        SerialFork::from_config(UartPort::new(), UartPort::new(), &LinkConfig::default());
    usb(&mut fork).inject_rx(&encode_frame(b"lost").unwrap());
    usb(&mut fork).set_faulted(true);

    let mut rec = Recorder::default();
    assert_eq!(fork.poll(&mut rec), 0);
    fork.write(b"\x01\x00");

    usb(&mut fork).set_faulted(false);
    assert_eq!(fork.poll(&mut rec), 1);
}

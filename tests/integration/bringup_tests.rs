//! Integration tests for wireless module bring-up over a simulated UART.

use flightlink::adapters::uart::UartPort;
use flightlink::transport::bluetooth::{
    BaudRate, BluetoothChannel, ConnectionState, TRANSPARENT_MODE_COMMAND,
};
use flightlink::transport::channel::Channel;
use flightlink::transport::cobs::encode_frame;

const CON: &[u8] = b"\r\nCON\r\n";

fn config_lines(selector: u8) -> Vec<u8> {
    let mut lines = b"BST500000".to_vec();
    lines.push(selector);
    lines.extend_from_slice(b"\r\n");
    lines.extend_from_slice(TRANSPARENT_MODE_COMMAND);
    lines
}

#[test]
fn construction_sends_configuration_commands() {
    let mut bt = BluetoothChannel::new(UartPort::new(), 115_200);
    assert_eq!(bt.port().baud_rate(), 115_200);
    assert_eq!(bt.port_mut().take_tx(), config_lines(b'5'));
    assert_eq!(bt.connection_state(), ConnectionState::Initial);
    assert!(!bt.is_connected());
}

#[test]
fn unsupported_rate_behaves_like_9600() {
    let mut slow = BluetoothChannel::new(UartPort::new(), 1_200);
    let mut reference = BluetoothChannel::new(UartPort::new(), 9_600);

    assert_eq!(slow.baud_rate(), BaudRate::B9600);
    assert_eq!(slow.baud_rate().selector(), reference.baud_rate().selector());
    assert_eq!(slow.port().baud_rate(), 9_600);
    assert_eq!(slow.port_mut().take_tx(), reference.port_mut().take_tx());
}

#[test]
fn commands_are_resent_until_connected() {
    let mut bt = BluetoothChannel::new(UartPort::new(), 57_600);
    bt.port_mut().take_tx();

    assert!(!bt.try_read_frame());
    assert_eq!(bt.port_mut().take_tx(), config_lines(b'4'));

    bt.port_mut().inject_rx(CON);
    assert!(!bt.try_read_frame());
    assert!(bt.is_connected());
    assert!(bt.port_mut().take_tx().is_empty());

    bt.connect();
    assert!(bt.port_mut().take_tx().is_empty());
}

#[test]
fn confirmation_split_across_polls_still_connects() {
    let mut bt = BluetoothChannel::new(UartPort::new(), 115_200);
    bt.port_mut().inject_rx(&CON[..3]);
    assert!(!bt.try_read_frame());
    assert_eq!(bt.connection_state(), ConnectionState::MatchC);

    bt.port_mut().inject_rx(&CON[3..]);
    bt.try_read_frame();
    assert_eq!(bt.connection_state(), ConnectionState::Connected);
}

#[test]
fn duplicated_cr_before_final_lf_connects() {
    let mut bt = BluetoothChannel::new(UartPort::new(), 115_200);
    bt.port_mut().inject_rx(&[13, 10, b'C', b'O', b'N', 13, 13, 10]);
    bt.update();
    assert!(bt.is_connected());
}

#[test]
fn mismatch_at_o_returns_to_initial() {
    let mut bt = BluetoothChannel::new(UartPort::new(), 115_200);
    bt.port_mut().inject_rx(&[13, 10, b'C', b'X']);
    bt.update();
    assert_eq!(bt.connection_state(), ConnectionState::Initial);

    bt.port_mut().inject_rx(&[b'N', 13, 10]);
    bt.update();
    assert!(!bt.is_connected());
}

#[test]
fn bytes_after_confirmation_are_frame_input() {
    let mut bt = BluetoothChannel::new(UartPort::new(), 115_200);
    let mut wire = CON.to_vec();
    wire.extend_from_slice(&encode_frame(&[0x10, 0x00, 0x20]).unwrap());
    wire.extend_from_slice(&encode_frame(&[0x30]).unwrap());
    bt.port_mut().inject_rx(&wire);

    assert!(bt.try_read_frame());
    assert_eq!(bt.current_frame(), &[0x10, 0x00, 0x20]);
    assert!(bt.try_read_frame());
    assert_eq!(bt.current_frame(), &[0x30]);
    assert!(!bt.try_read_frame());
    assert_eq!(bt.stats().frames, 2);
}

#[test]
fn connected_text_after_handshake_is_decoder_noise() {
    let mut bt = BluetoothChannel::new(UartPort::new(), 115_200);
    bt.port_mut().inject_rx(CON);
    bt.update();

    // A re-sent confirmation now lands in the decoder and must not yield a frame
    // that swallows the real one.
    bt.port_mut().inject_rx(CON);
    bt.port_mut().inject_rx(&[0x00]);
    bt.port_mut().inject_rx(&encode_frame(b"ok").unwrap());

    let mut frames = Vec::new();
    while bt.try_read_frame() {
        frames.push(bt.current_frame().to_vec());
    }
    assert_eq!(frames.last(), Some(&b"ok".to_vec()));
    assert!(bt.is_connected());
}

#[test]
fn writes_are_dropped_until_connected() {
    let mut bt = BluetoothChannel::new(UartPort::new(), 115_200);
    bt.port_mut().take_tx();

    bt.write_raw(b"\x02\x41\x00");
    assert!(bt.port_mut().take_tx().is_empty());
    assert_eq!(bt.dropped_writes(), 1);

    bt.port_mut().inject_rx(CON);
    bt.update();
    bt.write_raw(b"\x02\x41\x00");
    assert_eq!(bt.port_mut().take_tx(), b"\x02\x41\x00");
}

#[test]
fn full_tx_buffer_never_blocks_command_resend() {
    let mut port = UartPort::new();
    port.set_tx_capacity(Some(16));
    let mut bt = BluetoothChannel::new(port, 115_200);

    for _ in 0..50 {
        assert!(!bt.try_read_frame());
    }
    assert!(!bt.is_connected());
    assert_eq!(bt.port_mut().take_tx(), config_lines(b'5')[..16].to_vec());

    bt.port_mut().inject_rx(CON);
    assert!(!bt.try_read_frame());
    assert!(bt.is_connected());
}

#[test]
fn handshake_stops_reading_once_connected() {
    let mut bt = BluetoothChannel::new(UartPort::new(), 115_200);
    let frame = encode_frame(b"fc").unwrap();
    let mut wire = CON.to_vec();
    wire.extend_from_slice(&frame);
    bt.port_mut().inject_rx(&wire);

    bt.update();
    assert!(bt.is_connected());
    assert_eq!(bt.port().pending_rx(), frame.len());

    bt.update();
    assert_eq!(bt.port().pending_rx(), frame.len());
}

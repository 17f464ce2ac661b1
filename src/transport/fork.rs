//! Serial fork — fan-in of decoded frames, fan-out of outbound bytes.
//!
//! ```text
//!            ┌──────────────┐ poll()  ┌─────────────────┐
//!  USB  ───▶ │ channel[0]   │───────▶ │                 │
//!            ├──────────────┤         │  PacketHandler  │
//!  BT   ───▶ │ channel[1]   │───────▶ │                 │
//!            └──────────────┘         └─────────────────┘
//!                  ▲ write(): same bytes to every channel
//! ```
//!
//! Priority is array position.  One `poll` drains every frame already
//! buffered on channel 0 before looking at channel 1, and so on.

use log::{debug, warn};

use super::bluetooth::BluetoothChannel;
use super::channel::{Channel, WiredChannel};
use super::cobs::encode_frame;
use super::port::SerialPort;
use crate::config::LinkConfig;
use crate::error::CodecError;

/// Consumer of decoded frames.
///
/// The payload slice is only valid for the duration of the call; copy out
/// anything that must outlive it.
pub trait PacketHandler {
    fn process_data(&mut self, payload: &[u8]);
}

impl<F: FnMut(&[u8])> PacketHandler for F {
    fn process_data(&mut self, payload: &[u8]) {
        self(payload);
    }
}

// ── Channel kinds ────────────────────────────────────────────

/// The two link kinds a flight controller carries.
pub enum Link<W, B> {
    Wired(WiredChannel<W>),
    Bluetooth(BluetoothChannel<B>),
}

impl<W: SerialPort, B: SerialPort> Channel for Link<W, B> {
    fn try_read_frame(&mut self) -> bool {
        match self {
            Self::Wired(c) => c.try_read_frame(),
            Self::Bluetooth(c) => c.try_read_frame(),
        }
    }

    fn current_frame(&self) -> &[u8] {
        match self {
            Self::Wired(c) => c.current_frame(),
            Self::Bluetooth(c) => c.current_frame(),
        }
    }

    fn write_raw(&mut self, data: &[u8]) {
        match self {
            Self::Wired(c) => c.write_raw(data),
            Self::Bluetooth(c) => c.write_raw(data),
        }
    }

    fn is_connected(&self) -> bool {
        match self {
            Self::Wired(c) => c.is_connected(),
            Self::Bluetooth(c) => c.is_connected(),
        }
    }
}

// ── Multiplexer ──────────────────────────────────────────────

/// Fixed, priority-ordered set of channels.
pub struct SerialFork<C, const N: usize> {
    channels: [C; N],
}

impl<C: Channel, const N: usize> SerialFork<C, N> {
    /// Index 0 is the highest-priority channel.
    pub fn new(channels: [C; N]) -> Self {
        Self { channels }
    }

    /// Deliver every buffered frame to `handler`, channel by channel.
    ///
    /// Returns the number of frames dispatched.
    pub fn poll<H: PacketHandler + ?Sized>(&mut self, handler: &mut H) -> usize {
        let mut dispatched = 0;
        for channel in &mut self.channels {
            while channel.try_read_frame() {
                handler.process_data(channel.current_frame());
                dispatched += 1;
            }
        }
        dispatched
    }

    /// Send `data` on every channel, connected or not.
    pub fn write(&mut self, data: &[u8]) {
        for channel in &mut self.channels {
            channel.write_raw(data);
        }
    }

    /// Stuff `payload` into a frame and broadcast it.
    pub fn send_frame(&mut self, payload: &[u8]) -> Result<(), CodecError> {
        let frame = encode_frame(payload)?;
        debug!("fork: sending frame ({} -> {} bytes)", payload.len(), frame.len());
        self.write(&frame);
        Ok(())
    }

    /// Number of channels currently usable for framed traffic.
    pub fn connected_count(&self) -> usize {
        self.channels.iter().filter(|c| c.is_connected()).count()
    }

    pub fn channels(&self) -> &[C; N] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [C; N] {
        &mut self.channels
    }
}

impl<W: SerialPort, B: SerialPort> SerialFork<Link<W, B>, 2> {
    /// Standard board layout: wired link first, wireless link second.
    pub fn from_config(mut wired: W, wireless: B, config: &LinkConfig) -> Self {
        if let Err(e) = wired.set_baud_rate(config.wired_baud_rate) {
            warn!("USB: could not set {} bps: {:?}", config.wired_baud_rate, e);
        }
        Self::new([
            Link::Wired(WiredChannel::new(wired)),
            Link::Bluetooth(BluetoothChannel::new(wireless, config.wireless_baud_rate)),
        ])
    }
}

//! Wireless UART module bring-up.
//!
//! The module powers up in command mode.  Before it can carry frames the
//! driver sends two AT-style lines and waits for the module to answer with
//! `"\r\nCON\r\n"`:
//!
//! ```text
//!   driver ──▶ "BST500000<sel>\r\n"   set working baud rate
//!   driver ──▶ "BCD3\r\n"             switch to transparent data mode
//!   module ──▶ "\r\nCON\r\n"          connected
//! ```
//!
//! Until the confirmation has been matched every received byte goes to the
//! handshake matcher; afterwards every byte goes to the frame decoder.
//! There is no timeout: a silent module simply leaves the channel
//! disconnected while the commands keep being re-sent.
//!
//! | Rate (bps) | Selector |
//! |-----------:|:--------:|
//! |   9600     |   `1`    |
//! |  19200     |   `2`    |
//! |  38400     |   `3`    |
//! |  57600     |   `4`    |
//! | 115200     |   `5`    |
//! | 230400     |   `6`    |
//! | 460800     |   `7`    |
//! | 921600     |   `8`    |

use log::{debug, info, trace, warn};

use super::channel::{Channel, drain_frame, transmit};
use super::cobs::{CobsDecoder, DecoderStats};
use super::port::SerialPort;

const CR: u8 = 13;
const LF: u8 = 10;

/// Confirmation the module prints once it is in transparent mode.
const EXPECTED: [u8; 7] = [CR, LF, b'C', b'O', b'N', CR, LF];

/// Prefix of the set-baud-rate command; the selector byte and CR LF follow.
const BAUD_COMMAND_PREFIX: &[u8] = b"BST500000";

/// Switch the module to transparent data mode.
pub const TRANSPARENT_MODE_COMMAND: &[u8] = b"BCD3\r\n";

/// Length of a complete set-baud-rate command line.
pub const BAUD_COMMAND_LEN: usize = BAUD_COMMAND_PREFIX.len() + 3;

// ── Baud negotiation ─────────────────────────────────────────

/// Rates the module understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaudRate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B230400,
    B460800,
    B921600,
}

impl BaudRate {
    /// Resolve a requested rate; anything unsupported falls back to 9600.
    pub const fn from_bps(bps: u32) -> Self {
        match bps {
            19_200 => Self::B19200,
            38_400 => Self::B38400,
            57_600 => Self::B57600,
            115_200 => Self::B115200,
            230_400 => Self::B230400,
            460_800 => Self::B460800,
            921_600 => Self::B921600,
            _ => Self::B9600,
        }
    }

    pub const fn bps(self) -> u32 {
        match self {
            Self::B9600 => 9_600,
            Self::B19200 => 19_200,
            Self::B38400 => 38_400,
            Self::B57600 => 57_600,
            Self::B115200 => 115_200,
            Self::B230400 => 230_400,
            Self::B460800 => 460_800,
            Self::B921600 => 921_600,
        }
    }

    /// ASCII selector symbol used in the set-baud-rate command.
    pub const fn selector(self) -> u8 {
        match self {
            Self::B9600 => b'1',
            Self::B19200 => b'2',
            Self::B38400 => b'3',
            Self::B57600 => b'4',
            Self::B115200 => b'5',
            Self::B230400 => b'6',
            Self::B460800 => b'7',
            Self::B921600 => b'8',
        }
    }

    /// Full `BST500000<sel>\r\n` command line.
    pub fn command(self) -> [u8; BAUD_COMMAND_LEN] {
        let mut line = [0u8; BAUD_COMMAND_LEN];
        let prefix = BAUD_COMMAND_PREFIX.len();
        line[..prefix].copy_from_slice(BAUD_COMMAND_PREFIX);
        line[prefix] = self.selector();
        line[prefix + 1] = CR;
        line[prefix + 2] = LF;
        line
    }
}

// ── Handshake matcher ────────────────────────────────────────

/// Position in the confirmation sequence.
///
/// Each state names the last byte matched; `Connected` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ConnectionState {
    Initial = 0,
    MatchCr1 = 1,
    MatchLf1 = 2,
    MatchC = 3,
    MatchO = 4,
    MatchN = 5,
    MatchCr2 = 6,
    Connected = 7,
}

impl ConnectionState {
    const fn next(self) -> Self {
        match self {
            Self::Initial => Self::MatchCr1,
            Self::MatchCr1 => Self::MatchLf1,
            Self::MatchLf1 => Self::MatchC,
            Self::MatchC => Self::MatchO,
            Self::MatchO => Self::MatchN,
            Self::MatchN => Self::MatchCr2,
            Self::MatchCr2 | Self::Connected => Self::Connected,
        }
    }
}

/// Byte-wise matcher for the `"\r\nCON\r\n"` confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handshake {
    state: ConnectionState,
}

impl Handshake {
    pub const fn new() -> Self {
        Self {
            state: ConnectionState::Initial,
        }
    }

    /// Match one received byte.  Ignored once connected.
    ///
    /// A mismatch restarts from `Initial`, except in `MatchCr2`, where the
    /// matcher holds its position (a repeated CR before the final LF).
    pub fn feed(&mut self, byte: u8) -> ConnectionState {
        if self.state == ConnectionState::Connected {
            return self.state;
        }
        if byte == EXPECTED[self.state as usize] {
            self.state = self.state.next();
        } else if self.state != ConnectionState::MatchCr2 {
            self.state = ConnectionState::Initial;
        }
        self.state
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

// ── Bluetooth channel ────────────────────────────────────────

/// Wireless link gated on a completed bring-up handshake.
pub struct BluetoothChannel<P> {
    port: P,
    baud: BaudRate,
    handshake: Handshake,
    decoder: CobsDecoder,
    dropped_writes: u32,
}

impl<P: SerialPort> BluetoothChannel<P> {
    /// Open the link at the negotiated rate and send the configuration
    /// commands.  An unsupported `baud_rate` silently becomes 9600.
    pub fn new(mut port: P, baud_rate: u32) -> Self {
        let baud = BaudRate::from_bps(baud_rate);
        if baud.bps() != baud_rate {
            debug!("BT: {} bps unsupported, using {}", baud_rate, baud.bps());
        }
        if let Err(e) = port.set_baud_rate(baud.bps()) {
            warn!("BT: could not set {} bps: {:?}", baud.bps(), e);
        }

        let mut channel = Self {
            port,
            baud,
            handshake: Handshake::new(),
            decoder: CobsDecoder::new(),
            dropped_writes: 0,
        };
        channel.connect();
        channel
    }

    /// Run waiting bytes through the handshake matcher.
    pub fn update(&mut self) {
        while !self.handshake.is_connected() && self.port.available() {
            match self.port.read_byte() {
                Ok(Some(byte)) => {
                    if self.handshake.feed(byte) == ConnectionState::Connected {
                        info!("BT: module connected at {} bps", self.baud.bps());
                    }
                }
                Ok(None) => return,
                Err(e) => {
                    warn!("BT: read failed: {:?}", e);
                    return;
                }
            }
        }
    }

    /// (Re-)send the configuration commands unless already connected.
    pub fn connect(&mut self) {
        if self.handshake.is_connected() {
            return;
        }
        debug!("BT: configuring module (selector '{}')", self.baud.selector() as char);
        transmit(&mut self.port, &self.baud.command(), "BT");
        transmit(&mut self.port, TRANSPARENT_MODE_COMMAND, "BT");
    }

    pub fn baud_rate(&self) -> BaudRate {
        self.baud
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.handshake.state()
    }

    /// Writes discarded because the module was still in command mode.
    pub fn dropped_writes(&self) -> u32 {
        self.dropped_writes
    }

    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}

impl<P: SerialPort> Channel for BluetoothChannel<P> {
    fn try_read_frame(&mut self) -> bool {
        self.update();
        if !self.handshake.is_connected() {
            self.connect();
            return false;
        }
        drain_frame(&mut self.port, &mut self.decoder, "BT")
    }

    fn current_frame(&self) -> &[u8] {
        self.decoder.payload()
    }

    fn write_raw(&mut self, data: &[u8]) {
        if !self.handshake.is_connected() {
            // Frame bytes would be parsed as AT commands.
            self.dropped_writes = self.dropped_writes.wrapping_add(1);
            trace!("BT: not connected, dropped {} bytes", data.len());
            return;
        }
        transmit(&mut self.port, data, "BT");
    }

    fn is_connected(&self) -> bool {
        self.handshake.is_connected()
    }
}

//! Channel capability — a serial link that speaks whole frames.
//!
//! A channel owns its raw [`SerialPort`] and a per-link [`CobsDecoder`].
//! Reads pull at most the bytes already waiting on the port and stop at
//! the first completed frame, so anything after it stays queued for the
//! next `try_read_frame` call.

use log::{debug, warn};

use super::cobs::{CobsDecoder, DecodeStatus, DecoderStats};
use super::port::SerialPort;

/// Uniform read/write/connected contract over every physical link.
pub trait Channel {
    /// Pull bytes until a frame completes or the port runs dry.
    ///
    /// Returns `true` iff a new frame is ready in [`current_frame`](Self::current_frame).
    /// Call repeatedly to drain several buffered frames one at a time.
    fn try_read_frame(&mut self) -> bool;

    /// Payload of the last frame reported by `try_read_frame`.
    /// Valid until the next `try_read_frame` call.
    fn current_frame(&self) -> &[u8];

    /// Transmit raw (already framed) bytes. Failures are absorbed.
    fn write_raw(&mut self, data: &[u8]);

    /// Whether the link is usable for framed traffic.
    fn is_connected(&self) -> bool;
}

// ── Shared helpers ───────────────────────────────────────────

/// Feed waiting bytes from `port` into `decoder` until a frame completes.
pub(crate) fn drain_frame<P: SerialPort>(
    port: &mut P,
    decoder: &mut CobsDecoder,
    label: &str,
) -> bool {
    while port.available() {
        let byte = match port.read_byte() {
            Ok(Some(byte)) => byte,
            Ok(None) => return false,
            Err(e) => {
                warn!("{}: read failed: {:?}", label, e);
                return false;
            }
        };
        match decoder.append(byte) {
            DecodeStatus::Pending => {}
            DecodeStatus::Complete => {
                debug!("{}: frame ({} bytes)", label, decoder.payload().len());
                return true;
            }
            DecodeStatus::Malformed => {
                warn!(
                    "{}: malformed frame dropped ({} so far)",
                    label,
                    decoder.stats().malformed
                );
            }
        }
    }
    false
}

/// Write all of `data`, logging (not propagating) short writes and errors.
pub(crate) fn transmit<P: SerialPort>(port: &mut P, data: &[u8], label: &str) {
    match port.write(data) {
        Ok(n) if n < data.len() => {
            warn!("{}: short write ({}/{} bytes)", label, n, data.len());
        }
        Ok(_) => {}
        Err(e) => warn!("{}: write failed: {:?}", label, e),
    }
}

// ── Wired channel ────────────────────────────────────────────

/// Always-connected wired link (USB serial).
pub struct WiredChannel<P> {
    port: P,
    decoder: CobsDecoder,
}

impl<P: SerialPort> WiredChannel<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            decoder: CobsDecoder::new(),
        }
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }
}

impl<P: SerialPort> Channel for WiredChannel<P> {
    fn try_read_frame(&mut self) -> bool {
        drain_frame(&mut self.port, &mut self.decoder, "USB")
    }

    fn current_frame(&self) -> &[u8] {
        self.decoder.payload()
    }

    fn write_raw(&mut self, data: &[u8]) {
        transmit(&mut self.port, data, "USB");
    }

    fn is_connected(&self) -> bool {
        true
    }
}

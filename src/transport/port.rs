//! Raw serial link abstraction — one UART endpoint, no framing.
//!
//! Concrete implementations:
//! - [`UartPort`](crate::adapters::uart::UartPort) (ESP-IDF UART driver, or
//!   an in-memory simulation on the host)
//! - [`NullPort`] for unpopulated board slots
//!
//! Channels are generic over `SerialPort`, so a new physical link needs
//! zero changes to the codec or bring-up logic.

/// Byte-oriented, non-blocking serial link.
pub trait SerialPort {
    /// Error type for this link.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the link without blocking.
    /// Returns the number of bytes actually accepted; the rest is dropped.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;

    /// Reconfigure the link speed.
    fn set_baud_rate(&mut self, bps: u32) -> Result<(), Self::Error>;

    /// Read a single byte, `None` if nothing is waiting.
    fn read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
}

/// A null link that discards all writes and never reads.
/// Stands in for a board slot with no module fitted.
pub struct NullPort;

impl SerialPort for NullPort {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn available(&self) -> bool {
        false
    }

    fn set_baud_rate(&mut self, _bps: u32) -> Result<(), ()> {
        Ok(())
    }
}

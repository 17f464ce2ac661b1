//! UART serial port adapter.
//!
//! Implements [`SerialPort`](crate::transport::port::SerialPort) for one
//! hardware UART.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: wraps an ESP-IDF `UartDriver`.  Reads use a
//!   zero tick timeout and writes go through `write_nb`, so neither blocks
//!   the control loop; bytes that do not fit are reported as a short write.
//! - **all other targets**: in-memory simulation.  Tests inject received
//!   bytes with [`UartPort::inject_rx`] and inspect transmitted bytes with
//!   [`UartPort::take_tx`].

use crate::error::LinkError;
use crate::transport::port::SerialPort;

// ───────────────────────────────────────────────────────────────
// ESP-IDF implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod imp {
    use esp_idf_svc::hal::delay::NON_BLOCK;
    use esp_idf_svc::hal::uart::UartDriver;
    use esp_idf_svc::hal::units::Hertz;
    use esp_idf_svc::sys::EspError;

    use super::{LinkError, SerialPort};

    /// Hardware UART owned by one channel.
    pub struct UartPort {
        driver: UartDriver<'static>,
    }

    impl UartPort {
        pub fn new(driver: UartDriver<'static>) -> Self {
            Self { driver }
        }
    }

    fn io(e: EspError) -> LinkError {
        LinkError::Io(e.code())
    }

    impl SerialPort for UartPort {
        type Error = LinkError;

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
            self.driver.read(buf, NON_BLOCK).map_err(io)
        }

        fn write(&mut self, data: &[u8]) -> Result<usize, LinkError> {
            // Only what fits in the TX FIFO is accepted; never wait for space.
            self.driver.write_nb(data).map_err(io)
        }

        fn available(&self) -> bool {
            self.driver.remaining_read().map(|n| n > 0).unwrap_or(false)
        }

        fn set_baud_rate(&mut self, bps: u32) -> Result<(), LinkError> {
            self.driver
                .change_baudrate(Hertz(bps))
                .map(|_| ())
                .map_err(|_| LinkError::BaudRate(bps))
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod imp {
    use std::collections::VecDeque;

    use super::{LinkError, SerialPort};

    /// Simulated UART with in-memory RX/TX buffers.
    #[derive(Debug, Default)]
    pub struct UartPort {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
        baud_rate: u32,
        faulted: bool,
        tx_capacity: Option<usize>,
    }

    impl UartPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue bytes as if they had arrived on the wire.
        pub fn inject_rx(&mut self, data: &[u8]) {
            self.rx.extend(data);
        }

        /// Everything written since the last call.
        pub fn take_tx(&mut self) -> Vec<u8> {
            core::mem::take(&mut self.tx)
        }

        /// Bytes still waiting to be read.
        pub fn pending_rx(&self) -> usize {
            self.rx.len()
        }

        /// Last rate applied with `set_baud_rate` (0 if never set).
        pub fn baud_rate(&self) -> u32 {
            self.baud_rate
        }

        /// Limit how many unread TX bytes the port holds, like a full FIFO.
        pub fn set_tx_capacity(&mut self, capacity: Option<usize>) {
            self.tx_capacity = capacity;
        }

        /// Make every subsequent read and write fail.
        pub fn set_faulted(&mut self, faulted: bool) {
            self.faulted = faulted;
        }
    }

    impl SerialPort for UartPort {
        type Error = LinkError;

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
            if self.faulted {
                return Err(LinkError::Io(-1));
            }
            let n = buf.len().min(self.rx.len());
            for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }

        fn write(&mut self, data: &[u8]) -> Result<usize, LinkError> {
            if self.faulted {
                return Err(LinkError::Io(-1));
            }
            let room = match self.tx_capacity {
                Some(cap) => cap.saturating_sub(self.tx.len()),
                None => data.len(),
            };
            let n = data.len().min(room);
            self.tx.extend_from_slice(&data[..n]);
            Ok(n)
        }

        fn available(&self) -> bool {
            !self.rx.is_empty()
        }

        fn set_baud_rate(&mut self, bps: u32) -> Result<(), LinkError> {
            self.baud_rate = bps;
            Ok(())
        }
    }
}

pub use imp::UartPort;

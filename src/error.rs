//! Unified error types for the transport layer.
//!
//! Almost nothing in this crate is allowed to fail outward: malformed frames,
//! handshake mismatches and raw-link I/O errors are absorbed where they happen.
//! The few operations that can fail (encoding an oversized payload, loading a
//! bad configuration) funnel into the single `Error` enum below.  All variants
//! are `Copy` so they can be passed around without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Frame encoding failed.
    Codec(CodecError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "codec: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Payload is longer than the decoder on the far side can hold.
    PayloadTooLarge { len: usize },
    /// Caller-supplied output buffer cannot hold the stuffed frame.
    OutputTooSmall { needed: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadTooLarge { len } => write!(f, "payload of {len} bytes exceeds frame limit"),
            Self::OutputTooSmall { needed } => write!(f, "output buffer too small ({needed} bytes needed)"),
        }
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Driver-level read/write failure (ESP-IDF error code on target).
    Io(i32),
    /// The requested baud rate could not be applied.
    BaudRate(u32),
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(rc) => write!(f, "UART I/O failed (rc={rc})"),
            Self::BaudRate(bps) => write!(f, "cannot set baud rate {bps}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

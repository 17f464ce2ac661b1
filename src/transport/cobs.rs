//! Consistent Overhead Byte Stuffing (COBS) frame codec.
//!
//! Wire format:
//! ```text
//! ┌────────┬──────────────┬────────┬──────────────┬─────┬──────┐
//! │ Marker │ run (M-1 B)  │ Marker │ run (M-1 B)  │ ... │ 0x00 │
//! └────────┴──────────────┴────────┴──────────────┴─────┴──────┘
//! ```
//!
//! Each marker `M` (1..=255) is followed by `M - 1` literal non-zero bytes.
//! A marker below `0xFF` implies a zero byte after its run unless that run
//! ends the frame; `0xFF` marks a full 254-byte run with no implied zero.
//! The delimiter `0x00` therefore only ever appears as the frame terminator.
//!
//! The decoder consumes one byte at a time with no look-ahead, so it can be
//! fed straight from a UART FIFO between control-loop work.  Corrupt input
//! never wedges it: the partial frame is dropped and decoding picks up again
//! after the next delimiter.

use heapless::Vec;

use crate::error::CodecError;

/// Frame terminator byte.
pub const DELIMITER: u8 = 0x00;

/// Largest decoded payload a frame may carry (the decoder's buffer size).
pub const MAX_PAYLOAD_LEN: usize = 500;

/// Longest run of literal bytes between two markers.
const MAX_RUN: usize = 254;

/// Marker for a full run with no implied zero.
const FULL_RUN_MARKER: u8 = 0xFF;

/// Worst-case stuffed size of a `payload_len`-byte payload, terminator included.
pub const fn max_encoded_len(payload_len: usize) -> usize {
    payload_len + payload_len / MAX_RUN + 2
}

/// Worst-case size of any frame this crate emits or accepts.
pub const MAX_FRAME_LEN: usize = max_encoded_len(MAX_PAYLOAD_LEN);

/// Stuff `payload` into `out`, terminator included.
///
/// Returns the number of bytes written.  `out` must hold at least
/// [`max_encoded_len`]`(payload.len())` bytes.
pub fn encode(payload: &[u8], out: &mut [u8]) -> Result<usize, CodecError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(CodecError::PayloadTooLarge { len: payload.len() });
    }
    let needed = max_encoded_len(payload.len());
    if out.len() < needed {
        return Err(CodecError::OutputTooSmall { needed });
    }

    let mut marker_idx = 0;
    let mut write = 1;
    let mut code: u8 = 1;

    for &byte in payload {
        if byte == DELIMITER {
            out[marker_idx] = code;
            marker_idx = write;
            write += 1;
            code = 1;
            continue;
        }

        out[write] = byte;
        write += 1;
        code += 1;

        if code == FULL_RUN_MARKER {
            out[marker_idx] = code;
            marker_idx = write;
            write += 1;
            code = 1;
        }
    }

    out[marker_idx] = code;
    out[write] = DELIMITER;
    Ok(write + 1)
}

/// Stuff `payload` into a fixed-capacity frame buffer.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8, MAX_FRAME_LEN>, CodecError> {
    let mut frame = Vec::new();
    // Capacity is MAX_FRAME_LEN, so the resize cannot fail.
    let _ = frame.resize(MAX_FRAME_LEN, 0);
    let len = encode(payload, &mut frame)?;
    frame.truncate(len);
    Ok(frame)
}

// ── Streaming decoder ────────────────────────────────────────

/// Outcome of feeding one byte to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Byte consumed, no frame boundary yet.
    Pending,
    /// A frame just ended; its payload is available via [`CobsDecoder::payload`].
    Complete,
    /// The current frame was corrupt and has been dropped.
    Malformed,
}

/// Counters kept across the decoder's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    pub frames: u32,
    pub malformed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecoderState {
    /// Between frames. A delimiter here is stray noise.
    Idle,
    /// Next byte is a marker or the terminator.
    AwaitMarker { zero_pending: bool },
    /// Copying literal bytes of the current run.
    Run { remaining: u8, zero_after: bool },
    /// Frame overflowed; drop bytes until the next delimiter.
    Discard,
}

/// Streaming COBS decoder with a fixed accumulation buffer.
pub struct CobsDecoder {
    state: DecoderState,
    buffer: Vec<u8, MAX_PAYLOAD_LEN>,
    complete: bool,
    stats: DecoderStats,
}

impl CobsDecoder {
    pub const fn new() -> Self {
        Self {
            state: DecoderState::Idle,
            buffer: Vec::new(),
            complete: false,
            stats: DecoderStats {
                frames: 0,
                malformed: 0,
            },
        }
    }

    /// Feed one byte from the wire.
    ///
    /// Feeding a byte after [`DecodeStatus::Complete`] releases the previous
    /// payload; that byte belongs to the next frame.
    pub fn append(&mut self, byte: u8) -> DecodeStatus {
        if self.complete {
            self.complete = false;
            self.buffer.clear();
        }

        match self.state {
            DecoderState::Idle => {
                if byte == DELIMITER {
                    DecodeStatus::Pending
                } else {
                    self.start_run(byte, false)
                }
            }
            DecoderState::AwaitMarker { zero_pending } => {
                if byte == DELIMITER {
                    // A zero implied by the last run is not part of the payload.
                    self.complete = true;
                    self.state = DecoderState::Idle;
                    self.stats.frames = self.stats.frames.wrapping_add(1);
                    DecodeStatus::Complete
                } else {
                    self.start_run(byte, zero_pending)
                }
            }
            DecoderState::Run {
                remaining,
                zero_after,
            } => {
                if byte == DELIMITER {
                    // The delimiter ends the corrupt frame, so resync right here.
                    self.buffer.clear();
                    self.state = DecoderState::Idle;
                    self.stats.malformed = self.stats.malformed.wrapping_add(1);
                    return DecodeStatus::Malformed;
                }
                if self.buffer.push(byte).is_err() {
                    return self.overflow();
                }
                self.state = match remaining - 1 {
                    0 => DecoderState::AwaitMarker {
                        zero_pending: zero_after,
                    },
                    left => DecoderState::Run {
                        remaining: left,
                        zero_after,
                    },
                };
                DecodeStatus::Pending
            }
            DecoderState::Discard => {
                if byte == DELIMITER {
                    self.state = DecoderState::Idle;
                }
                DecodeStatus::Pending
            }
        }
    }

    fn start_run(&mut self, marker: u8, zero_pending: bool) -> DecodeStatus {
        if zero_pending && self.buffer.push(DELIMITER).is_err() {
            return self.overflow();
        }
        let zero_after = marker != FULL_RUN_MARKER;
        self.state = match marker - 1 {
            0 => DecoderState::AwaitMarker {
                zero_pending: zero_after,
            },
            remaining => DecoderState::Run {
                remaining,
                zero_after,
            },
        };
        DecodeStatus::Pending
    }

    fn overflow(&mut self) -> DecodeStatus {
        self.buffer.clear();
        self.state = DecoderState::Discard;
        self.stats.malformed = self.stats.malformed.wrapping_add(1);
        DecodeStatus::Malformed
    }

    /// True between a `Complete` result and the next `append`.
    pub fn is_done(&self) -> bool {
        self.complete
    }

    /// Payload of the frame that just completed; empty otherwise.
    pub fn payload(&self) -> &[u8] {
        if self.complete { self.buffer.as_slice() } else { &[] }
    }

    /// Drop any partial frame (e.g. after the link was reopened).
    pub fn reset(&mut self) {
        self.state = DecoderState::Idle;
        self.buffer.clear();
        self.complete = false;
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }
}

impl Default for CobsDecoder {
    fn default() -> Self {
        Self::new()
    }
}

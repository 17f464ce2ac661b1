//! Serial transport subsystem.
//!
//! Turns byte-oriented serial links into a channel for delimited
//! command/telemetry frames.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Transport Stack                         │
//! │                                                              │
//! │  ┌────────────┐   ┌─────────────┐   ┌──────────────────────┐ │
//! │  │ SerialPort │──▶│   Channel   │──▶│ SerialFork (poll)    │ │
//! │  │ (trait)    │   │ COBS decode │   │  → PacketHandler     │ │
//! │  └────────────┘   │ BT bring-up │   └──────────────────────┘ │
//! │        ▲          └─────────────┘              │             │
//! │        │                                       │             │
//! │        └────────── write(): every channel ◀────┘             │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod bluetooth;
pub mod channel;
pub mod cobs;
pub mod fork;
pub mod port;

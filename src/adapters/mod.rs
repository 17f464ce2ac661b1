//! Adapters — concrete implementations of the transport's port traits.
//!
//! | Adapter | Implements   | Connects to                          |
//! |---------|--------------|--------------------------------------|
//! | `uart`  | SerialPort   | ESP-IDF UART driver / host simulation |

pub mod uart;

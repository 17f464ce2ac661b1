//! Link configuration parameters
//!
//! Line rates for the two serial links.  Channel priority is fixed by the
//! board layout and is deliberately absent here.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transport::bluetooth::BaudRate;

/// Serial link configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Wired (USB serial) line rate in bps
    pub wired_baud_rate: u32,
    /// Requested wireless module rate in bps; unsupported rates fall back to 9600
    pub wireless_baud_rate: u32,
    /// Whether a wireless module is fitted; when false its slot gets a `NullPort`
    #[serde(default = "default_true")]
    pub wireless_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            wired_baud_rate: 9_600, // USB CDC ignores it
            wireless_baud_rate: 115_200,
            wireless_enabled: true,
        }
    }
}

impl LinkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.wired_baud_rate == 0 {
            return Err(Error::Config("wired baud rate must be non-zero"));
        }
        Ok(())
    }

    /// Rate the wireless module will actually be configured for.
    pub fn wireless_baud(&self) -> BaudRate {
        BaudRate::from_bps(self.wireless_baud_rate)
    }
}

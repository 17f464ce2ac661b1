//! Flight-controller link firmware — main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  UART0 (USB bridge)  ──┐                                 │
//! │                        ├──▶ SerialFork ──▶ FrameLogger    │
//! │  UART1 (BT module)   ──┘        ▲                        │
//! │                                 └── heartbeat frame / 1s │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The packet handler proper lives with the flight-control loop; this
//! binary only logs what arrives so the links can be bench-tested.
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::AnyIOPin;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::uart::{UartDriver, config::Config};
use esp_idf_svc::hal::units::Hertz;
use log::{info, warn};

use flightlink::adapters::uart::UartPort;
use flightlink::config::LinkConfig;
use flightlink::transport::fork::{Link, PacketHandler, SerialFork};
use flightlink::transport::port::{NullPort, SerialPort};

/// Control-loop period.
const TICK_MS: u32 = 10;
/// Ticks between heartbeat frames.
const HEARTBEAT_TICKS: u32 = 100;

/// Logs every decoded frame.
#[derive(Default)]
struct FrameLogger {
    frames: u32,
}

impl PacketHandler for FrameLogger {
    fn process_data(&mut self, payload: &[u8]) {
        self.frames = self.frames.wrapping_add(1);
        let head = &payload[..payload.len().min(8)];
        info!("RX #{} | {} bytes | {:02x?}", self.frames, payload.len(), head);
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("flightlink v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config ─────────────────────────────────────────────
    let config = LinkConfig::default();
    config.validate()?;

    // ── 3. UARTs ──────────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let usb = UartDriver::new(
        peripherals.uart0,
        peripherals.pins.gpio43,
        peripherals.pins.gpio44,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &Config::default().baudrate(Hertz(config.wired_baud_rate)),
    )?;
    let usb = UartPort::new(usb);

    if !config.wireless_enabled {
        info!("no wireless module fitted; USB only");
        run(SerialFork::from_config(usb, NullPort, &config));
    }

    let bt = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio17,
        peripherals.pins.gpio18,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &Config::default().baudrate(Hertz(config.wireless_baud().bps())),
    )?;
    run(SerialFork::from_config(usb, UartPort::new(bt), &config))
}

// ── 4. Cooperative loop ───────────────────────────────────────
fn run<W: SerialPort, B: SerialPort>(mut fork: SerialFork<Link<W, B>, 2>) -> ! {
    let mut logger = FrameLogger::default();
    let mut tick: u32 = 0;
    let mut was_connected = fork.connected_count();
    loop {
        fork.poll(&mut logger);

        let connected = fork.connected_count();
        if connected != was_connected {
            info!("links connected: {}/{}", connected, fork.channels().len());
            was_connected = connected;
        }

        tick = tick.wrapping_add(1);
        if tick % HEARTBEAT_TICKS == 0 {
            if let Err(e) = fork.send_frame(&logger.frames.to_le_bytes()) {
                warn!("heartbeat: {}", e);
            }
        }

        FreeRtos::delay_ms(TICK_MS);
    }
}

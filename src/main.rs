//! Sensor Bridge Firmware: Main Entry Point
//!
//! Hexagonal architecture driven by a timer interrupt.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter            UartLink            LogEventSink   │
//! │  (ADC1 + flow + GPTimer)    (listener link)     (EventSink)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            BridgeService (pure logic)                  │    │
//! │  │  FSM · gather · transform · notify · commands          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  GPTimer alarm ISR ──▶ TickFlag ◀── main loop                  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;
use log::{info, warn};

use sensorbridge::adapters::hardware::HardwareAdapter;
use sensorbridge::adapters::log_sink::LogEventSink;
use sensorbridge::adapters::uart::UartLink;
use sensorbridge::app::service::BridgeService;
use sensorbridge::config::{BridgeConfig, WATCHDOG_TIMEOUT_MS};
use sensorbridge::drivers::hw_init;
use sensorbridge::drivers::hw_timer::GpTimer;
use sensorbridge::drivers::watchdog::Watchdog;
use sensorbridge::error::Error;
use sensorbridge::events::TickFlag;
use sensorbridge::pins;

/// PendingTick: written by the GPTimer alarm ISR, read by the controller.
static TICK: TickFlag = TickFlag::new();

/// Compiled-in defaults, optionally overridden by a JSON document baked
/// in at build time through `SENSORBRIDGE_CONFIG`.
fn load_config() -> BridgeConfig {
    let Some(json) = option_env!("SENSORBRIDGE_CONFIG") else {
        return BridgeConfig::default();
    };
    match BridgeConfig::from_json(json.as_bytes()) {
        Ok(cfg) => {
            info!("Config override applied");
            cfg
        }
        Err(e) => {
            warn!("Config override rejected ({}), using defaults", e);
            BridgeConfig::default()
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SensorBridge v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = load_config();

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_peripherals()?;
    hw_init::init_isr_service()?;
    let watchdog = Watchdog::new(WATCHDOG_TIMEOUT_MS);

    let peripherals = Peripherals::take()?;
    let uart_config = UartConfig::new().baudrate(Hertz(config.baud_rate));
    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio17,
        peripherals.pins.gpio18,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &uart_config,
    )?;
    info!(
        "Listener link: UART1 TX GPIO{} RX GPIO{} @ {} baud",
        pins::LISTENER_UART_TX_GPIO,
        pins::LISTENER_UART_RX_GPIO,
        config.baud_rate
    );

    let timer = GpTimer::new(&TICK).map_err(Error::from)?;

    // ── 3. Adapters + service ─────────────────────────────────
    let mut hw = HardwareAdapter::new(UartLink::new(uart), timer);
    let mut sink = LogEventSink::new();
    let mut app = BridgeService::new(config, &TICK)?;
    app.start();

    info!("System ready. Entering controller loop.");

    // ── 4. Controller loop ────────────────────────────────────
    loop {
        // Nothing to do until the next tick: yield to the scheduler.
        if app.poll(&mut hw, &mut sink) == 0 && !TICK.is_pending() {
            FreeRtos::delay_ms(1);
        }

        // Feed watchdog on every iteration.
        watchdog.feed();
    }
}

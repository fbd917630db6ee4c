//! GPIO / peripheral pin assignments for the sensor bridge board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  `main` takes the UART pins from `Peripherals`
//! by name, so keep `gpio17`/`gpio18` there in step with the constants.

use crate::sensors::Channel;

// ---------------------------------------------------------------------------
// Sensors: Digital / Pulse
// ---------------------------------------------------------------------------

/// YF-S201 hall-effect flow sensor: pulse output, interrupt-driven.
pub const FLOW_PULSE_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Sensors: Analog (ADC1, 12 dB attenuation, 12-bit)
// ---------------------------------------------------------------------------

/// Conductivity probe front-end, ADC1 channel 4 (GPIO 5 on ESP32-S3).
pub const SALINITY_ADC_CHANNEL: u32 = 4;
/// pH amplifier output, ADC1 channel 8 (GPIO 9 on ESP32-S3).
pub const PH_ADC_CHANNEL: u32 = 8;

// ---------------------------------------------------------------------------
// Serial link to the listener
// ---------------------------------------------------------------------------

/// UART1 TX towards the listener.  The console stays on USB-Serial-JTAG.
pub const LISTENER_UART_TX_GPIO: i32 = 17;
/// UART1 RX from the listener.
pub const LISTENER_UART_RX_GPIO: i32 = 18;

/// Connection label reported in the sensor manifest.
pub const fn connection(channel: Channel) -> &'static str {
    match channel {
        Channel::FlowRate => "GPIO6",
        Channel::Salinity => "ADC1_CH4",
        Channel::Ph => "ADC1_CH8",
    }
}

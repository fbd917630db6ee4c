//! System configuration parameters
//!
//! All tunable parameters for the sensor bridge.  The defaults are compiled
//! in; a JSON override can be applied at boot via [`BridgeConfig::from_json`].
//!
//! ## Sampling interval
//!
//! The sampling timer runs from the 80 MHz APB clock through a fixed
//! divider of 1024, so one counter tick lasts 12.8 µs (78 125 Hz).  The
//! alarm fires when the counter reaches `timer_compare`:
//!
//! ```text
//! interval_ms = timer_compare * 1024 * 1000 / 80_000_000
//! 78_125 counts  ->  1000 ms   (default)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sensors::SamplingMask;
use crate::sensors::flow::FlowCalibration;
use crate::sensors::ph::PhCalibration;
use crate::sensors::salinity::SalinityCalibration;

/// Source clock feeding the sampling timer (ESP32 APB).
pub const SOURCE_CLOCK_HZ: u32 = 80_000_000;

/// Fixed prescaler between the source clock and the sampling counter.
pub const TIMER_CLOCK_DIVIDER: u32 = 1024;

/// Counter frequency after the divider.
pub const TIMER_TICK_HZ: u32 = SOURCE_CLOCK_HZ / TIMER_CLOCK_DIVIDER;

/// Upper bound on command polls per cycle, keeps the reporting interval
/// consistent when the listener floods the channel.
pub const MAX_MESSAGE_CHECKS: u8 = 20;

/// Task watchdog timeout for the controller loop.
pub const WATCHDOG_TIMEOUT_MS: u32 = 10_000;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    // --- Sampling ---
    /// Enabled channels (bit 0 flow, bit 1 salinity, bit 2 pH).
    pub sampling_mask: u8,
    /// Counter value at which the sampling interrupt fires.
    pub timer_compare: u32,

    // --- Command channel ---
    /// Maximum command bytes consumed per cycle.
    pub max_message_checks: u8,
    /// Hold DATA notifications after (re)start until the listener sends START.
    pub await_start_command: bool,

    // --- Serial ---
    /// UART baud rate towards the listener.
    pub baud_rate: u32,

    // --- Conversion ---
    pub flow: FlowCalibration,
    pub salinity: SalinityCalibration,
    pub ph: PhCalibration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            // Sampling
            sampling_mask: SamplingMask::ALL.bits(),
            timer_compare: TIMER_TICK_HZ, // 1 s

            // Command channel
            max_message_checks: MAX_MESSAGE_CHECKS,
            await_start_command: false,

            // Serial
            baud_rate: 38_400,

            // Conversion
            flow: FlowCalibration::default(),
            salinity: SalinityCalibration::default(),
            ph: PhCalibration::default(),
        }
    }
}

impl BridgeConfig {
    /// Parse a JSON override and validate it.  Missing fields keep their
    /// defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let config: Self =
            serde_json::from_slice(bytes).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would leave the controller unable to run.
    pub fn validate(&self) -> Result<()> {
        SamplingMask::new(self.sampling_mask)?;
        if self.timer_compare == 0 {
            return Err(Error::Config("timer_compare must be non-zero"));
        }
        if self.max_message_checks == 0 {
            return Err(Error::Config("max_message_checks must be non-zero"));
        }
        if self.baud_rate == 0 {
            return Err(Error::Config("baud_rate must be non-zero"));
        }
        if !positive(self.flow.pulses_per_litre) {
            return Err(Error::Config("flow.pulses_per_litre must be positive"));
        }
        if !positive(self.ph.slope_mv_per_ph) {
            return Err(Error::Config("ph.slope_mv_per_ph must be positive"));
        }
        if !positive(self.salinity.vref_mv) || !positive(self.ph.vref_mv) {
            return Err(Error::Config("ADC reference voltage must be positive"));
        }
        Ok(())
    }

    /// The validated sampling mask.
    pub fn mask(&self) -> Result<SamplingMask> {
        SamplingMask::new(self.sampling_mask)
    }

    /// Length of one sampling interval in milliseconds, rounded down.
    pub fn sample_interval_ms(&self) -> u32 {
        self.elapsed_ms(1) as u32
    }

    /// Milliseconds covered by `intervals` sampling intervals.  Computed
    /// from timer counts so truncation does not accumulate.
    pub fn elapsed_ms(&self, intervals: u64) -> u64 {
        let counts = u128::from(intervals) * u128::from(self.timer_compare);
        (counts * 1000 / u128::from(TIMER_TICK_HZ)) as u64
    }
}

/// Strictly positive and not NaN.
fn positive(v: f32) -> bool {
    v > 0.0
}

//! YF-S201 hall-effect water flow sensor.
//!
//! The sensor outputs one pulse per ~2.22 mL of water flow.  An ISR
//! increments an atomic counter on each rising edge; acquisition swaps it
//! to zero once per sampling interval, so the raw reading is the number of
//! pulses seen during the last interval.
//!
//! Because the ISR and the main loop run at different priorities, the
//! counter uses `AtomicU32` for lock-free access.

use core::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

/// Global atomic counter incremented by the GPIO ISR.
/// `static` because ISR callbacks in ESP-IDF cannot capture closures.
static FLOW_PULSE_COUNT: AtomicU32 = AtomicU32::new(0);

/// Called from the GPIO ISR on each rising edge.
pub fn flow_isr_handler() {
    FLOW_PULSE_COUNT.fetch_add(1, Ordering::Relaxed);
}

/// Atomically read and reset the pulse counter.
pub fn take_pulse_count() -> u32 {
    FLOW_PULSE_COUNT.swap(0, Ordering::Relaxed)
}

/// Calibration for the pulse → flow conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowCalibration {
    /// Datasheet: frequency (Hz) = 7.5 × flow_rate (L/min)
    /// → 450 pulses/min at 1 L/min → 450 pulses per litre.
    pub pulses_per_litre: f32,
}

impl Default for FlowCalibration {
    fn default() -> Self {
        Self {
            pulses_per_litre: 450.0,
        }
    }
}

/// Convert a pulse count over `period_ms` into mL/min.
///
/// A zero-length interval reports zero flow.
pub fn pulses_to_ml_per_min(pulses: u32, period_ms: u32, cal: &FlowCalibration) -> f32 {
    if period_ms == 0 {
        return 0.0;
    }
    let pulses_per_min = pulses as f32 * 60_000.0 / period_ms as f32;
    // pulses_per_min / pulses_per_litre = litres/min, × 1000 = mL/min
    pulses_per_min / cal.pulses_per_litre * 1000.0
}

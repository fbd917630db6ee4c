//! pH probe channel.
//!
//! Glass electrode behind a ×3 amplifier biased at mid-rail, so neutral
//! water reads half of the ADC reference and each pH unit moves the output
//! by 3 × 59.16 mV (Nernst slope at 25 °C).

use serde::{Deserialize, Serialize};

use super::adc_to_mv;
use crate::error::SensorError;

const PH_MIN: f32 = 0.0;
const PH_MAX: f32 = 14.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhCalibration {
    /// ADC full-scale voltage.
    pub vref_mv: f32,
    /// Amplifier output at pH 7.
    pub neutral_mv: f32,
    /// Output change per pH unit.
    pub slope_mv_per_ph: f32,
}

impl Default for PhCalibration {
    fn default() -> Self {
        Self {
            vref_mv: 3300.0,
            neutral_mv: 1650.0,
            slope_mv_per_ph: 177.48,
        }
    }
}

/// Convert a raw 12-bit ADC sample into pH, clamped to 0..=14.
pub fn raw_to_ph(raw: u32, cal: &PhCalibration) -> Result<f32, SensorError> {
    let mv = adc_to_mv(raw, cal.vref_mv)?;
    let ph = 7.0 + (cal.neutral_mv - mv) / cal.slope_mv_per_ph;
    Ok(ph.clamp(PH_MIN, PH_MAX))
}

//! Conductivity-probe salinity channel.
//!
//! The probe front-end outputs a voltage roughly proportional to
//! conductivity; a two-parameter linear map turns it into parts per
//! thousand.

use serde::{Deserialize, Serialize};

use super::adc_to_mv;
use crate::error::SensorError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalinityCalibration {
    /// ADC full-scale voltage.
    pub vref_mv: f32,
    /// Probe output in fresh water.
    pub zero_mv: f32,
    /// Slope of the linear map.
    pub ppt_per_mv: f32,
}

impl Default for SalinityCalibration {
    fn default() -> Self {
        Self {
            vref_mv: 3300.0,
            zero_mv: 400.0,
            ppt_per_mv: 0.025,
        }
    }
}

/// Convert a raw 12-bit ADC sample into salinity (ppt), clamped at zero.
pub fn raw_to_ppt(raw: u32, cal: &SalinityCalibration) -> Result<f32, SensorError> {
    let mv = adc_to_mv(raw, cal.vref_mv)?;
    Ok(((mv - cal.zero_mv) * cal.ppt_per_mv).max(0.0))
}

//! Sensor subsystem: channel selection, gathering, and conversion.
//!
//! ```text
//!  SamplingMask ──▶ gather() ──▶ RawReadings ──▶ transform() ──▶ Readings
//!                    │                              │
//!               SensorPort::acquire            flow / salinity / ph
//!               (one call per enabled bit)     (pure conversions)
//! ```
//!
//! Both buffers are fixed-capacity (one slot per channel) and live only
//! for the duration of a single cycle.

pub mod flow;
pub mod ph;
pub mod salinity;

use heapless::Vec;
use serde::Serialize;

use crate::app::ports::SensorPort;
use crate::config::BridgeConfig;
use crate::error::{Error, SensorError};

/// Full-scale value of the 12-bit ADC.
pub const ADC_MAX: u32 = 4095;

/// Number of logical sensor channels.
pub const CHANNEL_COUNT: usize = 3;

// ---------------------------------------------------------------------------
// Channels and mask
// ---------------------------------------------------------------------------

/// A logical sensor channel.  The discriminant is its bit in the
/// [`SamplingMask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Channel {
    #[serde(rename = "FLOW_RATE")]
    FlowRate = 0b0000_0001,
    #[serde(rename = "SALINITY")]
    Salinity = 0b0000_0010,
    #[serde(rename = "PH")]
    Ph = 0b0000_0100,
}

impl Channel {
    /// Every channel in ascending bit order (the gather order).
    pub const ALL: [Self; CHANNEL_COUNT] = [Self::FlowRate, Self::Salinity, Self::Ph];

    pub const fn bit(self) -> u8 {
        self as u8
    }

    /// Lower-case sensor name used in the manifest.
    pub const fn name(self) -> &'static str {
        match self {
            Self::FlowRate => "flow_rate",
            Self::Salinity => "salinity",
            Self::Ph => "ph",
        }
    }

    /// Engineering unit of the transformed value.
    pub const fn unit(self) -> &'static str {
        match self {
            Self::FlowRate => "mL/min",
            Self::Salinity => "ppt",
            Self::Ph => "pH",
        }
    }
}

/// Bit field of enabled channels.  Only the low three bits are defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingMask(u8);

impl SamplingMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0b0000_0111);

    /// Build a mask, rejecting bits outside the defined channel set.
    pub fn new(bits: u8) -> Result<Self, Error> {
        if bits & !Self::ALL.0 != 0 {
            return Err(Error::Config("sampling mask uses undefined bits"));
        }
        Ok(Self(bits))
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, channel: Channel) -> bool {
        self.0 & channel.bit() != 0
    }

    /// Enabled channels in ascending bit order.
    pub fn channels(self) -> impl Iterator<Item = Channel> {
        Channel::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

// ---------------------------------------------------------------------------
// Per-cycle readings
// ---------------------------------------------------------------------------

/// One acquisition result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawReading {
    pub channel: Channel,
    pub sample: Result<u32, SensorError>,
}

/// One converted value; `Err` marks the channel invalid for this cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformedReading {
    pub channel: Channel,
    pub value: Result<f32, SensorError>,
}

impl TransformedReading {
    pub fn is_valid(&self) -> bool {
        self.value.is_ok()
    }
}

pub type RawReadings = Vec<RawReading, CHANNEL_COUNT>;
pub type Readings = Vec<TransformedReading, CHANNEL_COUNT>;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Acquire every enabled channel once, in ascending bit order.
///
/// Disabled channels are skipped entirely: no port call, no entry.
pub fn gather(mask: SamplingMask, sensors: &mut impl SensorPort) -> RawReadings {
    let mut raw = RawReadings::new();
    for channel in mask.channels() {
        let sample = sensors.acquire(channel);
        // Capacity equals the channel count, one entry per channel.
        let _ = raw.push(RawReading { channel, sample });
    }
    raw
}

/// Map raw readings to engineering units.
///
/// Pure: the output depends only on `raw`, the calibration in `config`,
/// and `period_ms`, the span the flow pulse count was accumulated over.
pub fn transform(raw: &[RawReading], config: &BridgeConfig, period_ms: u32) -> Readings {
    let mut out = Readings::new();
    for reading in raw {
        let value = reading.sample.and_then(|sample| match reading.channel {
            Channel::FlowRate => Ok(flow::pulses_to_ml_per_min(sample, period_ms, &config.flow)),
            Channel::Salinity => salinity::raw_to_ppt(sample, &config.salinity),
            Channel::Ph => ph::raw_to_ph(sample, &config.ph),
        });
        let _ = out.push(TransformedReading {
            channel: reading.channel,
            value,
        });
    }
    out
}

/// Convert a 12-bit ADC sample to millivolts.
pub(crate) fn adc_to_mv(raw: u32, vref_mv: f32) -> Result<f32, SensorError> {
    if raw > ADC_MAX {
        return Err(SensorError::OutOfRange);
    }
    Ok(raw as f32 * vref_mv / ADC_MAX as f32)
}

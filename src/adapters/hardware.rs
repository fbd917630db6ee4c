//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Combines the sensor inputs, the sampling timer and the listener link
//! behind the port traits the controller drives.  It is the only module
//! in the system that reads actual sensors; on non-espidf targets the
//! sensor reads report [`SensorError::Absent`].

use crate::app::ports::{CommandChannel, OutputChannel, SensorPort, TickTimer};
use crate::error::{CommsError, SensorError, TimerError};
use crate::sensors::Channel;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init::adc1_read;
#[cfg(target_os = "espidf")]
use crate::pins;
#[cfg(target_os = "espidf")]
use crate::sensors::flow::take_pulse_count;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<L, T> {
    link: L,
    timer: T,
}

impl<L, T> HardwareAdapter<L, T> {
    pub fn new(link: L, timer: T) -> Self {
        Self { link, timer }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<L, T> SensorPort for HardwareAdapter<L, T> {
    #[cfg(target_os = "espidf")]
    fn acquire(&mut self, channel: Channel) -> Result<u32, SensorError> {
        match channel {
            Channel::FlowRate => Ok(take_pulse_count()),
            Channel::Salinity => adc1_read(pins::SALINITY_ADC_CHANNEL),
            Channel::Ph => adc1_read(pins::PH_ADC_CHANNEL),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn acquire(&mut self, _channel: Channel) -> Result<u32, SensorError> {
        Err(SensorError::Absent)
    }
}

// ── TickTimer implementation ──────────────────────────────────

impl<L, T: TickTimer> TickTimer for HardwareAdapter<L, T> {
    fn configure(&mut self, compare: u32) -> Result<(), TimerError> {
        self.timer.configure(compare)
    }

    fn start(&mut self) -> Result<(), TimerError> {
        self.timer.start()
    }

    fn stop(&mut self) -> Result<(), TimerError> {
        self.timer.stop()
    }

    fn reset(&mut self) -> Result<(), TimerError> {
        self.timer.reset()
    }

    fn clear_pending_interrupt(&mut self) {
        self.timer.clear_pending_interrupt();
    }
}

// ── Serial link implementations ───────────────────────────────

impl<L: CommandChannel, T> CommandChannel for HardwareAdapter<L, T> {
    fn has_byte(&mut self) -> bool {
        self.link.has_byte()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.link.read_byte()
    }
}

impl<L: OutputChannel, T> OutputChannel for HardwareAdapter<L, T> {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), CommsError> {
        self.link.write_frame(frame)
    }
}

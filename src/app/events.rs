//! Outbound application events.
//!
//! The [`BridgeService`](super::service::BridgeService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  Each event carries a
//! fixed severity so every sink agrees on what is a warning and what is an
//! operational error.

use log::Level;

use super::commands::Command;
use crate::error::{CommsError, SensorError, TimerError};
use crate::sensors::Channel;

/// Structured events emitted by the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BridgeEvent {
    /// INITIAL completed; carries the active sampling mask.
    Started { mask: u8 },

    /// A recognised command byte was consumed.
    CommandReceived(Command),

    /// An unrecognised byte was consumed and dropped.
    UnknownByte(u8),

    /// START arrived while notifications were held back.
    Resumed,

    /// A channel could not be acquired this cycle.
    AcquisitionFailed { channel: Channel, error: SensorError },

    /// A sample was acquired but its conversion refused it.
    ReadingRejected {
        channel: Channel,
        sample: u32,
        error: SensorError,
    },

    /// A frame could not be written to the listener.
    NotifyFailed(CommsError),

    /// A tick arrived before the previous cycle finished; `missed` counts
    /// the intervals that were dropped.
    TickOverrun { missed: u32 },

    /// The sampling timer rejected an operation.
    TimerFault(TimerError),

    /// RESTART is stopping the timer and clearing all counters.
    Restarting,
}

impl BridgeEvent {
    /// Severity used by log-backed sinks.
    pub const fn level(&self) -> Level {
        match self {
            Self::TickOverrun { .. } | Self::TimerFault(_) => Level::Error,
            Self::AcquisitionFailed { .. }
            | Self::ReadingRejected { .. }
            | Self::NotifyFailed(_) => Level::Warn,
            Self::UnknownByte(_) => Level::Debug,
            Self::Started { .. } | Self::CommandReceived(_) | Self::Resumed | Self::Restarting => {
                Level::Info
            }
        }
    }
}

//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BridgeService (domain)
//! ```
//!
//! Driven adapters (ADC channels, sampling timer, UART, log sink) implement
//! these traits.  The [`BridgeService`](super::service::BridgeService)
//! consumes them via generics, so the domain core never touches hardware
//! directly and every cycle can be driven from host tests.

use crate::error::{CommsError, SensorError, TimerError};
use crate::sensors::Channel;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Acquisition collaborator: returns the raw sample for one channel.
pub trait SensorPort {
    /// Read one raw sample.  Implementations must not block beyond the
    /// channel's own conversion time.
    fn acquire(&mut self, channel: Channel) -> Result<u32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Timer port (driven adapter: domain → sampling timer)
// ───────────────────────────────────────────────────────────────

/// The periodic sampling timer.
///
/// The interrupt side is not part of this trait: the hardware callback
/// only ever touches the [`TickFlag`](crate::events::TickFlag).
pub trait TickTimer {
    /// Apply the fixed 1024 divider and the alarm value; does not start.
    fn configure(&mut self, compare: u32) -> Result<(), TimerError>;

    /// Start counting from the current value.  Idempotent.
    fn start(&mut self) -> Result<(), TimerError>;

    /// Stop counting, keeping the counter value.
    fn stop(&mut self) -> Result<(), TimerError>;

    /// Zero the counter.  Fails with [`TimerError::Running`] unless stopped.
    fn reset(&mut self) -> Result<(), TimerError>;

    /// Drop any latched but unserviced alarm.
    fn clear_pending_interrupt(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Command channel (driven adapter: listener → domain)
// ───────────────────────────────────────────────────────────────

/// Receive half of the serial link.
pub trait CommandChannel {
    /// Whether at least one byte can be read right now.  Never blocks.
    fn has_byte(&mut self) -> bool;

    /// Next byte, or `None` when nothing is available.
    fn read_byte(&mut self) -> Option<u8>;
}

// ───────────────────────────────────────────────────────────────
// Output channel (driven adapter: domain → listener)
// ───────────────────────────────────────────────────────────────

/// Transmit half of the serial link.
pub trait OutputChannel {
    /// Write one complete frame.  A partial write is an error.
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), CommsError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain reports conditions as structured
/// [`BridgeEvent`](super::events::BridgeEvent)s through this port.
/// Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::BridgeEvent);
}

/// Everything the controller drives during a cycle.
pub trait BridgeHardware: SensorPort + TickTimer + CommandChannel + OutputChannel {}

impl<T: SensorPort + TickTimer + CommandChannel + OutputChannel> BridgeHardware for T {}

//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` holds everything a cycle produces or consumes: the
//! configuration, the tick flag shared with the interrupt, the message
//! check counter, and the per-cycle reading buffers.  Handlers receive it
//! by exclusive reference; nothing in here is global.

use crate::config::BridgeConfig;
use crate::events::TickFlag;
use crate::sensors::{RawReadings, Readings, SamplingMask};

use super::StateId;

/// Observable controller state: where the machine is and how many command
/// polls the current cycle has used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleState {
    pub state: StateId,
    pub message_checks: u8,
}

/// The shared context passed to every state handler function.
pub struct FsmContext<'a> {
    // -- Configuration --
    pub config: BridgeConfig,
    /// Validated copy of `config.sampling_mask`.
    pub mask: SamplingMask,

    // -- Interrupt handshake --
    /// PendingTick, set by the timer interrupt.
    pub tick: &'a TickFlag,
    /// Missed-tick count already reported by CLEAR_STATE for the tick that
    /// is still pending.
    pub missed_reported: Option<u32>,

    // -- Cycle state --
    /// Command polls performed in the current cycle.
    pub message_checks: u8,
    /// Sampling intervals elapsed since the last INITIAL, including any
    /// that stacked up while a tick was pending.
    pub cycle_index: u64,
    /// Intervals the current cycle covers (1 unless ticks stacked up).
    pub cycle_intervals: u32,
    /// DATA notifications held back until the listener sends START.
    pub paused: bool,

    // -- Per-cycle buffers --
    pub raw: RawReadings,
    pub readings: Readings,

    // -- Counters (reset by RESTART) --
    /// Overrun intervals reported since the last INITIAL.
    pub overruns: u32,
    /// DATA frames written since the last INITIAL.
    pub notifications: u32,
}

impl<'a> FsmContext<'a> {
    pub fn new(config: BridgeConfig, mask: SamplingMask, tick: &'a TickFlag) -> Self {
        Self {
            config,
            mask,
            tick,
            missed_reported: None,
            message_checks: 0,
            cycle_index: 0,
            cycle_intervals: 0,
            paused: false,
            raw: RawReadings::new(),
            readings: Readings::new(),
            overruns: 0,
            notifications: 0,
        }
    }

    /// Drop per-cycle data: both reading buffers and the poll counter.
    pub fn clear_cycle(&mut self) {
        self.raw.clear();
        self.readings.clear();
        self.message_checks = 0;
        self.cycle_intervals = 0;
    }

    /// Timestamp of the current cycle, in milliseconds since INITIAL.
    pub fn time_ms(&self) -> u64 {
        self.config.elapsed_ms(self.cycle_index)
    }

    /// Span of the current cycle in milliseconds.
    pub fn period_ms(&self) -> u32 {
        let start = self.cycle_index.saturating_sub(u64::from(self.cycle_intervals));
        (self.time_ms() - self.config.elapsed_ms(start)) as u32
    }

    /// Return every counter to its boot value.
    pub fn reset(&mut self) {
        self.clear_cycle();
        self.missed_reported = None;
        self.cycle_index = 0;
        self.overruns = 0;
        self.notifications = 0;
        self.paused = self.config.await_start_command;
    }
}

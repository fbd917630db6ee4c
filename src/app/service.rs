//! Application service: the hexagonal core.
//!
//! [`BridgeService`] owns the FSM and its shared context.  It exposes a
//! hardware-agnostic API; all I/O flows through port traits injected at
//! call sites, so whole cycles run in host tests against mock adapters.
//!
//! ```text
//!  SensorPort ─────▶ ┌──────────────────────────┐ ──▶ OutputChannel
//!  CommandChannel ─▶ │      BridgeService       │ ──▶ EventSink
//!  TickFlag ───────▶ │  FSM · gather · notify   │ ──▶ TickTimer
//!                    └──────────────────────────┘
//! ```

use log::info;

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::events::TickFlag;
use crate::fsm::context::{CycleState, FsmContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};

use super::ports::{BridgeHardware, EventSink};

// ───────────────────────────────────────────────────────────────
// BridgeService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates the acquisition cycle.
pub struct BridgeService<'a, H> {
    fsm: Fsm<H>,
    ctx: FsmContext<'a>,
}

impl<'a, H: BridgeHardware> BridgeService<'a, H> {
    /// Construct the service from a validated configuration.
    ///
    /// Does **not** start the FSM: call [`start`](Self::start) next.
    pub fn new(config: BridgeConfig, tick: &'a TickFlag) -> Result<Self> {
        config.validate()?;
        let mask = config.mask()?;
        let ctx = FsmContext::new(config, mask, tick);
        let fsm = Fsm::new(build_state_table(), StateId::Initial);
        Ok(Self { fsm, ctx })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter INITIAL.  The timer is configured on the first step.
    pub fn start(&mut self) {
        self.fsm.start(&mut self.ctx);
        info!(
            "BridgeService started in {:?} (mask 0b{:03b})",
            self.fsm.current_state(),
            self.ctx.mask.bits()
        );
    }

    // ── Per-step orchestration ────────────────────────────────

    /// Run the current state's action once.  Returns `false` when the
    /// machine stayed put (DATA_GATHERING with no tick pending).
    pub fn step(&mut self, hw: &mut H, sink: &mut impl EventSink) -> bool {
        self.fsm.step(&mut self.ctx, hw, sink)
    }

    /// Step until the machine is back in DATA_GATHERING or has nothing
    /// to do.  One call completes at most one cycle.  Returns the number
    /// of transitions taken; zero means it is still waiting for a tick.
    pub fn poll(&mut self, hw: &mut H, sink: &mut impl EventSink) -> usize {
        let mut transitions = 0;
        while self.step(hw, sink) {
            transitions += 1;
            if self.fsm.current_state() == StateId::DataGathering {
                break;
            }
        }
        transitions
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn cycle_state(&self) -> CycleState {
        CycleState {
            state: self.fsm.current_state(),
            message_checks: self.ctx.message_checks,
        }
    }

    /// Sampling intervals elapsed since the last INITIAL.
    pub fn cycle_index(&self) -> u64 {
        self.ctx.cycle_index
    }

    /// Overrun intervals reported since the last INITIAL.
    pub fn overruns(&self) -> u32 {
        self.ctx.overruns
    }

    /// DATA frames written since the last INITIAL.
    pub fn notifications(&self) -> u32 {
        self.ctx.notifications
    }

    pub fn is_paused(&self) -> bool {
        self.ctx.paused
    }
}

//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no heap.
//! Update handlers are generic over the hardware so the same table runs
//! against the ESP32 peripherals and the host bench doubles.
//!
//! ```text
//!  INITIAL ──▶ DATA_GATHERING ──[tick]──▶ DATA_TRANSFORM ──▶ NOTIFY_LISTENER
//!     ▲             ▲   │                                          │
//!     │             │   └─[no tick: stay]                          ▼
//!     │        CLEAR_STATE ◀──────[no RESTART]──────────── CHECK_MESSAGES
//!     │                                                            │
//!     └──────────────── RESTART ◀────────────[RESTART byte]────────┘
//! ```

use log::{debug, info};

use super::context::FsmContext;
use super::{StateDescriptor, StateId};
use crate::app::commands::Command;
use crate::app::events::BridgeEvent;
use crate::app::ports::{BridgeHardware, EventSink};
use crate::notify;
use crate::sensors;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table<H: BridgeHardware>() -> [StateDescriptor<H>; StateId::COUNT] {
    [
        // Index 0: Initial
        StateDescriptor {
            id: StateId::Initial,
            name: "INITIAL",
            on_enter: Some(initial_enter),
            on_exit: None,
            on_update: initial_update::<H>,
        },
        // Index 1: DataTransform
        StateDescriptor {
            id: StateId::DataTransform,
            name: "DATA_TRANSFORM",
            on_enter: None,
            on_exit: None,
            on_update: data_transform_update::<H>,
        },
        // Index 2: NotifyListener
        StateDescriptor {
            id: StateId::NotifyListener,
            name: "NOTIFY_LISTENER",
            on_enter: None,
            on_exit: None,
            on_update: notify_listener_update::<H>,
        },
        // Index 3: DataGathering
        StateDescriptor {
            id: StateId::DataGathering,
            name: "DATA_GATHERING",
            on_enter: None,
            on_exit: None,
            on_update: data_gathering_update::<H>,
        },
        // Index 4: ClearState
        StateDescriptor {
            id: StateId::ClearState,
            name: "CLEAR_STATE",
            on_enter: None,
            on_exit: None,
            on_update: clear_state_update::<H>,
        },
        // Index 5: CheckMessages
        StateDescriptor {
            id: StateId::CheckMessages,
            name: "CHECK_MESSAGES",
            on_enter: None,
            on_exit: None,
            on_update: check_messages_update::<H>,
        },
        // Index 6: Restart
        StateDescriptor {
            id: StateId::Restart,
            name: "RESTART",
            on_enter: None,
            on_exit: None,
            on_update: restart_update::<H>,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  INITIAL state
// ═══════════════════════════════════════════════════════════════════════════

fn initial_enter(ctx: &mut FsmContext) {
    ctx.reset();
}

fn initial_update<H: BridgeHardware>(
    ctx: &mut FsmContext,
    hw: &mut H,
    sink: &mut dyn EventSink,
) -> Option<StateId> {
    if let Err(e) = hw.configure(ctx.config.timer_compare) {
        sink.emit(&BridgeEvent::TimerFault(e));
    }
    if let Err(e) = hw.start() {
        sink.emit(&BridgeEvent::TimerFault(e));
    }
    if let Err(e) = notify::emit_manifest(hw, ctx.mask) {
        sink.emit(&BridgeEvent::NotifyFailed(e));
    }

    info!(
        "INITIAL: sampling every {} ms, mask {:#05b}",
        ctx.config.sample_interval_ms(),
        ctx.mask.bits()
    );
    sink.emit(&BridgeEvent::Started {
        mask: ctx.mask.bits(),
    });
    Some(StateId::DataGathering)
}

// ═══════════════════════════════════════════════════════════════════════════
//  DATA_GATHERING state
// ═══════════════════════════════════════════════════════════════════════════

fn data_gathering_update<H: BridgeHardware>(
    ctx: &mut FsmContext,
    hw: &mut H,
    sink: &mut dyn EventSink,
) -> Option<StateId> {
    let tick = ctx.tick.take()?;

    // Ticks already reported by CLEAR_STATE are not reported again.
    let unreported = match ctx.missed_reported.take() {
        Some(seen) => tick.missed.saturating_sub(seen),
        None => tick.missed,
    };
    if unreported > 0 {
        ctx.overruns = ctx.overruns.saturating_add(unreported);
        sink.emit(&BridgeEvent::TickOverrun { missed: unreported });
    }

    // Stacked intervals are folded into this cycle so TIME and the flow
    // span still cover them.
    ctx.cycle_intervals = tick.missed.saturating_add(1);
    ctx.cycle_index += u64::from(ctx.cycle_intervals);
    ctx.raw = sensors::gather(ctx.mask, hw);
    for reading in &ctx.raw {
        if let Err(error) = reading.sample {
            sink.emit(&BridgeEvent::AcquisitionFailed {
                channel: reading.channel,
                error,
            });
        }
    }
    Some(StateId::DataTransform)
}

// ═══════════════════════════════════════════════════════════════════════════
//  DATA_TRANSFORM state
// ═══════════════════════════════════════════════════════════════════════════

fn data_transform_update<H: BridgeHardware>(
    ctx: &mut FsmContext,
    _hw: &mut H,
    sink: &mut dyn EventSink,
) -> Option<StateId> {
    ctx.readings = sensors::transform(&ctx.raw, &ctx.config, ctx.period_ms());

    // Acquisition failures were reported while gathering; only samples the
    // conversion refused are new here.
    for (raw, reading) in ctx.raw.iter().zip(&ctx.readings) {
        if let (Ok(sample), Err(error)) = (raw.sample, reading.value) {
            sink.emit(&BridgeEvent::ReadingRejected {
                channel: reading.channel,
                sample,
                error,
            });
        }
    }
    Some(StateId::NotifyListener)
}

// ═══════════════════════════════════════════════════════════════════════════
//  NOTIFY_LISTENER state
// ═══════════════════════════════════════════════════════════════════════════

fn notify_listener_update<H: BridgeHardware>(
    ctx: &mut FsmContext,
    hw: &mut H,
    sink: &mut dyn EventSink,
) -> Option<StateId> {
    if ctx.paused {
        debug!("NOTIFY_LISTENER: holding cycle {} until START", ctx.cycle_index);
        return Some(StateId::CheckMessages);
    }

    match notify::emit(hw, ctx.time_ms(), ctx.period_ms(), &ctx.readings) {
        Ok(true) => ctx.notifications = ctx.notifications.saturating_add(1),
        Ok(false) => {}
        Err(e) => sink.emit(&BridgeEvent::NotifyFailed(e)),
    }
    Some(StateId::CheckMessages)
}

// ═══════════════════════════════════════════════════════════════════════════
//  CHECK_MESSAGES state
// ═══════════════════════════════════════════════════════════════════════════

fn check_messages_update<H: BridgeHardware>(
    ctx: &mut FsmContext,
    hw: &mut H,
    sink: &mut dyn EventSink,
) -> Option<StateId> {
    while ctx.message_checks < ctx.config.max_message_checks {
        if !hw.has_byte() {
            break;
        }
        let Some(byte) = hw.read_byte() else {
            break;
        };
        ctx.message_checks += 1;

        match Command::decode(byte) {
            Some(Command::Restart) => {
                sink.emit(&BridgeEvent::CommandReceived(Command::Restart));
                return Some(StateId::Restart);
            }
            Some(Command::Start) => {
                sink.emit(&BridgeEvent::CommandReceived(Command::Start));
                if ctx.paused {
                    ctx.paused = false;
                    sink.emit(&BridgeEvent::Resumed);
                }
            }
            None => sink.emit(&BridgeEvent::UnknownByte(byte)),
        }
    }
    Some(StateId::ClearState)
}

// ═══════════════════════════════════════════════════════════════════════════
//  CLEAR_STATE state
// ═══════════════════════════════════════════════════════════════════════════

fn clear_state_update<H: BridgeHardware>(
    ctx: &mut FsmContext,
    _hw: &mut H,
    sink: &mut dyn EventSink,
) -> Option<StateId> {
    ctx.clear_cycle();

    // A tick that is already waiting means this cycle outran its interval.
    // It is still gathered next, once; nothing is replayed.
    if let Some(tick) = ctx.tick.peek() {
        let missed = tick.missed.saturating_add(1);
        ctx.overruns = ctx.overruns.saturating_add(missed);
        ctx.missed_reported = Some(tick.missed);
        sink.emit(&BridgeEvent::TickOverrun { missed });
    }
    Some(StateId::DataGathering)
}

// ═══════════════════════════════════════════════════════════════════════════
//  RESTART state
// ═══════════════════════════════════════════════════════════════════════════

fn restart_update<H: BridgeHardware>(
    ctx: &mut FsmContext,
    hw: &mut H,
    sink: &mut dyn EventSink,
) -> Option<StateId> {
    sink.emit(&BridgeEvent::Restarting);

    if let Err(e) = hw.stop() {
        sink.emit(&BridgeEvent::TimerFault(e));
    }
    hw.clear_pending_interrupt();
    ctx.tick.clear();
    if let Err(e) = hw.reset() {
        sink.emit(&BridgeEvent::TimerFault(e));
    }
    Some(StateId::Initial)
}

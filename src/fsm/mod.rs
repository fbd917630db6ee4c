//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  StateTable                                                   │
//! │  ┌────────────────┬──────────┬─────────┬──────────────────────┐│
//! │  │ StateId        │ on_enter │ on_exit │ on_update            ││
//! │  ├────────────────┼──────────┼─────────┼──────────────────────┤│
//! │  │ Initial        │ fn(ctx)  │    -    │ fn(ctx,hw,sink)->Opt ││
//! │  │ DataTransform  │    -     │    -    │ fn(ctx,hw,sink)->Opt ││
//! │  │ NotifyListener │    -     │    -    │ fn(ctx,hw,sink)->Opt ││
//! │  │ DataGathering  │    -     │    -    │ fn(ctx,hw,sink)->Opt ││
//! │  │ ClearState     │    -     │    -    │ fn(ctx,hw,sink)->Opt ││
//! │  │ CheckMessages  │    -     │    -    │ fn(ctx,hw,sink)->Opt ││
//! │  │ Restart        │    -     │    -    │ fn(ctx,hw,sink)->Opt ││
//! │  └────────────────┴──────────┴─────────┴──────────────────────┘│
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each step the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current state, then `on_enter` for the next, and updates the
//! current pointer.  Update handlers receive the shared [`FsmContext`],
//! the hardware ports and the event sink; enter/exit actions only see
//! the context.

pub mod context;
pub mod states;

#[cfg(test)]
pub(crate) mod testing;

use context::FsmContext;
use log::{debug, info};

use crate::app::ports::EventSink;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all controller states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Initial = 1,
    DataTransform = 2,
    NotifyListener = 3,
    DataGathering = 4,
    ClearState = 5,
    CheckMessages = 6,
    Restart = 7,
}

impl StateId {
    /// Total number of states: used to size the table array.
    pub const COUNT: usize = 7;

    /// Position of this state in the table.
    pub const fn index(self) -> usize {
        self as usize - 1
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut FsmContext<'_>);

/// Signature for the per-step update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn<H> = fn(&mut FsmContext<'_>, &mut H, &mut dyn EventSink) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array: no heap, no `dyn` handlers.
pub struct StateDescriptor<H> {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn<H>,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table (array of [`StateDescriptor`]); the
/// [`FsmContext`] and the ports are lent to it on every call.
pub struct Fsm<H> {
    /// Fixed-size table indexed by [`StateId::index`].
    table: [StateDescriptor<H>; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
}

impl<H> Fsm<H> {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor<H>; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial.index(),
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `step()`.
    pub fn start(&mut self, ctx: &mut FsmContext<'_>) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one step.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    ///
    /// Returns `true` when a transition happened.
    pub fn step(&mut self, ctx: &mut FsmContext<'_>, hw: &mut H, sink: &mut dyn EventSink) -> bool {
        match (self.table[self.current].on_update)(ctx, hw, sink) {
            Some(next_id) => {
                self.transition(next_id, ctx);
                true
            }
            None => false,
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        self.table[self.current].id
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext<'_>) {
        let next_idx = next_id.index();

        debug!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        // Exit current state
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        // Enter new state
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

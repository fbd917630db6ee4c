//! Interrupt → main loop tick handshake.
//!
//! The sampling timer interrupt is the only producer; the controller is the
//! only consumer.  The slot holds at most one tick:
//!
//! ```text
//!  ┌────────────┐  on_interrupt()  ┌──────────────┐  take()   ┌────────────┐
//!  │ Timer ISR  │─────────────────▶│  TickFlag    │──────────▶│ Controller │
//!  │ (alarm)    │                  │pending/missed│           │ (main loop)│
//!  └────────────┘                  └──────────────┘           └────────────┘
//! ```
//!
//! An interrupt that finds the slot already occupied is counted as missed
//! instead of queued, so a slow cycle costs one sample and never a backlog.
//! Every access goes through `critical_section::with`, which masks
//! interrupts for the few instructions of the read-modify-write.

use core::cell::Cell;

use critical_section::Mutex;

#[derive(Debug, Clone, Copy)]
struct TickState {
    pending: bool,
    missed: u32,
}

impl TickState {
    const IDLE: Self = Self {
        pending: false,
        missed: 0,
    };
}

/// A tick taken by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Interrupts that fired while this tick was already pending.
    pub missed: u32,
}

/// Single-slot PendingTick flag shared with the timer interrupt.
pub struct TickFlag {
    state: Mutex<Cell<TickState>>,
}

impl Default for TickFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl TickFlag {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(TickState::IDLE)),
        }
    }

    /// Interrupt callback body.  Bounded: one masked read-modify-write.
    pub fn on_interrupt(&self) {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut s = cell.get();
            if s.pending {
                s.missed = s.missed.saturating_add(1);
            } else {
                s.pending = true;
            }
            cell.set(s);
        });
    }

    /// Read and clear the pending tick.
    pub fn take(&self) -> Option<Tick> {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let s = cell.get();
            if !s.pending {
                return None;
            }
            cell.set(TickState::IDLE);
            Some(Tick { missed: s.missed })
        })
    }

    /// Whether a tick is waiting, without consuming it.
    pub fn is_pending(&self) -> bool {
        critical_section::with(|cs| self.state.borrow(cs).get().pending)
    }

    /// The pending tick, left in place.
    pub fn peek(&self) -> Option<Tick> {
        critical_section::with(|cs| {
            let s = self.state.borrow(cs).get();
            s.pending.then_some(Tick { missed: s.missed })
        })
    }

    /// Discard any pending tick and missed count (used on RESTART).
    pub fn clear(&self) {
        critical_section::with(|cs| self.state.borrow(cs).set(TickState::IDLE));
    }
}

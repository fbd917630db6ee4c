//! Inbound commands from the listener.
//!
//! The protocol is one byte per command with no framing.  Bytes that do not
//! decode are reserved for future message types and are dropped without
//! error.

/// `!`: begin or resume normal cycling.
pub const START_CMD: u8 = 0x21;
/// `&`: return to INITIAL and reset the sampling timer.
pub const RESTART_CMD: u8 = 0x26;

/// Commands the listener can send to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Restart,
}

impl Command {
    /// Decode one command byte.  Unknown bytes yield `None`.
    pub const fn decode(byte: u8) -> Option<Self> {
        match byte {
            START_CMD => Some(Self::Start),
            RESTART_CMD => Some(Self::Restart),
            _ => None,
        }
    }

    pub const fn byte(self) -> u8 {
        match self {
            Self::Start => START_CMD,
            Self::Restart => RESTART_CMD,
        }
    }
}

//! Listener serial link over UART.
//!
//! The UART driver has no "byte available" query that leaves the byte in
//! the FIFO, so the link reads one byte ahead into a [`Lookahead`] slot:
//! `has_byte` fills the slot with a non-blocking read and `read_byte`
//! drains it first.

use crate::error::CommsError;

#[cfg(target_os = "espidf")]
use crate::app::ports::{CommandChannel, OutputChannel};
#[cfg(target_os = "espidf")]
use esp_idf_hal::delay::NON_BLOCK;
#[cfg(target_os = "espidf")]
use esp_idf_hal::uart::UartDriver;

/// One-byte read-ahead buffer in front of a non-blocking byte source.
#[derive(Debug, Default)]
pub struct Lookahead {
    slot: Option<u8>,
}

impl Lookahead {
    /// Whether a byte is available, pulling at most one from `poll`.
    pub fn has_byte(&mut self, poll: impl FnOnce() -> Option<u8>) -> bool {
        if self.slot.is_none() {
            self.slot = poll();
        }
        self.slot.is_some()
    }

    /// The buffered byte, or a fresh one from `poll`.
    pub fn read_byte(&mut self, poll: impl FnOnce() -> Option<u8>) -> Option<u8> {
        self.slot.take().or_else(poll)
    }
}

/// Write a whole frame through a writer that may accept it in pieces.
///
/// `write` returns how many bytes it took; zero means the transmit buffer
/// is full.
pub fn write_all<E>(
    frame: &[u8],
    mut write: impl FnMut(&[u8]) -> Result<usize, E>,
) -> Result<(), CommsError> {
    let mut rest = frame;
    while !rest.is_empty() {
        match write(rest) {
            Ok(0) => return Err(CommsError::ChannelFull),
            Ok(n) => rest = &rest[n.min(rest.len())..],
            Err(_) => return Err(CommsError::WriteFailed),
        }
    }
    Ok(())
}

// ── ESP32 UART ────────────────────────────────────────────────

/// UART connection to the listener.
#[cfg(target_os = "espidf")]
pub struct UartLink {
    uart: UartDriver<'static>,
    lookahead: Lookahead,
}

#[cfg(target_os = "espidf")]
impl UartLink {
    pub fn new(uart: UartDriver<'static>) -> Self {
        Self {
            uart,
            lookahead: Lookahead::default(),
        }
    }

    fn poll(uart: &UartDriver<'static>) -> Option<u8> {
        let mut buf = [0u8; 1];
        match uart.read(&mut buf, NON_BLOCK) {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }
}

#[cfg(target_os = "espidf")]
impl CommandChannel for UartLink {
    fn has_byte(&mut self) -> bool {
        let uart = &self.uart;
        self.lookahead.has_byte(|| Self::poll(uart))
    }

    fn read_byte(&mut self) -> Option<u8> {
        let uart = &self.uart;
        self.lookahead.read_byte(|| Self::poll(uart))
    }
}

#[cfg(target_os = "espidf")]
impl OutputChannel for UartLink {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), CommsError> {
        write_all(frame, |bytes| self.uart.write(bytes))
    }
}

//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every [`BridgeEvent`] to the
//! ESP-IDF logger (the console UART / USB-CDC, separate from the listener
//! link) at the severity the event carries.

use log::log;

use crate::app::events::BridgeEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`BridgeEvent`] to the console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &BridgeEvent) {
        let level = event.level();
        match event {
            BridgeEvent::Started { mask } => {
                log!(level, "START | mask=0b{:03b}", mask);
            }
            BridgeEvent::CommandReceived(cmd) => {
                log!(level, "CMD   | {:?} (0x{:02X})", cmd, cmd.byte());
            }
            BridgeEvent::UnknownByte(byte) => {
                log!(level, "CMD   | dropped unknown byte 0x{:02X}", byte);
            }
            BridgeEvent::Resumed => {
                log!(level, "CMD   | notifications resumed");
            }
            BridgeEvent::AcquisitionFailed { channel, error } => {
                log!(level, "SENSE | {} invalid this cycle: {}", channel.name(), error);
            }
            BridgeEvent::ReadingRejected {
                channel,
                sample,
                error,
            } => {
                log!(level, "SENSE | {} sample {} rejected: {}", channel.name(), sample, error);
            }
            BridgeEvent::NotifyFailed(e) => {
                log!(level, "LINK  | listener write failed: {}", e);
            }
            BridgeEvent::TickOverrun { missed } => {
                log!(level, "CYCLE | overran sampling interval ({} missed)", missed);
            }
            BridgeEvent::TimerFault(e) => {
                log!(level, "TIMER | {}", e);
            }
            BridgeEvent::Restarting => {
                log!(level, "CYCLE | restart requested, timer stopped and zeroed");
            }
        }
    }
}

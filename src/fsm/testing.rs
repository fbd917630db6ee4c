//! In-crate test doubles for the FSM and service unit tests.

use std::collections::VecDeque;

use log::Level;

use crate::app::events::BridgeEvent;
use crate::app::ports::{CommandChannel, EventSink, OutputChannel, SensorPort, TickTimer};
use crate::drivers::hw_timer::SimTimer;
use crate::error::{CommsError, SensorError, TimerError};
use crate::notify;
use crate::sensors::Channel;

/// Bench hardware: fixed samples, a scripted receive queue, a frame
/// capture and the simulated sampling timer.
pub struct BenchHw {
    pub timer: SimTimer,
    pub samples: [Result<u32, SensorError>; 3],
    pub acquired: Vec<Channel>,
    pub rx: VecDeque<u8>,
    pub read_count: usize,
    pub frames: Vec<Vec<u8>>,
    pub fail_writes: bool,
}

impl Default for BenchHw {
    fn default() -> Self {
        Self {
            timer: SimTimer::default(),
            samples: [Ok(15), Ok(2048), Ok(2048)],
            acquired: Vec::new(),
            rx: VecDeque::new(),
            read_count: 0,
            frames: Vec::new(),
            fail_writes: false,
        }
    }
}

impl BenchHw {
    /// Written frames carrying a DATA message.
    pub fn data_frames(&self) -> Vec<serde_json::Value> {
        self.frames
            .iter()
            .filter_map(|f| notify::parse_frame(f))
            .filter(|json| json.get("DATA").is_some())
            .collect()
    }
}

impl SensorPort for BenchHw {
    fn acquire(&mut self, channel: Channel) -> Result<u32, SensorError> {
        self.acquired.push(channel);
        let slot = Channel::ALL.iter().position(|c| *c == channel).unwrap_or(0);
        self.samples[slot]
    }
}

impl TickTimer for BenchHw {
    fn configure(&mut self, compare: u32) -> Result<(), TimerError> {
        self.timer.configure(compare)
    }
    fn start(&mut self) -> Result<(), TimerError> {
        self.timer.start()
    }
    fn stop(&mut self) -> Result<(), TimerError> {
        self.timer.stop()
    }
    fn reset(&mut self) -> Result<(), TimerError> {
        self.timer.reset()
    }
    fn clear_pending_interrupt(&mut self) {
        self.timer.clear_pending_interrupt();
    }
}

impl CommandChannel for BenchHw {
    fn has_byte(&mut self) -> bool {
        !self.rx.is_empty()
    }
    fn read_byte(&mut self) -> Option<u8> {
        let byte = self.rx.pop_front()?;
        self.read_count += 1;
        Some(byte)
    }
}

impl OutputChannel for BenchHw {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), CommsError> {
        if self.fail_writes {
            return Err(CommsError::WriteFailed);
        }
        self.frames.push(frame.to_vec());
        Ok(())
    }
}

/// Event sink that keeps everything it is given.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<BridgeEvent>,
}

impl RecordingSink {
    pub fn count(&self, level: Level) -> usize {
        self.events.iter().filter(|e| e.level() == level).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &BridgeEvent) {
        self.events.push(*event);
    }
}

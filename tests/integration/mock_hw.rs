//! Mock hardware adapter for integration tests.
//!
//! Scripted sensor samples, a receive queue the tests fill with listener
//! bytes, a capture of every written frame, and the crate's [`SimTimer`]
//! register model standing in for the GPTimer.

use std::collections::VecDeque;

use log::Level;
use sensorbridge::app::events::BridgeEvent;
use sensorbridge::app::ports::{CommandChannel, EventSink, OutputChannel, SensorPort, TickTimer};
use sensorbridge::drivers::hw_timer::SimTimer;
use sensorbridge::error::{CommsError, SensorError, TimerError};
use sensorbridge::events::TickFlag;
use sensorbridge::notify;
use sensorbridge::sensors::Channel;

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub timer: SimTimer,
    pub flow: Result<u32, SensorError>,
    pub salinity: Result<u32, SensorError>,
    pub ph: Result<u32, SensorError>,
    /// Every `acquire` call, in order.
    pub acquired: Vec<Channel>,
    pub rx: VecDeque<u8>,
    pub frames: Vec<Vec<u8>>,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            timer: SimTimer::default(),
            flow: Ok(15),
            salinity: Ok(2048),
            ph: Ok(2048),
            acquired: Vec::new(),
            rx: VecDeque::new(),
            frames: Vec::new(),
            fail_writes: false,
        }
    }

    /// Let one full sampling interval elapse and run the alarm ISR.
    pub fn elapse_interval(&mut self, tick: &TickFlag) {
        let compare = self.timer.compare().unwrap_or(0);
        self.timer.advance(compare);
        self.timer.service_interrupt(tick);
    }

    /// Queue bytes as if the listener had sent them.
    pub fn send(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Parsed JSON of every frame carrying `key`.
    pub fn messages(&self, key: &str) -> Vec<serde_json::Value> {
        self.frames
            .iter()
            .filter_map(|f| notify::parse_frame(f))
            .filter(|json| json.get(key).is_some())
            .collect()
    }

    pub fn data(&self) -> Vec<serde_json::Value> {
        self.messages("DATA")
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn acquire(&mut self, channel: Channel) -> Result<u32, SensorError> {
        self.acquired.push(channel);
        match channel {
            Channel::FlowRate => self.flow,
            Channel::Salinity => self.salinity,
            Channel::Ph => self.ph,
        }
    }
}

impl TickTimer for MockHardware {
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

impl CommandChannel for MockHardware {
    fn has_byte(&mut self) -> bool {
        !self.rx.is_empty()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }
}

impl OutputChannel for MockHardware {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), CommsError> {
        if self.fail_writes {
            return Err(CommsError::WriteFailed);
        }
        self.frames.push(frame.to_vec());
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

/// Records every event so tests can count them by severity.
#[derive(Default)]
pub struct LogSink {
    pub events: Vec<BridgeEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, level: Level) -> usize {
        self.events.iter().filter(|e| e.level() == level).count()
    }

    pub fn warnings(&self) -> usize {
        self.count(Level::Warn)
    }

    pub fn errors(&self) -> usize {
        self.count(Level::Error)
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &BridgeEvent) {
        self.events.push(*event);
    }
}

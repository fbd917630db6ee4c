//! Integration tests for the BridgeService → FSM → listener pipeline.
//!
//! These run on the host and drive whole sampling cycles through the mock
//! hardware: timer interrupts, sensor reads, DATA frames and the command
//! channel.

use crate::mock_hw::{LogSink, MockHardware};

use sensorbridge::app::commands::{RESTART_CMD, START_CMD};
use sensorbridge::app::events::BridgeEvent;
use sensorbridge::app::service::BridgeService;
use sensorbridge::config::BridgeConfig;
use sensorbridge::error::SensorError;
use sensorbridge::events::TickFlag;
use sensorbridge::fsm::StateId;
use sensorbridge::sensors::Channel;

fn boot(config: BridgeConfig, tick: &TickFlag) -> (BridgeService<'_, MockHardware>, MockHardware, LogSink) {
    let mut app = BridgeService::new(config, tick).unwrap();
    let mut hw = MockHardware::new();
    let mut sink = LogSink::new();
    app.start();
    assert_eq!(app.poll(&mut hw, &mut sink), 1);
    assert_eq!(app.state(), StateId::DataGathering);
    (app, hw, sink)
}

fn cycle(app: &mut BridgeService<'_, MockHardware>, hw: &mut MockHardware, sink: &mut LogSink, tick: &TickFlag) {
    hw.elapse_interval(tick);
    app.poll(hw, sink);
}

// ── Boot ─────────────────────────────────────────────────────

#[test]
fn boot_starts_timer_and_sends_manifest() {
    let tick = TickFlag::new();
    let (_app, hw, sink) = boot(BridgeConfig::default(), &tick);

    assert!(hw.timer.is_running());
    assert_eq!(hw.timer.compare(), Some(78_125));
    let manifest = hw.messages("SENSORS_MANIFEST");
    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest[0]["SENSORS_MANIFEST"].as_array().unwrap().len(), 3);
    assert_eq!(sink.events, [BridgeEvent::Started { mask: 0b111 }]);
}

#[test]
fn no_tick_means_no_acquisition() {
    let tick = TickFlag::new();
    let (mut app, mut hw, mut sink) = boot(BridgeConfig::default(), &tick);

    for _ in 0..10 {
        assert_eq!(app.poll(&mut hw, &mut sink), 0);
    }
    assert!(hw.acquired.is_empty());
    assert!(hw.data().is_empty());
}

// ── Acquisition and notification ─────────────────────────────

#[test]
fn cycle_reports_every_enabled_channel() {
    let tick = TickFlag::new();
    let (mut app, mut hw, mut sink) = boot(BridgeConfig::default(), &tick);

    cycle(&mut app, &mut hw, &mut sink, &tick);

    assert_eq!(hw.acquired, [Channel::FlowRate, Channel::Salinity, Channel::Ph]);
    let data = hw.data();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["TIME"], 1000);
    assert_eq!(data[0]["DATA"]["period"], 1000);
    let readings = data[0]["DATA"]["readings"].as_array().unwrap();
    assert_eq!(readings.len(), 3);
    assert!(readings.iter().all(|r| r["valid"] == true));
    let flow = readings[0]["value"].as_f64().unwrap();
    assert!((flow - 2000.0).abs() < 0.5, "15 pulses/s is 2 L/min, got {flow}");
    let ph = readings[2]["value"].as_f64().unwrap();
    assert!((ph - 7.0).abs() < 0.01);
    assert_eq!(sink.warnings(), 0);
}

#[test]
fn one_notification_per_cycle() {
    let tick = TickFlag::new();
    let (mut app, mut hw, mut sink) = boot(BridgeConfig::default(), &tick);

    for _ in 0..5 {
        cycle(&mut app, &mut hw, &mut sink, &tick);
    }

    let times: Vec<u64> = hw.data().iter().map(|d| d["TIME"].as_u64().unwrap()).collect();
    assert_eq!(times, [1000, 2000, 3000, 4000, 5000]);
    assert_eq!(app.cycle_index(), 5);
    assert_eq!(app.notifications(), 5);
}

#[test]
fn fractional_interval_time_does_not_drift() {
    let tick = TickFlag::new();
    let config = BridgeConfig {
        timer_compare: 19_531, // 249.99 ms
        ..BridgeConfig::default()
    };
    let (mut app, mut hw, mut sink) = boot(config, &tick);

    for _ in 0..4 {
        cycle(&mut app, &mut hw, &mut sink, &tick);
    }
    let times: Vec<u64> = hw.data().iter().map(|d| d["TIME"].as_u64().unwrap()).collect();
    assert_eq!(times, [249, 499, 749, 999]);
    let periods: Vec<u64> = hw
        .data()
        .iter()
        .map(|d| d["DATA"]["period"].as_u64().unwrap())
        .collect();
    assert_eq!(periods, [249, 250, 250, 250]);
}

#[test]
fn failed_salinity_is_reported_invalid_with_one_warning() {
    let tick = TickFlag::new();
    let (mut app, mut hw, mut sink) = boot(BridgeConfig::default(), &tick);
    hw.salinity = Err(SensorError::Timeout);

    cycle(&mut app, &mut hw, &mut sink, &tick);

    let data = hw.data();
    let readings = data[0]["DATA"]["readings"].as_array().unwrap();
    assert_eq!(readings.len(), 3);
    assert_eq!(readings[0]["type"], "FLOW_RATE");
    assert_eq!(readings[0]["valid"], true);
    assert_eq!(readings[1]["type"], "SALINITY");
    assert_eq!(readings[1]["valid"], false);
    assert!(readings[1]["value"].is_null());
    assert_eq!(readings[2]["type"], "PH");
    assert_eq!(readings[2]["valid"], true);

    assert_eq!(sink.warnings(), 1);
    assert!(sink.events.contains(&BridgeEvent::AcquisitionFailed {
        channel: Channel::Salinity,
        error: SensorError::Timeout,
    }));
    assert_eq!(app.state(), StateId::DataGathering, "cycle completes");
}

#[test]
fn out_of_range_salinity_sample_warns_once() {
    let tick = TickFlag::new();
    let (mut app, mut hw, mut sink) = boot(BridgeConfig::default(), &tick);
    hw.salinity = Ok(5000);

    cycle(&mut app, &mut hw, &mut sink, &tick);

    let data = hw.data();
    let readings = data[0]["DATA"]["readings"].as_array().unwrap();
    assert_eq!(readings[1]["type"], "SALINITY");
    assert_eq!(readings[1]["valid"], false);
    assert!(readings[1]["value"].is_null());
    assert_eq!(readings[0]["valid"], true);
    assert_eq!(readings[2]["valid"], true);

    assert_eq!(sink.warnings(), 1);
    assert!(sink.events.contains(&BridgeEvent::ReadingRejected {
        channel: Channel::Salinity,
        sample: 5000,
        error: SensorError::OutOfRange,
    }));
}

#[test]
fn masked_channel_is_never_acquired() {
    let tick = TickFlag::new();
    let config = BridgeConfig {
        sampling_mask: 0b101,
        ..BridgeConfig::default()
    };
    let (mut app, mut hw, mut sink) = boot(config, &tick);
    hw.salinity = Err(SensorError::Timeout);

    cycle(&mut app, &mut hw, &mut sink, &tick);

    assert_eq!(hw.acquired, [Channel::FlowRate, Channel::Ph]);
    let data = hw.data();
    let readings = data[0]["DATA"]["readings"].as_array().unwrap();
    assert_eq!(readings.len(), 2);
    assert!(readings.iter().all(|r| r["type"] != "SALINITY"));
    assert_eq!(sink.warnings(), 0);
}

#[test]
fn zero_mask_cycles_without_output() {
    let tick = TickFlag::new();
    let config = BridgeConfig {
        sampling_mask: 0,
        ..BridgeConfig::default()
    };
    let (mut app, mut hw, mut sink) = boot(config, &tick);

    cycle(&mut app, &mut hw, &mut sink, &tick);
    cycle(&mut app, &mut hw, &mut sink, &tick);

    assert!(hw.acquired.is_empty());
    assert!(hw.data().is_empty());
    assert_eq!(app.cycle_index(), 2);
    assert_eq!(app.state(), StateId::DataGathering);
    let manifest = hw.messages("SENSORS_MANIFEST");
    assert!(manifest[0]["SENSORS_MANIFEST"].as_array().unwrap().is_empty());
}

#[test]
fn notify_failure_warns_and_cycling_continues() {
    let tick = TickFlag::new();
    let (mut app, mut hw, mut sink) = boot(BridgeConfig::default(), &tick);

    hw.fail_writes = true;
    hw.send(&[START_CMD]);
    cycle(&mut app, &mut hw, &mut sink, &tick);
    assert_eq!(sink.warnings(), 1);
    assert!(hw.rx.is_empty(), "commands still checked after a failed write");
    assert_eq!(app.state(), StateId::DataGathering);

    hw.fail_writes = false;
    cycle(&mut app, &mut hw, &mut sink, &tick);
    let data = hw.data();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["TIME"], 2000);
}

// ── Command channel ──────────────────────────────────────────

#[test]
fn command_backlog_is_bounded_per_cycle() {
    let tick = TickFlag::new();
    let (mut app, mut hw, mut sink) = boot(BridgeConfig::default(), &tick);
    hw.send(&[b'x'; 25]);

    cycle(&mut app, &mut hw, &mut sink, &tick);
    assert_eq!(hw.rx.len(), 5, "20 consumed this cycle");

    cycle(&mut app, &mut hw, &mut sink, &tick);
    assert!(hw.rx.is_empty(), "remaining 5 consumed next cycle");
    assert_eq!(hw.data().len(), 2);
}

#[test]
fn start_while_cycling_changes_nothing() {
    let tick = TickFlag::new();
    let (mut app, mut hw, mut sink) = boot(BridgeConfig::default(), &tick);
    cycle(&mut app, &mut hw, &mut sink, &tick);
    let before = app.cycle_state();

    hw.send(&[START_CMD, START_CMD, START_CMD]);
    cycle(&mut app, &mut hw, &mut sink, &tick);

    assert_eq!(app.cycle_state(), before);
    assert_eq!(app.cycle_index(), 2);
    assert!(hw.timer.is_running());
    assert_eq!(hw.data().len(), 2);
    assert_eq!(hw.messages("SENSORS_MANIFEST").len(), 1);
}

#[test]
fn restart_stops_timer_and_reenters_initial() {
    let tick = TickFlag::new();
    let (mut app, mut hw, mut sink) = boot(BridgeConfig::default(), &tick);
    cycle(&mut app, &mut hw, &mut sink, &tick);
    cycle(&mut app, &mut hw, &mut sink, &tick);

    hw.timer.advance(1234);
    hw.send(&[RESTART_CMD, b'x']);
    hw.elapse_interval(&tick);
    while app.state() != StateId::Restart {
        app.step(&mut hw, &mut sink);
    }
    assert_eq!(hw.rx.len(), 1, "bytes after RESTART are left queued");

    app.step(&mut hw, &mut sink);
    assert_eq!(app.state(), StateId::Initial);
    assert!(!hw.timer.is_running());
    assert_eq!(hw.timer.counter(), 0);
    assert!(!tick.is_pending());
    assert_eq!(app.cycle_index(), 0);

    app.step(&mut hw, &mut sink);
    assert_eq!(app.state(), StateId::DataGathering);
    assert!(hw.timer.is_running());
    assert_eq!(hw.messages("SENSORS_MANIFEST").len(), 2);
    assert!(sink.events.contains(&BridgeEvent::Restarting));

    // Time restarts from the first interval.
    cycle(&mut app, &mut hw, &mut sink, &tick);
    let data = hw.data();
    assert_eq!(data.last().unwrap()["TIME"], 1000);
    assert!(hw.rx.is_empty());
}

#[test]
fn paused_bridge_streams_after_start() {
    let tick = TickFlag::new();
    let config = BridgeConfig {
        await_start_command: true,
        ..BridgeConfig::default()
    };
    let (mut app, mut hw, mut sink) = boot(config, &tick);

    cycle(&mut app, &mut hw, &mut sink, &tick);
    cycle(&mut app, &mut hw, &mut sink, &tick);
    assert!(app.is_paused());
    assert!(hw.data().is_empty());
    assert_eq!(hw.acquired.len(), 6, "sampling continues while paused");

    hw.send(&[START_CMD]);
    cycle(&mut app, &mut hw, &mut sink, &tick);
    assert!(!app.is_paused());
    assert!(sink.events.contains(&BridgeEvent::Resumed));

    cycle(&mut app, &mut hw, &mut sink, &tick);
    let data = hw.data();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["TIME"], 4000);
}

#[test]
fn restart_pauses_again_when_awaiting_start() {
    let tick = TickFlag::new();
    let config = BridgeConfig {
        await_start_command: true,
        ..BridgeConfig::default()
    };
    let (mut app, mut hw, mut sink) = boot(config, &tick);
    hw.send(&[START_CMD]);
    cycle(&mut app, &mut hw, &mut sink, &tick);
    assert!(!app.is_paused());

    hw.send(&[RESTART_CMD]);
    cycle(&mut app, &mut hw, &mut sink, &tick);
    assert_eq!(app.state(), StateId::DataGathering);
    assert!(app.is_paused());
}

// ── Overruns ─────────────────────────────────────────────────

#[test]
fn overrun_logs_one_error_and_is_not_replayed() {
    let tick = TickFlag::new();
    let (mut app, mut hw, mut sink) = boot(BridgeConfig::default(), &tick);

    hw.elapse_interval(&tick);
    app.step(&mut hw, &mut sink); // gather
    hw.elapse_interval(&tick); // next tick lands mid-cycle
    app.poll(&mut hw, &mut sink);

    assert_eq!(sink.errors(), 1);
    assert_eq!(app.cycle_index(), 1);
    assert_eq!(hw.acquired.len(), 3);

    // The waiting tick drives exactly one more cycle.
    app.poll(&mut hw, &mut sink);
    assert_eq!(app.cycle_index(), 2);
    assert_eq!(hw.acquired.len(), 6);
    assert_eq!(app.poll(&mut hw, &mut sink), 0);
    assert_eq!(sink.errors(), 1);
    assert_eq!(app.overruns(), 1);
}

#[test]
fn ticks_stacked_before_gather_collapse_into_one() {
    let tick = TickFlag::new();
    let (mut app, mut hw, mut sink) = boot(BridgeConfig::default(), &tick);

    hw.elapse_interval(&tick);
    hw.elapse_interval(&tick);
    hw.elapse_interval(&tick);
    app.poll(&mut hw, &mut sink);

    assert!(sink.events.contains(&BridgeEvent::TickOverrun { missed: 2 }));
    assert_eq!(sink.errors(), 1);
    assert_eq!(hw.acquired.len(), 3, "one gather for all three intervals");
    assert_eq!(app.cycle_index(), 3);
    assert_eq!(app.poll(&mut hw, &mut sink), 0);

    // The timeline keeps the dropped intervals visible to the listener.
    let data = hw.data();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["TIME"], 3000);
    assert_eq!(data[0]["DATA"]["period"], 3000);

    cycle(&mut app, &mut hw, &mut sink, &tick);
    let data = hw.data();
    assert_eq!(data[1]["TIME"], 4000);
    assert_eq!(data[1]["DATA"]["period"], 1000);
}

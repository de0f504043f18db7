//! Integration tests for the AnalyzerService → ports pipeline.
//!
//! These run on the host (x86_64) and drive full loop iterations against
//! recording mocks: sensors are fakes whose values the test sets, link
//! events go through a local queue exactly as the BLE callbacks would.

use std::cell::Cell;
use std::rc::Rc;

use anemoi::app::events::AppEvent;
use anemoi::app::service::AnalyzerService;
use anemoi::config::{AnalyzerConfig, PayloadFormat};
use anemoi::events::{LinkEvent, LinkEventQueue};
use anemoi::sensors::SensorBank;
use anemoi::telemetry::{LinkTransition, TelemetryChannel};

use crate::mock_hw::{BoardCall, FakeSensor, MockBoard, MockDelay, RecordingSink};

struct Knobs {
    o2: Rc<Cell<f32>>,
    he: Rc<Cell<f32>>,
    pressure: Rc<Cell<f32>>,
}

fn bank(o2_mv: f32, he_mv: f32, pressure_mbar: f32) -> (SensorBank, Knobs) {
    let (o2, o2_knob) = FakeSensor::new("o2", o2_mv);
    let (he, he_knob) = FakeSensor::new("he", he_mv);
    let (p, p_knob) = FakeSensor::new("pressure", pressure_mbar);
    let (t, _) = FakeSensor::new("temperature", 20.0);
    (
        SensorBank::new(Box::new(o2), Box::new(he), Box::new(p), Box::new(t)),
        Knobs {
            o2: o2_knob,
            he: he_knob,
            pressure: p_knob,
        },
    )
}

struct Rig {
    app: AnalyzerService,
    hw: MockBoard,
    delay: MockDelay,
    events: LinkEventQueue,
    sink: RecordingSink,
    knobs: Knobs,
}

impl Rig {
    fn new(config: AnalyzerConfig, o2_mv: f32) -> Self {
        let (sensors, knobs) = bank(o2_mv, 5.0, 1013.25);
        let mut rig = Self {
            app: AnalyzerService::new(config, sensors),
            hw: MockBoard::new(),
            delay: MockDelay::default(),
            events: LinkEventQueue::new(),
            sink: RecordingSink::default(),
            knobs,
        };
        rig.app.start(&mut rig.hw, &mut rig.sink);
        rig
    }

    fn tick(&mut self, now_ms: u32) -> anemoi::gas::GasReadings {
        self.app.tick(
            &mut self.hw,
            &mut self.delay,
            &self.events,
            now_ms,
            &mut self.sink,
        )
    }

    fn reset_records(&mut self) {
        self.hw.clear();
        self.delay.delays_ms.clear();
        self.sink.events.clear();
    }
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn startup_takes_first_calibration() {
    let rig = Rig::new(AnalyzerConfig::default(), 10.0);

    let b = rig.app.baseline();
    assert_eq!(b.o2_mv, 10.0);
    assert_eq!(b.he_mv, 5.0);
    assert_eq!(b.pressure_mbar, 1013.25);
    assert_eq!(rig.app.calibration_count(), 1);

    assert_eq!(rig.hw.calls, [BoardCall::Calibrating, BoardCall::Beep]);
    assert!(matches!(rig.sink.events[0], AppEvent::Calibrated(_)));
    match &rig.sink.events[1] {
        AppEvent::Started { unavailable } => assert!(unavailable.is_empty()),
        other => panic!("expected Started, got {:?}", other),
    }
}

#[test]
fn startup_reports_sensors_that_failed_setup() {
    let (o2, _) = FakeSensor::new("o2", 10.0);
    let (p, _) = FakeSensor::new("pressure", 1013.25);
    let (t, _) = FakeSensor::new("temperature", 20.0);
    let sensors = SensorBank::new(
        Box::new(o2),
        Box::new(FakeSensor::failing("he")),
        Box::new(p),
        Box::new(t),
    );
    let mut app = AnalyzerService::new(AnalyzerConfig::default(), sensors);
    let mut hw = MockBoard::new();
    let mut sink = RecordingSink::default();
    app.start(&mut hw, &mut sink);

    let started = sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::Started { unavailable } => Some(unavailable.clone()),
            _ => None,
        })
        .expect("Started event");
    assert_eq!(started.as_slice(), ["he"]);
    // Degraded, not stopped: the loop still runs.
    assert_eq!(app.baseline().he_mv, 0.0);
}

// ── Gas readings ──────────────────────────────────────────────

#[test]
fn calibration_voltage_reads_atmospheric_oxygen() {
    let mut rig = Rig::new(AnalyzerConfig::default(), 10.0);
    rig.reset_records();

    let readings = rig.tick(0);
    let pct = readings.percentage_o2().expect("calibrated");
    assert!(close(pct, 20.9), "O2 = {pct}");

    let (mv, shown) = rig.hw.last_gas_info().expect("gas view drawn");
    assert_eq!(mv, 10.0);
    assert!(close(shown.expect("percentage shown"), 20.9));
}

#[test]
fn oxygen_scales_with_cell_voltage() {
    let mut rig = Rig::new(AnalyzerConfig::default(), 10.0);
    rig.knobs.o2.set(20.0);
    let pct = rig.tick(0).percentage_o2().expect("calibrated");
    assert!(close(pct, 41.8), "O2 = {pct}");
}

#[test]
fn helium_reference_point_reads_seventy_five_percent() {
    let mut rig = Rig::new(AnalyzerConfig::default(), 10.0);
    rig.knobs.he.set(434.0);
    let pct = rig.tick(0).percentage_he();
    assert!(close(pct, 75.0), "He = {pct}");
}

#[test]
fn pressure_change_after_calibration_shifts_reference() {
    let mut rig = Rig::new(AnalyzerConfig::default(), 10.0);
    rig.knobs.pressure.set(2026.5);
    let readings = rig.tick(0);
    assert!(close(readings.atmospheric_o2, 0.418));
    assert!(close(readings.percentage_o2().unwrap_or(0.0), 41.8));
}

// ── Calibration trigger ───────────────────────────────────────

#[test]
fn two_remote_requests_run_two_passes() {
    let config = AnalyzerConfig::default();
    let settle = config.calibration_settle_ms;
    let mut rig = Rig::new(config, 10.0);
    rig.reset_records();

    rig.knobs.o2.set(12.0);
    assert!(rig.events.push(LinkEvent::CalibrationRequested));
    assert!(rig.events.push(LinkEvent::CalibrationRequested));
    rig.tick(0);

    assert_eq!(rig.app.calibration_count(), 3);
    assert_eq!(rig.app.baseline().o2_mv, 12.0);
    assert_eq!(rig.hw.beeps(), 2);
    assert_eq!(rig.delay.delays_ms, [settle, settle]);
    let passes = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::Calibrated(_)))
        .count();
    assert_eq!(passes, 2);
}

#[test]
fn readings_shown_before_recalibration_use_old_baseline() {
    let mut rig = Rig::new(AnalyzerConfig::default(), 10.0);
    rig.reset_records();

    rig.knobs.o2.set(20.0);
    assert!(rig.events.push(LinkEvent::CalibrationRequested));
    let readings = rig.tick(0);

    // This tick's readings were computed against the 10 mV baseline.
    assert!(close(readings.percentage_o2().unwrap_or(0.0), 41.8));
    let gas = rig.hw.calls.iter().position(|c| matches!(c, BoardCall::GasInfo { .. }));
    let calib = rig.hw.calls.iter().position(|c| *c == BoardCall::Calibrating);
    assert!(gas < calib);

    // The next one reads atmospheric again.
    assert!(close(rig.tick(1).percentage_o2().unwrap_or(0.0), 20.9));
}

#[test]
fn button_press_is_debounced_into_one_pass() {
    let mut config = AnalyzerConfig::default();
    config.button_debounce_ms = 50;
    let mut rig = Rig::new(config, 10.0);

    // Held across four samples, bounce on the first.
    rig.hw.button_levels = vec![true, false, true, true, true, false];
    for now in [0, 10, 20, 80, 140, 200] {
        rig.tick(now);
    }
    assert_eq!(rig.app.calibration_count(), 2);
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn nothing_is_sent_without_a_client() {
    let mut rig = Rig::new(AnalyzerConfig::default(), 10.0);
    rig.reset_records();
    rig.tick(0);
    rig.tick(1);
    assert!(rig.hw.notifications().is_empty());
    assert!(rig.delay.delays_ms.is_empty());
}

#[test]
fn connected_client_gets_json_then_pacing_delay() {
    let config = AnalyzerConfig::default();
    let pacing = config.telemetry_pacing_ms;
    let link_settle = config.link_settle_ms;
    let mut rig = Rig::new(config, 10.0);
    rig.reset_records();

    assert!(rig.events.push(LinkEvent::ClientConnected));
    rig.tick(0);

    let sent = rig.hw.notifications();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, TelemetryChannel::Readings);
    let json: serde_json::Value = serde_json::from_str(&sent[0].1).expect("valid JSON");
    assert_eq!(json["o2SensorVoltage"], 10.0);
    assert_eq!(json["temperature"], 20.0);
    assert!((json["percentageO2"].as_f64().unwrap_or(0.0) - 20.9).abs() < 1e-3);

    assert_eq!(rig.delay.delays_ms, [pacing, link_settle]);
    assert_eq!(rig.hw.messages(), ["Connected!"]);
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::Link(LinkTransition::Connected))
    );
}

#[test]
fn uncalibrated_oxygen_is_null_in_json() {
    let mut rig = Rig::new(AnalyzerConfig::default(), 0.0);
    assert!(!rig.app.baseline().is_calibrated());
    rig.reset_records();

    assert!(rig.events.push(LinkEvent::ClientConnected));
    let readings = rig.tick(0);
    assert_eq!(readings.percentage_o2(), None);
    assert_eq!(rig.hw.last_gas_info(), Some((0.0, None)));

    let sent = rig.hw.notifications();
    let json: serde_json::Value = serde_json::from_str(&sent[0].1).expect("valid JSON");
    assert!(json["percentageO2"].is_null());
}

#[test]
fn per_characteristic_format_sends_one_value_per_quantity() {
    let mut config = AnalyzerConfig::default();
    config.payload_format = PayloadFormat::PerCharacteristic;
    let mut rig = Rig::new(config, 10.0);
    rig.reset_records();

    assert!(rig.events.push(LinkEvent::ClientConnected));
    rig.tick(0);

    let sent = rig.hw.notifications();
    let channels: Vec<_> = sent.iter().map(|(c, _)| *c).collect();
    assert_eq!(
        channels,
        [
            TelemetryChannel::HeVoltage,
            TelemetryChannel::HePercentage,
            TelemetryChannel::O2Voltage,
            TelemetryChannel::O2Percentage,
            TelemetryChannel::Pressure,
            TelemetryChannel::Temperature,
        ]
    );
    assert_eq!(sent[0].1, "5.00");
    assert_eq!(sent[1].1, "0.00");
    assert_eq!(sent[2].1, "10.00");
    assert_eq!(sent[3].1, "20.90");
    assert_eq!(sent[4].1, "1013.25");
    assert_eq!(sent[5].1, "20.00");
}

#[test]
fn websocket_format_uses_dashboard_field_names() {
    let mut config = AnalyzerConfig::default();
    config.payload_format = PayloadFormat::WebSocket;
    let mut rig = Rig::new(config, 10.0);
    rig.reset_records();

    assert!(rig.events.push(LinkEvent::ClientConnected));
    rig.tick(0);

    let sent = rig.hw.notifications();
    let json: serde_json::Value = serde_json::from_str(&sent[0].1).expect("valid JSON");
    assert_eq!(json["cellVoltage"], "10.00");
    assert_eq!(json["ppO2"], "0.21");
    assert_eq!(json["athmosphericPressure"], "101325.00");
    assert_eq!(json["temperature"], "20.00");
}

#[test]
fn failed_update_is_logged_and_still_paced() {
    let config = AnalyzerConfig::default();
    let pacing = config.telemetry_pacing_ms;
    let mut rig = Rig::new(config, 10.0);
    rig.hw.reject_notify = true;
    rig.reset_records();

    assert!(rig.events.push(LinkEvent::ClientConnected));
    rig.tick(0);

    assert!(rig.hw.notifications().is_empty());
    assert_eq!(rig.delay.delays_ms.first(), Some(&pacing));
    assert!(
        !rig.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::Telemetry(_)))
    );
}

#[test]
fn minimum_interval_throttles_updates() {
    let mut config = AnalyzerConfig::default();
    config.telemetry_min_interval_ms = 1000;
    let mut rig = Rig::new(config, 10.0);

    assert!(rig.events.push(LinkEvent::ClientConnected));
    rig.tick(0);
    rig.tick(500);
    rig.tick(999);
    rig.tick(1000);
    assert_eq!(rig.hw.notifications().len(), 2);
}

// ── Link transitions ──────────────────────────────────────────

#[test]
fn disconnect_then_reconnect_in_one_iteration_yields_both_edges() {
    let mut rig = Rig::new(AnalyzerConfig::default(), 10.0);
    assert!(rig.events.push(LinkEvent::ClientConnected));
    rig.tick(0);
    rig.reset_records();

    assert!(rig.events.push(LinkEvent::ClientDisconnected));
    assert!(rig.events.push(LinkEvent::ClientConnected));
    rig.tick(10);

    assert_eq!(rig.hw.messages(), ["Disconnected!", "Connected!"]);
    let restart = rig
        .hw
        .calls
        .iter()
        .position(|c| *c == BoardCall::RestartAdvertising)
        .expect("advertising restarted");
    let reconnect = rig
        .hw
        .calls
        .iter()
        .position(|c| *c == BoardCall::Message("Connected!".into()))
        .expect("reconnect announced");
    assert!(restart < reconnect);
    assert_eq!(
        rig.hw
            .calls
            .iter()
            .filter(|c| **c == BoardCall::RestartAdvertising)
            .count(),
        1
    );
    assert!(rig.app.session().is_connected());
}

#[test]
fn disconnect_stops_updates_and_restarts_advertising() {
    let config = AnalyzerConfig::default();
    let link_settle = config.link_settle_ms;
    let mut rig = Rig::new(config, 10.0);
    assert!(rig.events.push(LinkEvent::ClientConnected));
    rig.tick(0);
    rig.reset_records();

    assert!(rig.events.push(LinkEvent::ClientDisconnected));
    rig.tick(10);

    assert!(rig.hw.notifications().is_empty());
    assert_eq!(rig.hw.beeps(), 1);
    assert_eq!(rig.hw.messages(), ["Disconnected!"]);
    assert_eq!(rig.hw.calls.last(), Some(&BoardCall::RestartAdvertising));
    assert_eq!(rig.delay.delays_ms, [link_settle]);
    assert!(!rig.app.session().is_connected());
}

#[test]
fn repeated_connect_events_announce_once() {
    let mut rig = Rig::new(AnalyzerConfig::default(), 10.0);
    rig.reset_records();
    assert!(rig.events.push(LinkEvent::ClientConnected));
    assert!(rig.events.push(LinkEvent::ClientConnected));
    rig.tick(0);
    rig.tick(1);
    assert_eq!(rig.hw.messages(), ["Connected!"]);
    assert_eq!(rig.app.tick_count(), 2);
}

#[test]
fn calibrate_flood_cannot_swallow_disconnect() {
    let config = AnalyzerConfig::default();
    let settle = config.calibration_settle_ms;
    let mut rig = Rig::new(config, 10.0);
    assert!(rig.events.push(LinkEvent::ClientConnected));
    rig.tick(0);
    rig.reset_records();

    for _ in 0..16 {
        assert!(rig.events.push(LinkEvent::CalibrationRequested));
    }
    assert!(rig.events.push(LinkEvent::ClientDisconnected));
    rig.tick(10);
    rig.tick(20);

    assert!(!rig.app.session().is_connected());
    assert_eq!(rig.hw.messages(), ["Disconnected!"]);
    assert_eq!(
        rig.hw
            .calls
            .iter()
            .filter(|c| **c == BoardCall::RestartAdvertising)
            .count(),
        1
    );
    // Every request still ran, none were dropped.
    assert_eq!(rig.app.calibration_count(), 1 + 16);
    assert_eq!(
        rig.delay.delays_ms.iter().filter(|&&d| d == settle).count(),
        16
    );
    assert!(rig.hw.notifications().is_empty());
}

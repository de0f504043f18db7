//! Application service — the hexagonal core.
//!
//! [`AnalyzerService`] owns the sensors, the calibration baseline, the
//! calibration trigger and the telemetry session.  It exposes a clean,
//! hardware-agnostic API.  All I/O flows through port traits injected at
//! call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  SensorBank ──▶ ┌──────────────────────────┐ ──▶ DisplayPort
//!   ButtonPort ──▶ │     AnalyzerService      │ ──▶ BuzzerPort
//! LinkEventQueue ─▶│ Baseline · Trigger · Link│ ──▶ TelemetryPort
//!                 └──────────────────────────┘ ──▶ EventSink
//! ```
//!
//! ## One tick
//!
//! 1. poll every sensor
//! 2. sample the button, drain link events
//! 3. compute readings against the current baseline, show them
//! 4. one recalibration per pending trigger edge
//! 5. if a client is connected: one update, then the pacing delay
//! 6. side effects of every pending connect/disconnect edge, in order

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::calibration::{CalibrationBaseline, CalibrationTrigger};
use crate::config::{AnalyzerConfig, PayloadFormat};
use crate::drivers::button::{ButtonEvent, DebouncedButton};
use crate::error::TransportError;
use crate::events::{LinkEvent, LinkEventQueue};
use crate::gas::GasReadings;
use crate::sensors::SensorBank;
use crate::telemetry::payload;
use crate::telemetry::{LinkTransition, TelemetryChannel, TelemetrySession};

use super::events::AppEvent;
use super::ports::{ButtonPort, BuzzerPort, DisplayPort, EventSink, TelemetryPort};

// ───────────────────────────────────────────────────────────────
// AnalyzerService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AnalyzerService {
    config: AnalyzerConfig,
    sensors: SensorBank,
    baseline: CalibrationBaseline,
    trigger: CalibrationTrigger,
    session: TelemetrySession,
    button: DebouncedButton,
    tick_count: u64,
    calibration_count: u32,
}

impl AnalyzerService {
    /// Construct the service.  Does **not** touch hardware; call
    /// [`start`](Self::start) next.
    pub fn new(config: AnalyzerConfig, sensors: SensorBank) -> Self {
        let session = TelemetrySession::new(config.telemetry_min_interval_ms);
        let button = DebouncedButton::new(config.button_debounce_ms);
        Self {
            config,
            sensors,
            baseline: CalibrationBaseline::default(),
            trigger: CalibrationTrigger::new(),
            session,
            button,
            tick_count: 0,
            calibration_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring every sensor up and take the startup calibration.
    ///
    /// The sensors are polled once before calibrating so the first
    /// baseline comes from real readings rather than empty caches.
    pub fn start(
        &mut self,
        hw: &mut (impl DisplayPort + BuzzerPort),
        sink: &mut impl EventSink,
    ) {
        self.sensors.setup_all();
        self.sensors.poll_all();

        let mut unavailable = heapless::Vec::new();
        for name in self.sensors.unavailable() {
            let _ = unavailable.push(name);
        }
        if !unavailable.is_empty() {
            warn!("running degraded, unavailable: {:?}", unavailable);
        }

        self.recalibrate(sink);
        hw.show_calibrating();
        hw.beep();

        sink.emit(&AppEvent::Started { unavailable });
        info!("AnalyzerService started");
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one loop iteration.  Returns the readings computed this tick.
    ///
    /// `hw` is the whole board, so one `&mut` covers every output port.
    pub fn tick(
        &mut self,
        hw: &mut (impl DisplayPort + BuzzerPort + TelemetryPort + ButtonPort),
        delay: &mut impl DelayNs,
        events: &LinkEventQueue,
        now_ms: u32,
        sink: &mut impl EventSink,
    ) -> GasReadings {
        self.tick_count += 1;

        // 1. Sensors
        self.sensors.poll_all();

        // 2. Inputs
        if let Some(ButtonEvent::Pressed) = self.button.tick(now_ms, hw.is_pressed()) {
            info!("calibration requested (button)");
            self.trigger.fire();
        }
        events.drain(|event| self.handle_link_event(event));

        // 3. Compute + display against the baseline in force
        let readings = GasReadings::compute(self.sensors.snapshot(), &self.baseline);
        hw.show_gas_information(readings.raw.o2_mv, readings.percentage_o2());

        // 4. One pass per edge
        while self.trigger.take() {
            hw.beep();
            self.recalibrate(sink);
            hw.show_calibrating();
            delay.delay_ms(self.config.calibration_settle_ms);
        }

        // 5. Telemetry
        if self.session.send_due(now_ms) {
            if let Err(e) = self.publish(hw, &readings) {
                warn!("telemetry update failed: {}", e);
            } else {
                sink.emit(&AppEvent::Telemetry(readings));
            }
            self.session.mark_sent(now_ms);
            delay.delay_ms(self.config.telemetry_pacing_ms);
        }

        // 6. Link edges
        while let Some(edge) = self.session.next_transition() {
            hw.beep();
            hw.show_message(edge.message());
            delay.delay_ms(self.config.link_settle_ms);
            if edge == LinkTransition::Disconnected {
                hw.restart_advertising();
            }
            sink.emit(&AppEvent::Link(edge));
        }

        readings
    }

    /// Feed one transport event.  Also what [`tick`](Self::tick) does
    /// for every queued event.
    pub fn handle_link_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::ClientConnected => self.session.set_connected(true),
            LinkEvent::ClientDisconnected => self.session.set_connected(false),
            LinkEvent::CalibrationRequested => {
                info!("calibration requested (remote)");
                self.trigger.fire();
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn baseline(&self) -> &CalibrationBaseline {
        &self.baseline
    }

    pub fn session(&self) -> &TelemetrySession {
        &self.session
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Total loop iterations since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Calibration passes taken, startup included.
    pub fn calibration_count(&self) -> u32 {
        self.calibration_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn recalibrate(&mut self, sink: &mut impl EventSink) {
        self.baseline.calibrate(&mut self.sensors);
        self.calibration_count += 1;
        sink.emit(&AppEvent::Calibrated(self.baseline));
    }

    /// Encode `readings` in the configured format and hand them to the
    /// transport.
    fn publish(
        &self,
        port: &mut impl TelemetryPort,
        readings: &GasReadings,
    ) -> Result<(), TransportError> {
        match self.config.payload_format {
            PayloadFormat::Json => {
                let bytes = payload::encode_json(readings)?;
                port.notify(TelemetryChannel::Readings, &bytes)
            }
            PayloadFormat::WebSocket => {
                let bytes = payload::encode_websocket(readings)?;
                port.notify(TelemetryChannel::Readings, &bytes)
            }
            PayloadFormat::PerCharacteristic => {
                for (channel, text) in payload::encode_per_characteristic(readings) {
                    port.notify(channel, text.as_bytes())?;
                }
                Ok(())
            }
        }
    }
}

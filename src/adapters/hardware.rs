//! Hardware adapter — bridges the board's peripherals to domain port traits.
//!
//! Owns the display, buzzer, telemetry transport and button adapters and
//! exposes them together, so the service can take one `&mut` for all of
//! its outputs.  Sensors are not here; the service owns them directly.

use crate::app::ports::{ButtonPort, BuzzerPort, DisplayPort, TelemetryPort};
use crate::error::TransportError;
use crate::telemetry::TelemetryChannel;

/// Concrete adapter that combines all board I/O behind port traits.
pub struct AnalyzerBoard<D, B, T, K> {
    pub display: D,
    pub buzzer: B,
    pub telemetry: T,
    pub button: K,
}

impl<D, B, T, K> AnalyzerBoard<D, B, T, K> {
    pub fn new(display: D, buzzer: B, telemetry: T, button: K) -> Self {
        Self {
            display,
            buzzer,
            telemetry,
            button,
        }
    }
}

// ── DisplayPort implementation ────────────────────────────────

impl<D: DisplayPort, B, T, K> DisplayPort for AnalyzerBoard<D, B, T, K> {
    fn show_calibrating(&mut self) {
        self.display.show_calibrating();
    }

    fn show_message(&mut self, text: &str) {
        self.display.show_message(text);
    }

    fn show_gas_information(&mut self, o2_mv: f32, percentage_o2: Option<f32>) {
        self.display.show_gas_information(o2_mv, percentage_o2);
    }
}

// ── BuzzerPort implementation ─────────────────────────────────

impl<D, B: BuzzerPort, T, K> BuzzerPort for AnalyzerBoard<D, B, T, K> {
    fn beep(&mut self) {
        self.buzzer.beep();
    }
}

// ── TelemetryPort implementation ──────────────────────────────

impl<D, B, T: TelemetryPort, K> TelemetryPort for AnalyzerBoard<D, B, T, K> {
    fn notify(
        &mut self,
        channel: TelemetryChannel,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        self.telemetry.notify(channel, payload)
    }

    fn restart_advertising(&mut self) {
        self.telemetry.restart_advertising();
    }
}

// ── ButtonPort implementation ─────────────────────────────────

impl<D, B, T, K: ButtonPort> ButtonPort for AnalyzerBoard<D, B, T, K> {
    fn is_pressed(&mut self) -> bool {
        self.button.is_pressed()
    }
}

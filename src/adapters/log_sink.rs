//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(r) => match r.percentage_o2() {
                Some(o2) => info!(
                    "TELEM | O2={:.2}mV {:.1}% | He={:.2}mV {:.1}% | p={:.2}mbar | T={:.1}\u{00b0}C",
                    r.raw.o2_mv,
                    o2,
                    r.raw.he_mv,
                    r.percentage_he(),
                    r.raw.pressure_mbar,
                    r.raw.temperature_c,
                ),
                None => info!(
                    "TELEM | O2={:.2}mV uncalibrated | He={:.2}mV {:.1}% | p={:.2}mbar | T={:.1}\u{00b0}C",
                    r.raw.o2_mv,
                    r.raw.he_mv,
                    r.percentage_he(),
                    r.raw.pressure_mbar,
                    r.raw.temperature_c,
                ),
            },
            AppEvent::Calibrated(b) => {
                info!(
                    "CALIB | O2={:.2}mV He={:.2}mV p={:.2}mbar",
                    b.o2_mv, b.he_mv, b.pressure_mbar
                );
            }
            AppEvent::Link(edge) => {
                info!("LINK  | {}", edge.message());
            }
            AppEvent::Started { unavailable } => {
                info!("START | unavailable={:?}", unavailable);
            }
        }
    }
}

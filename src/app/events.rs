//! Outbound application events.
//!
//! The [`AnalyzerService`](super::service::AnalyzerService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them (serial log, test recorder).

use crate::calibration::CalibrationBaseline;
use crate::gas::GasReadings;
use crate::telemetry::LinkTransition;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Startup finished; carries the names of sensors that did not come up.
    Started { unavailable: heapless::Vec<&'static str, 4> },

    /// A calibration pass stored a new baseline.
    Calibrated(CalibrationBaseline),

    /// One update went out to the connected client.
    Telemetry(GasReadings),

    /// A connect/disconnect edge was announced.
    Link(LinkTransition),
}

//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AnalyzerService (domain)
//! ```
//!
//! Driven adapters (display, buzzer, telemetry transport, button, event
//! sinks) implement these traits.  The
//! [`AnalyzerService`](super::service::AnalyzerService) consumes them via
//! generics, so the domain core never touches hardware directly.
//!
//! Sensors are not behind a port here: they are owned by the service as a
//! [`SensorBank`](crate::sensors::SensorBank) of `dyn Sensor`s.

use crate::error::TransportError;
use crate::telemetry::TelemetryChannel;

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → screen)
// ───────────────────────────────────────────────────────────────

/// The three things the analyzer ever shows.
pub trait DisplayPort {
    /// Static "Calibrating..." screen.
    fn show_calibrating(&mut self);

    /// Short free-text message (link transitions).
    fn show_message(&mut self, text: &str);

    /// Live gas view.  `percentage_o2` is `None` while uncalibrated.
    fn show_gas_information(&mut self, o2_mv: f32, percentage_o2: Option<f32>);
}

// ───────────────────────────────────────────────────────────────
// Buzzer port (driven adapter: domain → audible feedback)
// ───────────────────────────────────────────────────────────────

pub trait BuzzerPort {
    /// One fixed-length beep.  Blocks for its duration.
    fn beep(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Telemetry port (driven adapter: domain → remote client)
// ───────────────────────────────────────────────────────────────

/// Outbound side of the live-telemetry transport.
///
/// Inbound events (connect, disconnect, calibrate writes) do not come
/// through here; the adapter pushes them into the
/// [`LinkEventQueue`](crate::events::LinkEventQueue).
pub trait TelemetryPort {
    /// Push `payload` to the client on `channel`.
    fn notify(
        &mut self,
        channel: TelemetryChannel,
        payload: &[u8],
    ) -> Result<(), TransportError>;

    /// Make the device discoverable again after a client left.
    fn restart_advertising(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Button port (driving adapter: user → domain)
// ───────────────────────────────────────────────────────────────

/// Raw level of the calibration button.  Debouncing happens in the
/// service.
pub trait ButtonPort {
    fn is_pressed(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

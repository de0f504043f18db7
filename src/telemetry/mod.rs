//! Live telemetry towards a remote client.
//!
//! - [`session`] — connect/disconnect lifecycle and send pacing.
//! - [`payload`] — the wire encodings of one [`GasReadings`](crate::gas::GasReadings).

pub mod payload;
pub mod session;

pub use payload::TelemetryChannel;
pub use session::{LinkTransition, TelemetrySession};

//! Unified error types for the Anemoi firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! driving loop and the binary entry point handle failures uniformly.
//! All variants are `Copy`; nothing here allocates.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be brought up or read.
    Sensor(SensorError),
    /// The telemetry transport rejected an outbound update.
    Transport(TransportError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The chip did not answer on the bus, or answered with the wrong ID.
    NotFound,
    /// An I2C transaction failed mid-read.
    BusError,
    /// The chip never reported a finished conversion.
    ConversionTimeout,
    /// `poll()` was called before a successful `setup()`.
    NotInitialised,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "device not found"),
            Self::BusError => write!(f, "I2C bus error"),
            Self::ConversionTimeout => write!(f, "conversion did not complete"),
            Self::NotInitialised => write!(f, "sensor not initialised"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// No client is subscribed.
    NotConnected,
    /// Payload exceeds the characteristic / frame limit.
    PayloadTooLarge,
    /// The readings could not be serialised.
    Encoding,
    /// The platform stack returned an error code.
    Stack(i32),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "no client connected"),
            Self::PayloadTooLarge => write!(f, "payload too large"),
            Self::Encoding => write!(f, "payload encoding failed"),
            Self::Stack(rc) => write!(f, "stack error (rc={rc})"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

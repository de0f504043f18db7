//! System configuration parameters
//!
//! All tunable parameters for the analyzer: feedback timings, telemetry
//! pacing, button debounce, payload encoding, and the bounds used by the
//! synthetic sensors in dummy-board mode.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Longest BLE device name we advertise (fits a legacy advertising packet).
pub const MAX_DEVICE_NAME_LEN: usize = 29;

/// How live readings are laid out on the BLE transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadFormat {
    /// One JSON object per update on the TX characteristic.
    Json,
    /// One two-decimal text value per quantity, each on its own characteristic.
    PerCharacteristic,
    /// String-valued object shaped for the web dashboard client.
    WebSocket,
}

/// Closed interval a synthetic sensor draws from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimBounds {
    pub lower: f32,
    pub upper: f32,
}

impl SimBounds {
    pub const fn new(lower: f32, upper: f32) -> Self {
        Self { lower, upper }
    }
}

/// Core analyzer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    // --- Identity ---
    /// Advertised BLE device name
    pub device_name: heapless::String<MAX_DEVICE_NAME_LEN>,

    // --- Feedback ---
    /// Buzzer on-time for a single beep (milliseconds)
    pub beep_ms: u32,
    /// Pause after a calibration pass so the message can be read (milliseconds)
    pub calibration_settle_ms: u32,
    /// Pause after a connect/disconnect message (milliseconds)
    pub link_settle_ms: u32,

    // --- Telemetry ---
    /// Mandatory delay after every outbound update (milliseconds)
    pub telemetry_pacing_ms: u32,
    /// Minimum spacing between two updates, 0 = every iteration (milliseconds)
    pub telemetry_min_interval_ms: u32,
    /// Payload layout on the transport
    pub payload_format: PayloadFormat,

    // --- Input ---
    /// A button level must hold this long before its edge counts (milliseconds)
    pub button_debounce_ms: u32,

    // --- Timing ---
    /// Idle time at the end of every loop iteration (milliseconds)
    pub loop_interval_ms: u32,

    // --- Dummy board ---
    pub sim_o2_mv: SimBounds,
    pub sim_he_mv: SimBounds,
    pub sim_pressure_mbar: SimBounds,
    pub sim_temperature_c: SimBounds,
    /// Seed for the synthetic sensors' generator
    pub sim_seed: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        let mut device_name = heapless::String::new();
        // Fits MAX_DEVICE_NAME_LEN.
        let _ = device_name.push_str("Anemoi Analyzer Nano");

        Self {
            device_name,

            // Feedback
            beep_ms: 100,
            calibration_settle_ms: 1000,
            link_settle_ms: 500,

            // Telemetry
            telemetry_pacing_ms: 100, // avoid BLE notification congestion
            telemetry_min_interval_ms: 0,
            payload_format: PayloadFormat::Json,

            // Input
            button_debounce_ms: 50,

            // Timing
            loop_interval_ms: 0,

            // Dummy board
            sim_o2_mv: SimBounds::new(9.0, 11.0),
            sim_he_mv: SimBounds::new(0.0, 2.0),
            sim_pressure_mbar: SimBounds::new(1013.0, 1024.0),
            sim_temperature_c: SimBounds::new(19.0, 22.0),
            sim_seed: 0x414e_454d_4f49,
        }
    }
}

impl AnalyzerConfig {
    /// Reject values that would stall or confuse the driving loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device_name.is_empty() {
            return Err(ConfigError::ValidationFailed("device_name must not be empty"));
        }
        if self.telemetry_pacing_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "telemetry_pacing_ms must be > 0",
            ));
        }
        if self.beep_ms == 0 {
            return Err(ConfigError::ValidationFailed("beep_ms must be > 0"));
        }
        for bounds in [
            self.sim_o2_mv,
            self.sim_he_mv,
            self.sim_pressure_mbar,
            self.sim_temperature_c,
        ] {
            if !bounds.lower.is_finite() || !bounds.upper.is_finite() {
                return Err(ConfigError::ValidationFailed("sim bounds must be finite"));
            }
            if bounds.lower > bounds.upper {
                return Err(ConfigError::ValidationFailed(
                    "sim lower bound above upper bound",
                ));
            }
        }
        Ok(())
    }
}

/// Errors from configuration validation and loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl From<ConfigError> for crate::error::Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::Corrupted => Self::Config("corrupted"),
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
        }
    }
}

/// Parse a JSON config blob and validate it.
pub fn from_json(raw: &[u8]) -> Result<AnalyzerConfig, ConfigError> {
    let config: AnalyzerConfig =
        serde_json::from_slice(raw).map_err(|_| ConfigError::Corrupted)?;
    config.validate()?;
    Ok(config)
}

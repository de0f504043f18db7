//! Wire encodings of one set of readings.
//!
//! | Format               | Channel(s)              | Shape                               |
//! |----------------------|-------------------------|-------------------------------------|
//! | `Json`               | `Readings`              | camelCase object, JSON numbers      |
//! | `PerCharacteristic`  | one per quantity        | `"12.34"` text                      |
//! | `WebSocket`          | `Readings`              | object of two-decimal strings       |
//!
//! Only the latest reading is ever encoded; nothing is buffered.

use core::fmt::Write;

use serde::Serialize;

use crate::error::TransportError;
use crate::gas::GasReadings;

/// Room for any two-decimal value we report.
pub type ValueText = heapless::String<16>;

/// Logical outbound channel.  The transport adapter maps each to a
/// concrete endpoint (a GATT characteristic on BLE).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryChannel {
    /// Whole-record channel for the JSON and WebSocket encodings.
    Readings,
    O2Voltage,
    O2Percentage,
    HeVoltage,
    HePercentage,
    Pressure,
    Temperature,
}

/// Record pushed on [`TelemetryChannel::Readings`] in `Json` format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryPayload {
    pub o2_sensor_voltage: f32,
    pub he_sensor_voltage: f32,
    pub atmospheric_pressure: f32,
    pub temperature: f32,
    /// `null` until the first calibration.
    pub percentage_o2: Option<f32>,
    pub percentage_he: f32,
}

impl From<&GasReadings> for TelemetryPayload {
    fn from(r: &GasReadings) -> Self {
        Self {
            o2_sensor_voltage: r.raw.o2_mv,
            he_sensor_voltage: r.raw.he_mv,
            atmospheric_pressure: r.raw.pressure_mbar,
            temperature: r.raw.temperature_c,
            percentage_o2: r.percentage_o2(),
            percentage_he: r.percentage_he(),
        }
    }
}

pub fn encode_json(readings: &GasReadings) -> Result<Vec<u8>, TransportError> {
    serde_json::to_vec(&TelemetryPayload::from(readings)).map_err(|_| TransportError::Encoding)
}

/// Record shape the web dashboard expects.  Field names are fixed by the
/// client, typo included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebSocketPayload {
    #[serde(rename = "cellVoltage")]
    pub cell_voltage: ValueText,
    #[serde(rename = "ppO2")]
    pub pp_o2: ValueText,
    pub temperature: ValueText,
    /// Pascals.
    #[serde(rename = "athmosphericPressure")]
    pub atmospheric_pressure: ValueText,
    pub altitude: ValueText,
}

impl From<&GasReadings> for WebSocketPayload {
    fn from(r: &GasReadings) -> Self {
        Self {
            cell_voltage: fixed2(r.raw.o2_mv),
            pp_o2: r.ppo2_bar().map(fixed2).unwrap_or_else(unavailable),
            temperature: fixed2(r.raw.temperature_c),
            atmospheric_pressure: fixed2(r.raw.pressure_mbar * 100.0),
            altitude: fixed2(r.altitude_m()),
        }
    }
}

pub fn encode_websocket(readings: &GasReadings) -> Result<Vec<u8>, TransportError> {
    serde_json::to_vec(&WebSocketPayload::from(readings)).map_err(|_| TransportError::Encoding)
}

/// One text value per quantity.  The O2 percentage is left out until the
/// first calibration, so the client keeps its last value instead of
/// showing garbage.
pub fn encode_per_characteristic(
    readings: &GasReadings,
) -> heapless::Vec<(TelemetryChannel, ValueText), 6> {
    let mut out = heapless::Vec::new();
    let mut push = |channel, value| {
        // Capacity matches the number of channels below.
        let _ = out.push((channel, fixed2(value)));
    };

    push(TelemetryChannel::HeVoltage, readings.raw.he_mv);
    push(TelemetryChannel::HePercentage, readings.percentage_he());
    push(TelemetryChannel::O2Voltage, readings.raw.o2_mv);
    if let Some(pct) = readings.percentage_o2() {
        push(TelemetryChannel::O2Percentage, pct);
    }
    push(TelemetryChannel::Pressure, readings.raw.pressure_mbar);
    push(TelemetryChannel::Temperature, readings.raw.temperature_c);
    out
}

/// Two decimals, like the display.  Values too wide for the buffer come
/// out truncated.
pub fn fixed2(value: f32) -> ValueText {
    let mut s = ValueText::new();
    let _ = write!(s, "{:.2}", value);
    s
}

fn unavailable() -> ValueText {
    let mut s = ValueText::new();
    let _ = s.push_str("--");
    s
}

//! Gas fraction model — pure conversions from raw cell voltages and
//! barometric pressure to O2/He percentages.
//!
//! Nothing here keeps state; every function takes the baseline it needs.
//!
//! ## O2 cell
//!
//! A galvanic O2 cell's output is proportional to ppO2.  Calibrating in
//! ambient air pins the baseline voltage to the atmospheric O2 fraction at
//! the current pressure, so the fraction of any other mix is a ratio:
//!
//! ```text
//! fO2 = atmO2(p) · V / V_baseline      atmO2(p) = 0.209 · p / 1013.25
//! ```
//!
//! ## He cell
//!
//! Linear two-point curve with a fixed slope (75 % He ⇔ +429 mV over the
//! air baseline):
//!
//! ```text
//! fHe = 0.75 / 429 · (V − V_baseline)
//! ```
//!
//! No result is clamped to [0, 100] %; out-of-range values reach the
//! display and the client unchanged.

use crate::calibration::CalibrationBaseline;

/// Standard O2 fraction of dry air at sea level.
pub const ATMOSPHERIC_O2_FRACTION_AT_SEA_LEVEL: f32 = 0.209;
/// Standard sea-level pressure (mbar).
pub const ATMOSPHERIC_PRESSURE_AT_SEA_LEVEL_MBAR: f32 = 1013.25;
/// He fraction at the reference point of the He cell's curve.
pub const HE_REFERENCE_FRACTION: f32 = 0.75;
/// Cell voltage rise at the reference He fraction (mV).
pub const HE_REFERENCE_DELTA_MV: f32 = 429.00;
/// An O2 baseline below this is treated as "never calibrated" (mV).
pub const MIN_BASELINE_MV: f32 = 0.01;

/// O2 fraction of ambient air scaled by the current pressure.
///
/// Divides by a constant only, so it is defined for every input.
pub fn atmospheric_oxygen_percentage(pressure_mbar: f32) -> f32 {
    (ATMOSPHERIC_O2_FRACTION_AT_SEA_LEVEL * pressure_mbar) / ATMOSPHERIC_PRESSURE_AT_SEA_LEVEL_MBAR
}

/// O2 fraction of the sampled gas from the cell voltage.
///
/// Unguarded: a zero `baseline_mv` yields ±inf or NaN.  Callers that may
/// run before the first calibration should go through
/// [`GasReadings::compute`], which checks the baseline first.
pub fn oxygen_fraction_from_voltage(
    current_mv: f32,
    atmospheric_o2_percentage: f32,
    baseline_mv: f32,
) -> f32 {
    atmospheric_o2_percentage * current_mv / baseline_mv
}

/// He fraction of the sampled gas from the cell voltage.
///
/// Subtracts the baseline, so it never divides by zero, but the result is
/// meaningless before the first calibration.
pub fn helium_fraction_from_voltage(current_mv: f32, baseline_mv: f32) -> f32 {
    HE_REFERENCE_FRACTION / HE_REFERENCE_DELTA_MV * (current_mv - baseline_mv)
}

/// Partial pressure of O2 in bar.
pub fn o2_partial_pressure_bar(o2_fraction: f32, pressure_mbar: f32) -> f32 {
    o2_fraction * pressure_mbar / 1000.0
}

/// Barometric altitude estimate (m) against the standard sea-level pressure.
pub fn pressure_altitude_m(pressure_mbar: f32) -> f32 {
    44_330.0 * (1.0 - (pressure_mbar / ATMOSPHERIC_PRESSURE_AT_SEA_LEVEL_MBAR).powf(0.1903))
}

pub fn fraction_to_percentage(fraction: f32) -> f32 {
    fraction * 100.0
}

/// Cached sensor values for one loop iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawReadings {
    pub o2_mv: f32,
    pub he_mv: f32,
    pub pressure_mbar: f32,
    pub temperature_c: f32,
}

/// Everything derived from one set of raw readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasReadings {
    pub raw: RawReadings,
    /// Pressure-scaled atmospheric O2 fraction used as the reference.
    pub atmospheric_o2: f32,
    /// `None` until a calibration pass stored a usable O2 baseline.
    pub fraction_o2: Option<f32>,
    pub fraction_he: f32,
}

impl GasReadings {
    pub fn compute(raw: RawReadings, baseline: &CalibrationBaseline) -> Self {
        let atmospheric_o2 = atmospheric_oxygen_percentage(raw.pressure_mbar);
        let fraction_o2 = baseline
            .is_calibrated()
            .then(|| oxygen_fraction_from_voltage(raw.o2_mv, atmospheric_o2, baseline.o2_mv));
        let fraction_he = helium_fraction_from_voltage(raw.he_mv, baseline.he_mv);

        Self {
            raw,
            atmospheric_o2,
            fraction_o2,
            fraction_he,
        }
    }

    pub fn percentage_o2(&self) -> Option<f32> {
        self.fraction_o2.map(fraction_to_percentage)
    }

    pub fn percentage_he(&self) -> f32 {
        fraction_to_percentage(self.fraction_he)
    }

    pub fn ppo2_bar(&self) -> Option<f32> {
        self.fraction_o2
            .map(|f| o2_partial_pressure_bar(f, self.raw.pressure_mbar))
    }

    pub fn altitude_m(&self) -> f32 {
        pressure_altitude_m(self.raw.pressure_mbar)
    }
}

//! Calibration baseline and the edge latch that requests a new one.
//!
//! A calibration pass is taken with the sensors in ambient air.  It stores
//! the O2 cell voltage, the He cell voltage and the barometric pressure in
//! one go; every later reading is normalised against those three values
//! (see [`crate::gas`]).
//!
//! The baseline starts at zero.  Until the first pass the O2 percentage is
//! reported as unavailable rather than computed.

use log::{info, warn};

use crate::gas::MIN_BASELINE_MV;
use crate::sensors::SensorBank;

/// Zero-reference readings captured by one calibration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CalibrationBaseline {
    /// O2 cell voltage in ambient air (mV).
    pub o2_mv: f32,
    /// He cell voltage in ambient air (mV).
    pub he_mv: f32,
    /// Barometric pressure at calibration time (mbar).
    pub pressure_mbar: f32,
}

impl CalibrationBaseline {
    /// Whether the O2 baseline is far enough from zero to divide by.
    pub fn is_calibrated(&self) -> bool {
        self.o2_mv.abs() >= MIN_BASELINE_MV
    }

    /// Read the three baseline quantities from the bank's caches and
    /// overwrite `self` with them.
    ///
    /// Never rolls back: a sensor that never came up still contributes
    /// its cached value (0.0 when it was never polled).
    pub fn calibrate(&mut self, sensors: &mut SensorBank) {
        for (name, available) in [
            ("O2 cell", sensors.o2.is_available()),
            ("He cell", sensors.he.is_available()),
            ("pressure", sensors.pressure.is_available()),
        ] {
            if !available {
                warn!("calibrating against unavailable {} sensor", name);
            }
        }

        *self = Self {
            o2_mv: sensors.o2.read(),
            he_mv: sensors.he.read(),
            pressure_mbar: sensors.pressure.read(),
        };

        info!(
            "calibrated: O2={:.2}mV He={:.2}mV p={:.2}mbar",
            self.o2_mv, self.he_mv, self.pressure_mbar
        );
    }
}

// ───────────────────────────────────────────────────────────────
// CalibrationTrigger
// ───────────────────────────────────────────────────────────────

/// Latch between an edge source (button, remote write) and the loop.
///
/// Edges are counted, not merged: two edges seen before the loop gets to
/// them produce two passes.
#[derive(Debug, Default)]
pub struct CalibrationTrigger {
    pending: u8,
}

impl CalibrationTrigger {
    pub const fn new() -> Self {
        Self { pending: 0 }
    }

    /// Record one rising edge.
    pub fn fire(&mut self) {
        self.pending = self.pending.saturating_add(1);
    }

    /// Consume one edge.  Returns `false` once the latch is idle again.
    pub fn take(&mut self) -> bool {
        if self.pending == 0 {
            return false;
        }
        self.pending -= 1;
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.pending > 0
    }
}

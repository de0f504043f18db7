//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the analyzer's driving loop: polling sensors,
//! calibration, gas computation, link lifecycle and telemetry pacing.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;

//! Sensor subsystem — the [`Sensor`] capability and the aggregating
//! [`SensorBank`].
//!
//! Two kinds of sensor exist:
//!
//! - **Polled hardware** ([`PolledSensor`] around a [`Probe`]): `poll()`
//!   does exactly one hardware read and caches it; `read()` returns the
//!   cache and never touches the bus.  A failed `setup()` latches the
//!   sensor unavailable for the rest of the run.
//! - **Synthetic** ([`random::RandomSensor`]): always available, draws a
//!   fresh value on every `read()`.
//!
//! The bank owns one sensor per measured quantity and produces a
//! [`RawReadings`] each tick.

pub mod barometer;
pub mod gas_cell;
pub mod pressure;
pub mod random;
pub mod temperature;

use log::{error, info, warn};

use crate::config::AnalyzerConfig;
use crate::error::SensorError;
use crate::gas::RawReadings;
use random::RandomSensor;

/// A physical quantity obtainable by polling hardware.
pub trait Sensor {
    /// Short tag for log lines.
    fn name(&self) -> &'static str;

    /// Bring the hardware up.  Called once, before the first `poll()`.
    fn setup(&mut self);

    /// Refresh the cached value from hardware.
    fn poll(&mut self);

    fn is_available(&self) -> bool;

    /// Latest value in the sensor's unit.
    fn read(&mut self) -> f32;
}

/// One fallible hardware measurement, wrapped by [`PolledSensor`].
pub trait Probe {
    fn name(&self) -> &'static str;

    fn begin(&mut self) -> Result<(), SensorError>;

    fn measure(&mut self) -> Result<f32, SensorError>;
}

/// Caching, availability-latching wrapper around a [`Probe`].
pub struct PolledSensor<P> {
    probe: P,
    last_reading: f32,
    available: bool,
}

impl<P: Probe> PolledSensor<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            last_reading: 0.0,
            available: false,
        }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }
}

impl<P: Probe> Sensor for PolledSensor<P> {
    fn name(&self) -> &'static str {
        self.probe.name()
    }

    fn setup(&mut self) {
        match self.probe.begin() {
            Ok(()) => {
                self.available = true;
                info!("{}: ready", self.probe.name());
            }
            Err(e) => {
                self.available = false;
                error!("{}: setup failed ({}), sensor disabled", self.probe.name(), e);
            }
        }
    }

    fn poll(&mut self) {
        if !self.available {
            return;
        }
        match self.probe.measure() {
            Ok(value) => self.last_reading = value,
            Err(e) => warn!(
                "{}: read failed ({}), keeping {:.2}",
                self.probe.name(),
                e,
                self.last_reading
            ),
        }
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn read(&mut self) -> f32 {
        self.last_reading
    }
}

/// One sensor per quantity the analyzer reports.
pub struct SensorBank {
    /// O2 cell voltage (mV).
    pub o2: Box<dyn Sensor>,
    /// He cell voltage (mV).
    pub he: Box<dyn Sensor>,
    /// Barometric pressure (mbar).
    pub pressure: Box<dyn Sensor>,
    /// Ambient temperature (°C).
    pub temperature: Box<dyn Sensor>,
}

impl SensorBank {
    pub fn new(
        o2: Box<dyn Sensor>,
        he: Box<dyn Sensor>,
        pressure: Box<dyn Sensor>,
        temperature: Box<dyn Sensor>,
    ) -> Self {
        Self {
            o2,
            he,
            pressure,
            temperature,
        }
    }

    /// Bank of [`RandomSensor`]s for running without any chips attached.
    pub fn simulated(config: &AnalyzerConfig) -> Self {
        let seed = config.sim_seed;
        Self::new(
            Box::new(RandomSensor::new("sim-o2", config.sim_o2_mv, seed)),
            Box::new(RandomSensor::new("sim-he", config.sim_he_mv, seed.wrapping_add(1))),
            Box::new(RandomSensor::new(
                "sim-pressure",
                config.sim_pressure_mbar,
                seed.wrapping_add(2),
            )),
            Box::new(RandomSensor::new(
                "sim-temperature",
                config.sim_temperature_c,
                seed.wrapping_add(3),
            )),
        )
    }

    fn each_mut(&mut self) -> [&mut dyn Sensor; 4] {
        [
            &mut *self.o2,
            &mut *self.he,
            &mut *self.pressure,
            &mut *self.temperature,
        ]
    }

    pub fn setup_all(&mut self) {
        for sensor in self.each_mut() {
            sensor.setup();
        }
    }

    pub fn poll_all(&mut self) {
        for sensor in self.each_mut() {
            sensor.poll();
        }
    }

    /// Names of sensors that failed to come up.
    pub fn unavailable(&self) -> impl Iterator<Item = &'static str> + '_ {
        [&self.o2, &self.he, &self.pressure, &self.temperature]
            .into_iter()
            .filter(|s| !s.is_available())
            .map(|s| s.name())
    }

    /// Current cached values (live draws for synthetic sensors).
    pub fn snapshot(&mut self) -> RawReadings {
        RawReadings {
            o2_mv: self.o2.read(),
            he_mv: self.he.read(),
            pressure_mbar: self.pressure.read(),
            temperature_c: self.temperature.read(),
        }
    }
}

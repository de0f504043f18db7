//! Ambient temperature from the BMP280, in degrees Celsius.
//!
//! Reads the temperature channel of the conversion the pressure sensor
//! triggers (see [`super::barometer`]).

use embedded_hal::i2c::I2c;

use super::barometer::{Channel, SharedBarometer};
use super::{PolledSensor, Probe};
use crate::error::SensorError;

pub struct TemperatureProbe<I> {
    barometer: SharedBarometer<I>,
}

impl<I: I2c> Probe for TemperatureProbe<I> {
    fn name(&self) -> &'static str {
        "bmp280-temperature"
    }

    fn begin(&mut self) -> Result<(), SensorError> {
        self.barometer.borrow_mut().begin()
    }

    fn measure(&mut self) -> Result<f32, SensorError> {
        Ok(self
            .barometer
            .borrow_mut()
            .measurement(Channel::Temperature)?
            .temperature_c)
    }
}

pub type TemperatureSensor<I> = PolledSensor<TemperatureProbe<I>>;

impl<I: I2c> TemperatureSensor<I> {
    pub fn from_barometer(barometer: SharedBarometer<I>) -> Self {
        PolledSensor::new(TemperatureProbe { barometer })
    }
}

//! Barometric pressure from the BMP280, in millibar.

use embedded_hal::i2c::I2c;

use super::barometer::{Channel, SharedBarometer};
use super::{PolledSensor, Probe};
use crate::error::SensorError;

const PA_PER_MBAR: f32 = 100.0;

pub struct PressureProbe<I> {
    barometer: SharedBarometer<I>,
}

impl<I: I2c> Probe for PressureProbe<I> {
    fn name(&self) -> &'static str {
        "bmp280-pressure"
    }

    fn begin(&mut self) -> Result<(), SensorError> {
        self.barometer.borrow_mut().begin()
    }

    fn measure(&mut self) -> Result<f32, SensorError> {
        let m = self.barometer.borrow_mut().measurement(Channel::Pressure)?;
        Ok(m.pressure_pa / PA_PER_MBAR)
    }
}

pub type PressureSensor<I> = PolledSensor<PressureProbe<I>>;

impl<I: I2c> PressureSensor<I> {
    pub fn from_barometer(barometer: SharedBarometer<I>) -> Self {
        PolledSensor::new(PressureProbe { barometer })
    }
}

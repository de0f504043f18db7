//! One BMP280 feeding both the pressure and the temperature sensor.
//!
//! Both quantities come out of the same forced conversion.  The chip is
//! brought up once however many sensors call `begin`, and each poll round
//! costs one conversion: a channel asking again for a measurement it has
//! already read starts the next one, the other channel reuses it.

use core::cell::RefCell;
use std::rc::Rc;

use embedded_hal::i2c::I2c;

use super::pressure::PressureSensor;
use super::temperature::TemperatureSensor;
use crate::drivers::bmp280::{Bmp280, Bmp280Measurement};
use crate::error::SensorError;

/// Handle each sensor on the chip holds.
pub type SharedBarometer<I> = Rc<RefCell<Barometer<I>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Pressure,
    Temperature,
}

impl Channel {
    const fn index(self) -> usize {
        match self {
            Self::Pressure => 0,
            Self::Temperature => 1,
        }
    }
}

pub struct Barometer<I> {
    chip: Bmp280<I>,
    setup: Option<Result<(), SensorError>>,
    latest: Option<Bmp280Measurement>,
    read_by: [bool; 2],
}

impl<I: I2c> Barometer<I> {
    pub fn new(chip: Bmp280<I>) -> Self {
        Self {
            chip,
            setup: None,
            latest: None,
            read_by: [false; 2],
        }
    }

    /// Bring the chip up on the first call; later calls repeat that result.
    pub fn begin(&mut self) -> Result<(), SensorError> {
        *self.setup.get_or_insert_with(|| self.chip.begin())
    }

    /// Measurement for `channel`, converting only when `channel` has
    /// already consumed the latest one.
    pub fn measurement(&mut self, channel: Channel) -> Result<Bmp280Measurement, SensorError> {
        let slot = channel.index();
        let m = match self.latest {
            Some(m) if !self.read_by[slot] => m,
            _ => {
                let m = self.chip.take_forced_measurement()?;
                self.latest = Some(m);
                self.read_by = [false; 2];
                m
            }
        };
        self.read_by[slot] = true;
        Ok(m)
    }
}

/// Pressure and temperature sensors sharing one BMP280 at `addr`.
pub fn bmp280<I: I2c>(i2c: I, addr: u8) -> (PressureSensor<I>, TemperatureSensor<I>) {
    let shared: SharedBarometer<I> = Rc::new(RefCell::new(Barometer::new(Bmp280::new(i2c, addr))));
    (
        PressureSensor::from_barometer(Rc::clone(&shared)),
        TemperatureSensor::from_barometer(shared),
    )
}

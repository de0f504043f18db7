//! Electrochemical gas cells read differentially through the ADS1115.
//!
//! | Cell   | ADC pair    | Unit |
//! |--------|-------------|------|
//! | O2     | AIN0 − AIN1 | mV   |
//! | He     | AIN2 − AIN3 | mV   |

use embedded_hal::i2c::I2c;

use super::{PolledSensor, Probe};
use crate::drivers::ads1115::{Ads1115, DiffPair};
use crate::error::SensorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasCell {
    Oxygen,
    Helium,
}

impl GasCell {
    pub const fn pair(self) -> DiffPair {
        match self {
            Self::Oxygen => DiffPair::Ain0Ain1,
            Self::Helium => DiffPair::Ain2Ain3,
        }
    }
}

pub struct GasCellProbe<I> {
    adc: Ads1115<I>,
    cell: GasCell,
}

impl<I: I2c> GasCellProbe<I> {
    pub fn new(adc: Ads1115<I>, cell: GasCell) -> Self {
        Self { adc, cell }
    }
}

impl<I: I2c> Probe for GasCellProbe<I> {
    fn name(&self) -> &'static str {
        match self.cell {
            GasCell::Oxygen => "ads1115-o2",
            GasCell::Helium => "ads1115-he",
        }
    }

    fn begin(&mut self) -> Result<(), SensorError> {
        self.adc.begin()
    }

    fn measure(&mut self) -> Result<f32, SensorError> {
        self.adc.read_differential_mv(self.cell.pair())
    }
}

pub type GasCellSensor<I> = PolledSensor<GasCellProbe<I>>;

impl<I: I2c> GasCellSensor<I> {
    pub fn ads1115(i2c: I, addr: u8, cell: GasCell) -> Self {
        PolledSensor::new(GasCellProbe::new(Ads1115::new(i2c, addr), cell))
    }
}

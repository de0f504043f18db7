//! TI ADS1115 16-bit delta-sigma ADC (I2C, blocking, single-shot).
//!
//! Only the two differential pairs are used: AIN0−AIN1 carries the O2
//! cell, AIN2−AIN3 the He cell.  The PGA is fixed at gain 2/3
//! (±6.144 V full scale, 0.1875 mV per LSB).

use embedded_hal::i2c::I2c;

use crate::error::SensorError;

pub const ADDR_DEFAULT: u8 = 0x48;

const REG_CONVERSION: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;

const OS_SINGLE: u16 = 0x8000;
const PGA_6_144V: u16 = 0x0000;
const MODE_SINGLE_SHOT: u16 = 0x0100;
const DR_128SPS: u16 = 0x0080;
const COMP_QUE_DISABLE: u16 = 0x0003;

/// Millivolts per LSB at gain 2/3.
pub const MV_PER_LSB_GAIN_TWO_THIRDS: f32 = 0.1875;

/// Config reads before a conversion is declared stuck.  At 128 SPS one
/// conversion takes ~8 ms, which is a few dozen I2C round trips.
const MAX_READY_POLLS: u32 = 1000;

/// Differential input pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffPair {
    /// AIN0 − AIN1
    Ain0Ain1,
    /// AIN2 − AIN3
    Ain2Ain3,
}

impl DiffPair {
    const fn mux_bits(self) -> u16 {
        match self {
            Self::Ain0Ain1 => 0x0000,
            Self::Ain2Ain3 => 0x3000,
        }
    }
}

pub struct Ads1115<I> {
    i2c: I,
    addr: u8,
}

impl<I: I2c> Ads1115<I> {
    pub fn new(i2c: I, addr: u8) -> Self {
        Self { i2c, addr }
    }

    /// Check that something answers at our address.
    pub fn begin(&mut self) -> Result<(), SensorError> {
        self.read_reg(REG_CONFIG)
            .map(|_| ())
            .map_err(|_| SensorError::NotFound)
    }

    /// Config word that starts one conversion on `pair`.
    pub const fn single_shot_config(pair: DiffPair) -> u16 {
        OS_SINGLE | pair.mux_bits() | PGA_6_144V | MODE_SINGLE_SHOT | DR_128SPS | COMP_QUE_DISABLE
    }

    /// Start one conversion on `pair` and return the signed raw count.
    pub fn read_differential(&mut self, pair: DiffPair) -> Result<i16, SensorError> {
        self.write_reg(REG_CONFIG, Self::single_shot_config(pair))?;

        let mut polls = 0;
        // OS reads back 0 while a conversion is in progress.
        while self.read_reg(REG_CONFIG)? & OS_SINGLE == 0 {
            polls += 1;
            if polls >= MAX_READY_POLLS {
                return Err(SensorError::ConversionTimeout);
            }
        }

        Ok(self.read_reg(REG_CONVERSION)? as i16)
    }

    /// [`read_differential`](Self::read_differential) scaled to millivolts.
    pub fn read_differential_mv(&mut self, pair: DiffPair) -> Result<f32, SensorError> {
        let counts = self.read_differential(pair)?;
        Ok(counts_to_mv(counts))
    }

    fn read_reg(&mut self, reg: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.addr, &[reg], &mut buf)
            .map_err(|_| SensorError::BusError)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn write_reg(&mut self, reg: u8, value: u16) -> Result<(), SensorError> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c
            .write(self.addr, &[reg, hi, lo])
            .map_err(|_| SensorError::BusError)
    }
}

pub fn counts_to_mv(counts: i16) -> f32 {
    f32::from(counts) * MV_PER_LSB_GAIN_TWO_THIRDS
}

//! Bosch BMP280 barometric pressure / temperature sensor (I2C, blocking).
//!
//! Only forced mode is used: every [`Bmp280::take_forced_measurement`]
//! starts one conversion, waits for the status register's `measuring` bit
//! to clear, then reads and compensates both channels.
//!
//! Compensation uses the datasheet's double-precision formulas (section
//! 8.1), which give pressure directly in pascals.

use embedded_hal::i2c::I2c;

use crate::error::SensorError;

pub const ADDR_PRIMARY: u8 = 0x76;
pub const ADDR_SECONDARY: u8 = 0x77;

const REG_CALIB_START: u8 = 0x88;
const CALIB_LEN: usize = 24;
const REG_CHIP_ID: u8 = 0xD0;
const REG_STATUS: u8 = 0xF3;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_CONFIG: u8 = 0xF5;
const REG_PRESS_MSB: u8 = 0xF7;

const CHIP_ID: u8 = 0x58;
const STATUS_MEASURING: u8 = 0x08;

// ctrl_meas: osrs_t ×2, osrs_p ×16, forced mode.
const OSRS_T_X2: u8 = 0b010;
const OSRS_P_X16: u8 = 0b101;
const MODE_FORCED: u8 = 0b01;
// config: standby 500 ms, IIR filter ×16.
const STANDBY_500_MS: u8 = 0b100;
const FILTER_X16: u8 = 0b100;

/// Status polls before a conversion is declared stuck.
const MAX_STATUS_POLLS: u32 = 1000;

/// Factory trimming parameters (NVM 0x88..0x9F).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bmp280Calibration {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
}

impl Bmp280Calibration {
    fn from_bytes(b: &[u8; CALIB_LEN]) -> Self {
        let u = |i: usize| u16::from_le_bytes([b[i], b[i + 1]]);
        let s = |i: usize| i16::from_le_bytes([b[i], b[i + 1]]);
        Self {
            dig_t1: u(0),
            dig_t2: s(2),
            dig_t3: s(4),
            dig_p1: u(6),
            dig_p2: s(8),
            dig_p3: s(10),
            dig_p4: s(12),
            dig_p5: s(14),
            dig_p6: s(16),
            dig_p7: s(18),
            dig_p8: s(20),
            dig_p9: s(22),
        }
    }

    /// Returns `(temperature °C, t_fine)`.
    pub fn compensate_temperature(&self, adc_t: i32) -> (f64, f64) {
        let adc_t = f64::from(adc_t);
        let t1 = f64::from(self.dig_t1);
        let var1 = (adc_t / 16_384.0 - t1 / 1024.0) * f64::from(self.dig_t2);
        let d = adc_t / 131_072.0 - t1 / 8192.0;
        let var2 = d * d * f64::from(self.dig_t3);
        let t_fine = var1 + var2;
        (t_fine / 5120.0, t_fine)
    }

    /// Pressure in pascals.  Returns 0.0 for an all-zero `dig_p1`.
    pub fn compensate_pressure(&self, adc_p: i32, t_fine: f64) -> f64 {
        let mut var1 = t_fine / 2.0 - 64_000.0;
        let mut var2 = var1 * var1 * f64::from(self.dig_p6) / 32_768.0;
        var2 += var1 * f64::from(self.dig_p5) * 2.0;
        var2 = var2 / 4.0 + f64::from(self.dig_p4) * 65_536.0;
        var1 = (f64::from(self.dig_p3) * var1 * var1 / 524_288.0 + f64::from(self.dig_p2) * var1)
            / 524_288.0;
        var1 = (1.0 + var1 / 32_768.0) * f64::from(self.dig_p1);
        if var1 == 0.0 {
            return 0.0;
        }
        let mut p = 1_048_576.0 - f64::from(adc_p);
        p = (p - var2 / 4096.0) * 6250.0 / var1;
        var1 = f64::from(self.dig_p9) * p * p / 2_147_483_648.0;
        var2 = p * f64::from(self.dig_p8) / 32_768.0;
        p + (var1 + var2 + f64::from(self.dig_p7)) / 16.0
    }
}

/// One compensated forced measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bmp280Measurement {
    pub temperature_c: f32,
    pub pressure_pa: f32,
}

pub struct Bmp280<I> {
    i2c: I,
    addr: u8,
    calib: Option<Bmp280Calibration>,
}

impl<I: I2c> Bmp280<I> {
    pub fn new(i2c: I, addr: u8) -> Self {
        Self {
            i2c,
            addr,
            calib: None,
        }
    }

    /// Probe the chip ID, load the trimming parameters and configure
    /// oversampling/filter for forced mode.
    pub fn begin(&mut self) -> Result<(), SensorError> {
        let id = self
            .read_reg(REG_CHIP_ID)
            .map_err(|_| SensorError::NotFound)?;
        if id != CHIP_ID {
            return Err(SensorError::NotFound);
        }

        let mut raw = [0u8; CALIB_LEN];
        self.read_regs(REG_CALIB_START, &mut raw)?;
        self.calib = Some(Bmp280Calibration::from_bytes(&raw));

        self.write_reg(REG_CONFIG, (STANDBY_500_MS << 5) | (FILTER_X16 << 2))?;
        self.write_reg(REG_CTRL_MEAS, Self::ctrl_meas())?;
        Ok(())
    }

    pub fn calibration(&self) -> Option<&Bmp280Calibration> {
        self.calib.as_ref()
    }

    /// Trigger one conversion and return both compensated channels.
    pub fn take_forced_measurement(&mut self) -> Result<Bmp280Measurement, SensorError> {
        let calib = self.calib.ok_or(SensorError::NotInitialised)?;

        self.write_reg(REG_CTRL_MEAS, Self::ctrl_meas())?;
        let mut polls = 0;
        while self.read_reg(REG_STATUS)? & STATUS_MEASURING != 0 {
            polls += 1;
            if polls >= MAX_STATUS_POLLS {
                return Err(SensorError::ConversionTimeout);
            }
        }

        let mut buf = [0u8; 6];
        self.read_regs(REG_PRESS_MSB, &mut buf)?;
        let adc_p = Self::raw20(buf[0], buf[1], buf[2]);
        let adc_t = Self::raw20(buf[3], buf[4], buf[5]);

        let (temperature_c, t_fine) = calib.compensate_temperature(adc_t);
        let pressure_pa = calib.compensate_pressure(adc_p, t_fine);
        Ok(Bmp280Measurement {
            temperature_c: temperature_c as f32,
            pressure_pa: pressure_pa as f32,
        })
    }

    const fn ctrl_meas() -> u8 {
        (OSRS_T_X2 << 5) | (OSRS_P_X16 << 2) | MODE_FORCED
    }

    fn raw20(msb: u8, lsb: u8, xlsb: u8) -> i32 {
        ((msb as i32) << 12) | ((lsb as i32) << 4) | ((xlsb as i32) >> 4)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, SensorError> {
        let mut b = [0u8; 1];
        self.read_regs(reg, &mut b)?;
        Ok(b[0])
    }

    fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), SensorError> {
        self.i2c
            .write_read(self.addr, &[reg], buf)
            .map_err(|_| SensorError::BusError)
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.addr, &[reg, value])
            .map_err(|_| SensorError::BusError)
    }
}

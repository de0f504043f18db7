//! GPIO / peripheral pin assignments for the analyzer board (ESP32 DevKit).
//!
//! Single source of truth: the binary wires every driver from this module
//! rather than hard-coding pin numbers.  Change a pin here and it
//! propagates everywhere.

// ---------------------------------------------------------------------------
// I²C bus (BMP280, ADS1115, SSD1306 share it)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
/// Bus clock.  All three chips support fast mode.
pub const I2C_BAUDRATE_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// I²C addresses
// ---------------------------------------------------------------------------

pub const BMP280_ADDR: u8 = crate::drivers::bmp280::ADDR_PRIMARY;
pub const ADS1115_ADDR: u8 = crate::drivers::ads1115::ADDR_DEFAULT;
pub const SSD1306_ADDR: u8 = crate::adapters::display::ADDR_DEFAULT;

// ---------------------------------------------------------------------------
// Feedback / input
// ---------------------------------------------------------------------------

/// Piezo buzzer, active HIGH.
pub const BUZZER_GPIO: i32 = 32;

/// Calibration push-button, active HIGH (external pull-down).
pub const BUTTON_GPIO: i32 = 33;

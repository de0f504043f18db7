//! Chip drivers and GPIO peripherals.

pub mod ads1115;
pub mod bmp280;
pub mod button;
pub mod buzzer;

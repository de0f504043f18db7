//! Piezo buzzer on a plain GPIO output.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::BuzzerPort;

pub struct Buzzer<P, D> {
    pin: P,
    delay: D,
    beep_ms: u32,
}

impl<P: OutputPin, D: DelayNs> Buzzer<P, D> {
    pub fn new(mut pin: P, delay: D, beep_ms: u32) -> Self {
        if pin.set_low().is_err() {
            warn!("buzzer: could not drive pin low");
        }
        Self {
            pin,
            delay,
            beep_ms,
        }
    }
}

impl<P: OutputPin, D: DelayNs> BuzzerPort for Buzzer<P, D> {
    fn beep(&mut self) {
        if self.pin.set_high().is_err() {
            warn!("buzzer: GPIO write failed");
            return;
        }
        self.delay.delay_ms(self.beep_ms);
        if self.pin.set_low().is_err() {
            warn!("buzzer: could not silence");
        }
    }
}

//! Debounced calibration push-button.
//!
//! ## Hardware
//!
//! Active-high momentary switch (pin reads HIGH while held).  The level is
//! sampled once per loop iteration; no interrupt is used.
//!
//! ## Edge detection
//!
//! | Raw level held for ≥ debounce | Stable state change  | Event     |
//! |-------------------------------|----------------------|-----------|
//! | pressed                       | released → pressed   | `Pressed` |
//! | released                      | pressed → released   | none      |
//!
//! A second `Pressed` needs a debounced release in between, so holding
//! the button down triggers exactly one calibration.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::ports::ButtonPort;

/// Button events emitted after debouncing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Pressed,
}

/// Internal debounce state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Stable { pressed: bool },
    Settling { pressed: bool, since_ms: u32 },
}

pub struct DebouncedButton {
    debounce_ms: u32,
    state: DebounceState,
}

impl DebouncedButton {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms,
            state: DebounceState::Stable { pressed: false },
        }
    }

    /// Feed one raw sample taken at `now_ms`.
    pub fn tick(&mut self, now_ms: u32, raw_pressed: bool) -> Option<ButtonEvent> {
        match self.state {
            DebounceState::Stable { pressed } => {
                if raw_pressed == pressed {
                    return None;
                }
                if self.debounce_ms == 0 {
                    return self.settle(raw_pressed);
                }
                self.state = DebounceState::Settling {
                    pressed: raw_pressed,
                    since_ms: now_ms,
                };
                None
            }

            DebounceState::Settling { pressed, since_ms } => {
                if raw_pressed != pressed {
                    // Bounced back before settling.
                    self.state = DebounceState::Stable { pressed: raw_pressed };
                    return None;
                }
                if now_ms.wrapping_sub(since_ms) >= self.debounce_ms {
                    return self.settle(pressed);
                }
                None
            }
        }
    }

    pub fn is_pressed(&self) -> bool {
        matches!(self.state, DebounceState::Stable { pressed: true })
    }

    fn settle(&mut self, pressed: bool) -> Option<ButtonEvent> {
        self.state = DebounceState::Stable { pressed };
        pressed.then_some(ButtonEvent::Pressed)
    }
}

/// [`ButtonPort`] over a GPIO input.
pub struct GpioButton<P> {
    pin: P,
}

impl<P: InputPin> GpioButton<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: InputPin> ButtonPort for GpioButton<P> {
    fn is_pressed(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(level) => level,
            Err(_) => {
                warn!("button: GPIO read failed");
                false
            }
        }
    }
}

//! SSD1306 OLED display adapter (128×64, I2C).
//!
//! Implements [`DisplayPort`].  If the panel does not answer during
//! [`OledDisplay::new`] the adapter stays unavailable and every call is a
//! no-op; the analyzer keeps running without a screen.

use core::fmt::Write;

use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_10X20};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use log::{error, warn};
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::{I2CDisplayInterface, Ssd1306};

use crate::app::ports::DisplayPort;

pub const ADDR_DEFAULT: u8 = 0x3C;

/// Concrete driver type, generic over the HAL's I2C.
pub type Panel<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

pub type Line = heapless::String<24>;

/// Header and big-figure lines of the gas view.
pub fn gas_lines(o2_mv: f32, percentage_o2: Option<f32>) -> (Line, Line) {
    let mut header = Line::new();
    let _ = write!(header, "O2 {:.2}mV", o2_mv);

    let mut figure = Line::new();
    match percentage_o2 {
        Some(pct) => {
            let _ = write!(figure, "{:.1}%", pct);
        }
        None => {
            let _ = figure.push_str("--%");
        }
    }
    (header, figure)
}

fn style(font: &'static MonoFont<'static>) -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(font)
        .text_color(BinaryColor::On)
        .build()
}

pub struct OledDisplay<I2C> {
    panel: Option<Panel<I2C>>,
}

impl<I2C> OledDisplay<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Initialise the panel and clear it.
    pub fn new(i2c: I2C, addr: u8) -> Self {
        let interface = I2CDisplayInterface::new_custom_address(i2c, addr);
        let mut panel = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        if panel.init().is_err() {
            error!("display: initialisation failed, running headless");
            return Self { panel: None };
        }
        panel.clear_buffer();
        let _ = panel.flush();
        Self { panel: Some(panel) }
    }

    pub fn is_available(&self) -> bool {
        self.panel.is_some()
    }

    /// Clear, draw `lines` (text, top-left, font), flush.
    fn render(&mut self, lines: &[(&str, Point, &'static MonoFont<'static>)]) {
        let Some(panel) = self.panel.as_mut() else {
            return;
        };
        panel.clear_buffer();
        for (text, at, font) in lines {
            let _ = Text::with_baseline(text, *at, style(*font), Baseline::Top).draw(panel);
        }
        if panel.flush().is_err() {
            warn!("display: flush failed");
        }
    }
}

impl<I2C> DisplayPort for OledDisplay<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn show_calibrating(&mut self) {
        self.render(&[("Calibrating...", Point::new(0, 10), &FONT_6X10)]);
    }

    fn show_message(&mut self, text: &str) {
        self.render(&[(text, Point::new(0, 10), &FONT_10X20)]);
    }

    fn show_gas_information(&mut self, o2_mv: f32, percentage_o2: Option<f32>) {
        let (header, figure) = gas_lines(o2_mv, percentage_o2);
        self.render(&[
            (header.as_str(), Point::new(0, 5), &FONT_10X20),
            (figure.as_str(), Point::new(0, 34), &FONT_10X20),
        ]);
    }
}

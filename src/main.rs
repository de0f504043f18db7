//! Anemoi Analyzer Firmware — Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  OledDisplay   Buzzer   BleTelemetry   GpioButton              │
//! │  (Display)     (Buzzer) (Telemetry)    (Button)                │
//! │  LogEventSink  MonotonicClock   SensorBank (BMP280 · ADS1115)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │           AnalyzerService (pure logic)                 │    │
//! │  │  Calibration · Gas model · Telemetry session           │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use core::cell::RefCell;

use anyhow::Result;
use embedded_hal::delay::DelayNs;
use embedded_hal_bus::i2c::RefCellDevice;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use log::info;

use anemoi::adapters::ble::BleTelemetry;
use anemoi::adapters::display::OledDisplay;
use anemoi::adapters::hardware::AnalyzerBoard;
use anemoi::adapters::log_sink::LogEventSink;
use anemoi::adapters::time::MonotonicClock;
use anemoi::app::service::AnalyzerService;
use anemoi::config::AnalyzerConfig;
use anemoi::drivers::button::GpioButton;
use anemoi::drivers::buzzer::Buzzer;
use anemoi::events::LINK_EVENTS;
use anemoi::pins;
use anemoi::sensors::SensorBank;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Anemoi Analyzer v{}                 ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = AnalyzerConfig::default();
    config.validate().map_err(anemoi::error::Error::from)?;

    // ── 3. Shared I²C bus ─────────────────────────────────────
    let peripherals = Peripherals::take()?;
    // SAFETY: pin numbers come from `pins` and are used exactly once.
    let (sda, scl) = unsafe {
        (
            AnyIOPin::new(pins::I2C_SDA_GPIO),
            AnyIOPin::new(pins::I2C_SCL_GPIO),
        )
    };
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        sda,
        scl,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_BAUDRATE_HZ)),
    )?;
    // Lives for the rest of the program; every sensor holds a device on it.
    let bus: &'static RefCell<I2cDriver<'static>> = Box::leak(Box::new(RefCell::new(i2c)));

    // ── 4. Sensors ────────────────────────────────────────────
    #[cfg(feature = "dummy-board")]
    let sensors = {
        info!("dummy-board: using synthetic sensors");
        SensorBank::simulated(&config)
    };

    #[cfg(not(feature = "dummy-board"))]
    let sensors = {
        use anemoi::sensors::barometer;
        use anemoi::sensors::gas_cell::{GasCell, GasCellSensor};

        let (pressure, temperature) =
            barometer::bmp280(RefCellDevice::new(bus), pins::BMP280_ADDR);
        SensorBank::new(
            Box::new(GasCellSensor::ads1115(
                RefCellDevice::new(bus),
                pins::ADS1115_ADDR,
                GasCell::Oxygen,
            )),
            Box::new(GasCellSensor::ads1115(
                RefCellDevice::new(bus),
                pins::ADS1115_ADDR,
                GasCell::Helium,
            )),
            Box::new(pressure),
            Box::new(temperature),
        )
    };

    // ── 5. Board adapters ─────────────────────────────────────
    let display = OledDisplay::new(RefCellDevice::new(bus), pins::SSD1306_ADDR);

    // SAFETY: as above.
    let buzzer_pin = PinDriver::output(unsafe { AnyOutputPin::new(pins::BUZZER_GPIO) })?;
    let buzzer = Buzzer::new(buzzer_pin, FreeRtos, config.beep_ms);

    let mut button_pin = PinDriver::input(unsafe { AnyIOPin::new(pins::BUTTON_GPIO) })?;
    button_pin.set_pull(Pull::Down)?;
    let button = GpioButton::new(button_pin);

    let mut ble = BleTelemetry::new(config.device_name.clone(), &LINK_EVENTS);
    ble.start();

    let mut board = AnalyzerBoard::new(display, buzzer, ble, button);

    // ── 6. Application service ────────────────────────────────
    let loop_interval_ms = config.loop_interval_ms;
    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();
    let mut delay = FreeRtos;

    let mut app = AnalyzerService::new(config, sensors);
    app.start(&mut board, &mut sink);

    info!("System ready. Entering main loop.");

    // ── 7. Main loop ──────────────────────────────────────────
    loop {
        app.tick(&mut board, &mut delay, &LINK_EVENTS, clock.uptime_ms(), &mut sink);

        // At least one tick, so the idle task (and its watchdog) runs.
        delay.delay_ms(loop_interval_ms.max(1));
    }
}

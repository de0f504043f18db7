//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements         | Connects to                 |
//! |-------------|--------------------|-----------------------------|
//! | `ble`       | TelemetryPort      | Bluedroid GATT server       |
//! | `display`   | DisplayPort        | SSD1306 OLED over I2C       |
//! | `hardware`  | all output ports   | the adapters above, bundled |
//! | `log_sink`  | EventSink          | Serial log output           |
//! | `time`      | —                  | ESP32 system timer          |
//!
//! The buzzer and button adapters live with their drivers in
//! [`crate::drivers`].

pub mod ble;
pub mod display;
pub mod hardware;
pub mod log_sink;
pub mod time;

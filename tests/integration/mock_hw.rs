//! Mock hardware adapters for integration tests.
//!
//! Records every display/buzzer/transport call so tests can assert on the
//! full output history, and models the BMP280 and ADS1115 register files
//! closely enough for the real drivers to run against them.

use std::cell::Cell;
use std::rc::Rc;

use anemoi::app::events::AppEvent;
use anemoi::app::ports::{ButtonPort, BuzzerPort, DisplayPort, EventSink, TelemetryPort};
use anemoi::error::TransportError;
use anemoi::sensors::Sensor;
use anemoi::telemetry::TelemetryChannel;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

// ── Output call record ────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum BoardCall {
    Calibrating,
    Message(String),
    GasInfo { o2_mv: f32, percentage_o2: Option<f32> },
    Beep,
    Notify { channel: TelemetryChannel, payload: String },
    RestartAdvertising,
}

// ── MockBoard ─────────────────────────────────────────────────

pub struct MockBoard {
    pub calls: Vec<BoardCall>,
    /// Raw button level per `is_pressed()` call; `false` once exhausted.
    pub button_levels: Vec<bool>,
    pub reject_notify: bool,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            button_levels: Vec::new(),
            reject_notify: false,
        }
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    pub fn beeps(&self) -> usize {
        self.calls.iter().filter(|c| **c == BoardCall::Beep).count()
    }

    pub fn notifications(&self) -> Vec<(TelemetryChannel, String)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BoardCall::Notify { channel, payload } => Some((*channel, payload.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn last_gas_info(&self) -> Option<(f32, Option<f32>)> {
        self.calls.iter().rev().find_map(|c| match c {
            BoardCall::GasInfo {
                o2_mv,
                percentage_o2,
            } => Some((*o2_mv, *percentage_o2)),
            _ => None,
        })
    }

    pub fn messages(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BoardCall::Message(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayPort for MockBoard {
    fn show_calibrating(&mut self) {
        self.calls.push(BoardCall::Calibrating);
    }

    fn show_message(&mut self, text: &str) {
        self.calls.push(BoardCall::Message(text.to_owned()));
    }

    fn show_gas_information(&mut self, o2_mv: f32, percentage_o2: Option<f32>) {
        self.calls.push(BoardCall::GasInfo {
            o2_mv,
            percentage_o2,
        });
    }
}

impl BuzzerPort for MockBoard {
    fn beep(&mut self) {
        self.calls.push(BoardCall::Beep);
    }
}

impl TelemetryPort for MockBoard {
    fn notify(
        &mut self,
        channel: TelemetryChannel,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        if self.reject_notify {
            return Err(TransportError::NotConnected);
        }
        self.calls.push(BoardCall::Notify {
            channel,
            payload: String::from_utf8_lossy(payload).into_owned(),
        });
        Ok(())
    }

    fn restart_advertising(&mut self) {
        self.calls.push(BoardCall::RestartAdvertising);
    }
}

impl ButtonPort for MockBoard {
    fn is_pressed(&mut self) -> bool {
        if self.button_levels.is_empty() {
            false
        } else {
            self.button_levels.remove(0)
        }
    }
}

// ── MockDelay ─────────────────────────────────────────────────

/// Records every requested delay instead of sleeping.
#[derive(Default)]
pub struct MockDelay {
    pub delays_ms: Vec<u32>,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_ms.push(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ms.push(ms);
    }
}

// ── FakeSensor ────────────────────────────────────────────────

/// Sensor whose value is driven from the test through a shared handle.
pub struct FakeSensor {
    name: &'static str,
    value: Rc<Cell<f32>>,
    fail_setup: bool,
    available: bool,
}

#[allow(dead_code)]
impl FakeSensor {
    pub fn new(name: &'static str, initial: f32) -> (Self, Rc<Cell<f32>>) {
        let value = Rc::new(Cell::new(initial));
        (
            Self {
                name,
                value: Rc::clone(&value),
                fail_setup: false,
                available: false,
            },
            value,
        )
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            value: Rc::new(Cell::new(0.0)),
            fail_setup: true,
            available: false,
        }
    }
}

impl Sensor for FakeSensor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn setup(&mut self) {
        self.available = !self.fail_setup;
    }

    fn poll(&mut self) {}

    fn is_available(&self) -> bool {
        self.available
    }

    fn read(&mut self) -> f32 {
        if self.available { self.value.get() } else { 0.0 }
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Register-model I2C mocks ──────────────────────────────────

/// 8-bit register file with an auto-incrementing pointer (BMP280-style).
pub struct RegisterFile8 {
    pub addr: u8,
    pub regs: [u8; 256],
    pub writes: Vec<(u8, u8)>,
}

impl RegisterFile8 {
    pub fn new(addr: u8) -> Self {
        Self {
            addr,
            regs: [0; 256],
            writes: Vec::new(),
        }
    }
}

impl ErrorType for RegisterFile8 {
    type Error = ErrorKind;
}

impl I2c for RegisterFile8 {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.addr {
            return Err(ErrorKind::NoAcknowledge(
                embedded_hal::i2c::NoAcknowledgeSource::Address,
            ));
        }
        let mut pointer = 0usize;
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if let Some((&reg, data)) = bytes.split_first() {
                        pointer = reg as usize;
                        for (i, &b) in data.iter().enumerate() {
                            let r = (pointer + i) & 0xFF;
                            self.regs[r] = b;
                            self.writes.push((r as u8, b));
                        }
                    }
                }
                Operation::Read(buf) => {
                    for b in buf.iter_mut() {
                        *b = self.regs[pointer & 0xFF];
                        pointer += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

/// 16-bit big-endian register file (ADS1115-style).  Conversions finish
/// instantly: the OS bit always reads back set.
pub struct Ads1115Model {
    pub addr: u8,
    pub config: u16,
    /// Raw result per differential pair, indexed by MUX bits >> 12.
    pub results: [i16; 8],
    pub config_writes: Vec<u16>,
}

impl Ads1115Model {
    pub fn new(addr: u8) -> Self {
        Self {
            addr,
            config: 0x8583,
            results: [0; 8],
            config_writes: Vec::new(),
        }
    }
}

impl ErrorType for Ads1115Model {
    type Error = ErrorKind;
}

impl I2c for Ads1115Model {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.addr {
            return Err(ErrorKind::NoAcknowledge(
                embedded_hal::i2c::NoAcknowledgeSource::Address,
            ));
        }
        let mut pointer = 0u8;
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    pointer = bytes.first().copied().unwrap_or(0);
                    if bytes.len() == 3 && pointer == 0x01 {
                        self.config = u16::from_be_bytes([bytes[1], bytes[2]]);
                        self.config_writes.push(self.config);
                    }
                }
                Operation::Read(buf) => {
                    let value = match pointer {
                        0x00 => {
                            let mux = ((self.config >> 12) & 0x7) as usize;
                            self.results[mux] as u16
                        }
                        _ => self.config | 0x8000,
                    };
                    let be = value.to_be_bytes();
                    for (i, b) in buf.iter_mut().enumerate() {
                        *b = be.get(i).copied().unwrap_or(0);
                    }
                }
            }
        }
        Ok(())
    }
}

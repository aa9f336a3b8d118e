//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for every hardware trait, enabling the
//! control core to be exercised on a desktop.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockMotor`] | [`MotorDriver`] | Records actuation values |
//! | [`MockUart`] | [`UartHardware`] | Injected receive bytes, captured transmit bytes |
//! | [`MockTimer`] | [`CaptureTimer`] | Settable counter |
//! | [`MockPin`] | [`InputPin`] | Shared, settable quadrature level |
//! | [`MockDisplay`] | [`ReadoutDisplay`] | Captures rendered lines |
//!
//! # Example
//!
//! ```rust
//! use rig_control::hal::{MockTimer, MockUart};
//! use rig_control::traits::{CaptureTimer, UartHardware};
//!
//! let timer = MockTimer::new();
//! timer.set(1234);
//! assert_eq!(timer.count(), 1234);
//! timer.reset();
//! assert_eq!(timer.count(), 0);
//!
//! let uart = MockUart::new();
//! uart.write(b'x');
//! assert_eq!(uart.written(), vec![b'x']);
//! ```
//!
//! [`MotorDriver`]: crate::traits::MotorDriver
//! [`UartHardware`]: crate::traits::UartHardware
//! [`CaptureTimer`]: crate::traits::CaptureTimer
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`ReadoutDisplay`]: crate::traits::ReadoutDisplay

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use crate::traits::{CaptureTimer, MotorDriver, ReadoutDisplay, UartHardware};
use crate::transport::RxErrors;

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock motor driver for testing.
///
/// Records every actuation value for verification.
///
/// # Example
///
/// ```rust
/// use rig_control::hal::MockMotor;
/// use rig_control::traits::MotorDriver;
///
/// let mut motor = MockMotor::new();
/// motor.set_output(500).unwrap();
/// motor.set_output(-20).unwrap();
///
/// assert_eq!(motor.output, -20);
/// assert_eq!(motor.history, vec![500, -20]);
/// ```
#[derive(Debug, Default)]
pub struct MockMotor {
    /// Last applied actuation.
    pub output: i16,
    /// Every actuation applied, oldest first.
    pub history: Vec<i16>,
}

impl MockMotor {
    /// Creates a new mock motor at zero output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `set_output` was called.
    pub fn call_count(&self) -> usize {
        self.history.len()
    }
}

impl MotorDriver for MockMotor {
    type Error = ();

    fn set_output(&mut self, output: i16) -> Result<(), ()> {
        self.output = output;
        self.history.push(output);
        Ok(())
    }
}

/// Mock serial port.
///
/// Bytes queued with [`inject`](Self::inject) are returned one per
/// [`UartHardware::read`] call, which is what the receive interrupt does.
/// Bytes written by the transmit interrupt are captured for inspection.
#[derive(Debug, Default)]
pub struct MockUart {
    incoming: RefCell<VecDeque<(u8, RxErrors)>>,
    written: RefCell<Vec<u8>>,
    tx_interrupt: Cell<bool>,
    divisor: Cell<Option<u16>>,
}

impl MockUart {
    /// Creates a mock port with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a clean byte for the next receive interrupt.
    pub fn inject(&self, byte: u8) {
        self.inject_with_errors(byte, RxErrors::empty());
    }

    /// Queue a byte that arrives with line errors.
    pub fn inject_with_errors(&self, byte: u8, errors: RxErrors) {
        self.incoming.borrow_mut().push_back((byte, errors));
    }

    /// Bytes still waiting to be "received".
    pub fn pending(&self) -> usize {
        self.incoming.borrow().len()
    }

    /// Everything written so far.
    pub fn written(&self) -> Vec<u8> {
        self.written.borrow().clone()
    }

    /// Everything written so far, as text.
    pub fn written_str(&self) -> String {
        String::from_utf8_lossy(&self.written.borrow()).into_owned()
    }

    /// Forget captured output.
    pub fn clear_written(&self) {
        self.written.borrow_mut().clear();
    }

    /// Whether the transmit-ready interrupt is enabled.
    pub fn tx_interrupt_enabled(&self) -> bool {
        self.tx_interrupt.get()
    }

    /// Divisor from the last `configure` call.
    pub fn divisor(&self) -> Option<u16> {
        self.divisor.get()
    }
}

impl UartHardware for MockUart {
    fn configure(&self, divisor: u16) {
        self.divisor.set(Some(divisor));
    }

    fn read(&self) -> (u8, RxErrors) {
        self.incoming
            .borrow_mut()
            .pop_front()
            .unwrap_or((0, RxErrors::OVERRUN))
    }

    fn write(&self, byte: u8) {
        self.written.borrow_mut().push(byte);
    }

    fn set_tx_interrupt(&self, enabled: bool) {
        self.tx_interrupt.set(enabled);
    }
}

/// Mock capture timer with a settable counter.
#[derive(Debug, Default)]
pub struct MockTimer {
    count: Cell<u16>,
    resets: Cell<usize>,
}

impl MockTimer {
    /// Creates a timer at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the counter, as if that many ticks had elapsed since reset.
    pub fn set(&self, count: u16) {
        self.count.set(count);
    }

    /// Number of `reset` calls.
    pub fn resets(&self) -> usize {
        self.resets.get()
    }
}

impl CaptureTimer for MockTimer {
    fn count(&self) -> u16 {
        self.count.get()
    }

    fn reset(&self) {
        self.count.set(0);
        self.resets.set(self.resets.get() + 1);
    }
}

/// Mock digital input.
///
/// Clones share the same level, so a test can keep one handle and move
/// another into the code under test.
///
/// ```rust
/// use embedded_hal::digital::InputPin;
/// use rig_control::hal::MockPin;
///
/// let handle = MockPin::new(false);
/// let mut pin = handle.clone();
/// assert!(pin.is_low().unwrap());
///
/// handle.set_high(true);
/// assert!(pin.is_high().unwrap());
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockPin {
    level: Rc<Cell<bool>>,
}

impl MockPin {
    /// Creates a pin at the given level.
    pub fn new(high: bool) -> Self {
        Self {
            level: Rc::new(Cell::new(high)),
        }
    }

    /// Drive the simulated level.
    pub fn set_high(&self, high: bool) {
        self.level.set(high);
    }
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl embedded_hal::digital::InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.level.get())
    }
}

// ============================================================================
// Display Mocks
// ============================================================================

/// Mock character display.
///
/// ```
/// use rig_control::hal::MockDisplay;
/// use rig_control::traits::ReadoutDisplay;
///
/// let mut display = MockDisplay::new();
/// display.init().unwrap();
/// display.write_line(1, "hello").unwrap();
/// assert_eq!(display.lines[1], "hello");
/// ```
#[derive(Debug, Default)]
pub struct MockDisplay {
    /// Text currently on each row.
    pub lines: [String; 2],
    /// Number of `write_line` calls.
    pub write_count: usize,
    /// Whether init() was called.
    pub initialized: bool,
}

impl MockDisplay {
    /// Creates a new mock display.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadoutDisplay for MockDisplay {
    type Error = ();

    fn init(&mut self) -> Result<(), ()> {
        self.initialized = true;
        Ok(())
    }

    fn write_line(&mut self, row: u8, text: &str) -> Result<(), ()> {
        let slot = self.lines.get_mut(usize::from(row)).ok_or(())?;
        *slot = text.into();
        self.write_count += 1;
        Ok(())
    }
}

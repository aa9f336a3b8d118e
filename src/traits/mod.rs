//! Trait definitions for hardware abstraction.
//!
//! This module defines the core abstractions that keep the control kernel
//! hardware-agnostic:
//! - Motor drivers, serial ports and capture timers (`hardware`)
//! - Interrupt callbacks a platform wires to its vector table (`hardware`)
//! - The character readout display (`display`)
//!
//! # Hardware Abstraction
//!
//! The key hardware traits are:
//!
//! - [`MotorDriver`]: signed actuation output
//! - [`UartHardware`]: serial port registers
//! - [`CaptureTimer`]: encoder edge timing
//! - [`InterruptHandlers`]: `on_timer_tick`, `on_edge`, `on_byte_received`, `on_transmit_ready`

pub mod display;
pub mod hardware;

pub use display::*;
pub use hardware::*;

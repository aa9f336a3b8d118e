//! Hardware abstraction traits for motor drivers, serial ports and capture timers.
//!
//! These are the seams between the control core and a particular
//! microcontroller. A platform layer implements them over real registers and
//! wires its interrupt vectors to an [`InterruptHandlers`] implementation; the
//! host test suite implements them with the doubles in [`crate::hal::mock`].
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`MotorDriver`] | Signed actuation output to one motor |
//! | [`UartHardware`] | Status/data/control registers of one serial port |
//! | [`CaptureTimer`] | Free-running timer snapshotted at each encoder edge |
//! | [`InterruptHandlers`] | Callbacks a platform binds to its interrupt vectors |
//!
//! The quadrature companion pin is read through
//! [`embedded_hal::digital::InputPin`] rather than a trait of our own.
//!
//! # Example
//!
//! ```rust
//! use rig_control::traits::MotorDriver;
//! use rig_control::hal::MockMotor;
//!
//! let mut motor = MockMotor::new();
//! motor.set_output(-300).unwrap();
//! assert_eq!(motor.output, -300);
//!
//! motor.stop().unwrap();
//! assert_eq!(motor.output, 0);
//! ```

use crate::transport::RxErrors;

/// Identifies one of the two regulated axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisId {
    /// First regulated axis.
    A,
    /// Second regulated axis.
    B,
}

/// Identifies one of the two serial channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelId {
    /// Inbound command link.
    Command,
    /// Outbound telemetry and debug link.
    Telemetry,
}

/// Motor driver trait - applies a signed actuation value.
///
/// Positive values drive forward, negative values drive in reverse, zero
/// removes drive. The caller has already clamped the value to the axis'
/// configured output range.
pub trait MotorDriver {
    /// Error type for driver operations.
    type Error;

    /// Apply an actuation value.
    fn set_output(&mut self, output: i16) -> Result<(), Self::Error>;

    /// Convenience method to remove drive.
    fn stop(&mut self) -> Result<(), Self::Error> {
        self.set_output(0)
    }
}

/// Register-level access to one serial port.
///
/// All methods take `&self`: the receive path runs in the receive interrupt,
/// the transmit path in the transmit-ready interrupt, and the main loop only
/// toggles the transmit interrupt enable. Implementations over memory-mapped
/// registers get this for free; each method must be a single register access
/// or a read-modify-write the platform guarantees is atomic.
pub trait UartHardware {
    /// Apply a baud divisor from [`SerialConfig::divisor`], 8N1 framing and
    /// enable the receiver, transmitter and receive-complete interrupt.
    ///
    /// [`SerialConfig::divisor`]: crate::config::SerialConfig::divisor
    fn configure(&self, divisor: u16);

    /// Read the status and data registers for the byte that just arrived.
    ///
    /// Returns the data byte and the hardware error bits (framing, overrun)
    /// that were latched with it.
    fn read(&self) -> (u8, RxErrors);

    /// Write one byte to the data register, starting its transmission.
    fn write(&self, byte: u8);

    /// Enable or disable the "data register empty" interrupt.
    fn set_tx_interrupt(&self, enabled: bool);
}

/// Free-running timer captured at every encoder edge.
///
/// The timer counts at [`EstimatorConfig::timer_hz`] and raises its overflow
/// interrupt every 2^16 ticks.
///
/// [`EstimatorConfig::timer_hz`]: crate::config::EstimatorConfig::timer_hz
pub trait CaptureTimer {
    /// Current counter value.
    fn count(&self) -> u16;

    /// Restart counting from zero.
    fn reset(&self);
}

/// Interrupt callbacks for the control core.
///
/// A platform layer calls these from its vector table. Each handler runs to
/// completion, never blocks, and touches only the slice of shared state it
/// owns (tick counters, speed captures, the interrupt half of each serial
/// link).
pub trait InterruptHandlers {
    /// Fixed-period regulator timer fired.
    fn on_timer_tick(&mut self);

    /// Encoder edge on an axis.
    fn on_edge(&mut self, axis: AxisId);

    /// Capture timer of an axis overflowed.
    fn on_capture_overflow(&mut self, axis: AxisId);

    /// A byte arrived on a serial channel.
    fn on_byte_received(&mut self, channel: ChannelId);

    /// A serial channel is ready to accept the next byte.
    fn on_transmit_ready(&mut self, channel: ChannelId);
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // MotorDriver Default Methods Tests
    // =========================================================================

    struct TestMotor {
        output: i16,
        calls: usize,
    }

    impl MotorDriver for TestMotor {
        type Error = ();

        fn set_output(&mut self, output: i16) -> Result<(), ()> {
            self.output = output;
            self.calls += 1;
            Ok(())
        }
    }

    #[test]
    fn motor_driver_stop_default_impl() {
        let mut motor = TestMotor { output: 0, calls: 0 };
        motor.set_output(900).unwrap();
        motor.stop().unwrap();

        assert_eq!(motor.output, 0);
        assert_eq!(motor.calls, 2);
    }

    struct FailingMotor;

    impl MotorDriver for FailingMotor {
        type Error = &'static str;

        fn set_output(&mut self, _output: i16) -> Result<(), Self::Error> {
            Err("driver fault")
        }
    }

    #[test]
    fn motor_driver_stop_propagates_error() {
        assert_eq!(FailingMotor.stop(), Err("driver fault"));
    }

    // =========================================================================
    // Identifiers
    // =========================================================================

    #[test]
    fn ids_are_distinct() {
        assert_ne!(AxisId::A, AxisId::B);
        assert_ne!(ChannelId::Command, ChannelId::Telemetry);
    }
}

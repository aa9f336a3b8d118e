//! Interrupt-side state and the [`InterruptHandlers`] binding.
//!
//! Each interrupt handler touches only the narrow slice of state it owns:
//! the tick counters, the speed captures and the interrupt halves of the
//! serial links. The regulator, the motor drivers and the rig itself are
//! never reachable from here.
//!
//! A platform layer builds one [`RigIsr`] at startup, moves it somewhere
//! its vectors can reach, and forwards each vector to the matching
//! callback.
//!
//! # Example
//!
//! ```rust
//! use rig_control::control::TickCounter;
//! use rig_control::hal::{MockPin, MockTimer, MockUart};
//! use rig_control::isr::{AxisIsr, RigIsr};
//! use rig_control::speed::SpeedCapture;
//! use rig_control::traits::{AxisId, InterruptHandlers};
//! use rig_control::transport::SerialLink;
//!
//! let capture = SpeedCapture::new(true);
//! let ticks = TickCounter::new();
//! let timer = MockTimer::new();
//! let (cmd_uart, tlm_uart) = (MockUart::new(), MockUart::new());
//! let mut cmd_link: SerialLink<16, 16> = SerialLink::new();
//! let mut tlm_link: SerialLink<16, 16> = SerialLink::new();
//! let (_cmd_port, cmd_isr) = cmd_link.split(&cmd_uart);
//! let (_tlm_port, tlm_isr) = tlm_link.split(&tlm_uart);
//!
//! let mut isr = RigIsr::new(
//!     AxisIsr::new(&capture, &ticks, &timer, MockPin::new(true)),
//!     AxisIsr::new(&capture, &ticks, &timer, MockPin::new(true)),
//!     cmd_isr,
//!     tlm_isr,
//! );
//!
//! isr.on_timer_tick();
//! assert_eq!(ticks.get(), 2);
//!
//! timer.set(10_000);
//! isr.on_edge(AxisId::A);
//! assert_eq!(capture.position(), 1);
//! ```

use embedded_hal::digital::InputPin;

use crate::control::TickCounter;
use crate::speed::SpeedCapture;
use crate::traits::{AxisId, CaptureTimer, ChannelId, InterruptHandlers, UartHardware};
use crate::transport::SerialIsr;

/// Interrupt-owned state of one axis.
pub struct AxisIsr<'a, T: CaptureTimer, P: InputPin> {
    capture: &'a SpeedCapture,
    ticks: &'a TickCounter,
    timer: &'a T,
    quadrature: P,
}

impl<'a, T: CaptureTimer, P: InputPin> AxisIsr<'a, T, P> {
    /// Bundle an axis' capture, tick counter, capture timer and quadrature
    /// pin.
    pub fn new(
        capture: &'a SpeedCapture,
        ticks: &'a TickCounter,
        timer: &'a T,
        quadrature: P,
    ) -> Self {
        Self {
            capture,
            ticks,
            timer,
            quadrature,
        }
    }

    /// Regulator time base.
    #[inline]
    pub fn tick(&self) {
        self.ticks.tick();
    }

    /// Encoder edge.
    #[inline]
    pub fn edge(&mut self) {
        self.capture.capture_edge(self.timer, &mut self.quadrature);
    }

    /// Capture timer overflow.
    #[inline]
    pub fn overflow(&self) {
        self.capture.on_overflow();
    }
}

/// Everything the rig's interrupts touch.
pub struct RigIsr<'a, TA, PA, TB, PB, C, U, const RX: usize, const TX: usize>
where
    TA: CaptureTimer,
    PA: InputPin,
    TB: CaptureTimer,
    PB: InputPin,
    C: UartHardware,
    U: UartHardware,
{
    axis_a: AxisIsr<'a, TA, PA>,
    axis_b: AxisIsr<'a, TB, PB>,
    command: SerialIsr<'a, C, RX, TX>,
    telemetry: SerialIsr<'a, U, RX, TX>,
}

impl<'a, TA, PA, TB, PB, C, U, const RX: usize, const TX: usize>
    RigIsr<'a, TA, PA, TB, PB, C, U, RX, TX>
where
    TA: CaptureTimer,
    PA: InputPin,
    TB: CaptureTimer,
    PB: InputPin,
    C: UartHardware,
    U: UartHardware,
{
    /// Bundle both axes and both serial interrupt halves.
    pub fn new(
        axis_a: AxisIsr<'a, TA, PA>,
        axis_b: AxisIsr<'a, TB, PB>,
        command: SerialIsr<'a, C, RX, TX>,
        telemetry: SerialIsr<'a, U, RX, TX>,
    ) -> Self {
        Self {
            axis_a,
            axis_b,
            command,
            telemetry,
        }
    }
}

impl<TA, PA, TB, PB, C, U, const RX: usize, const TX: usize> InterruptHandlers
    for RigIsr<'_, TA, PA, TB, PB, C, U, RX, TX>
where
    TA: CaptureTimer,
    PA: InputPin,
    TB: CaptureTimer,
    PB: InputPin,
    C: UartHardware,
    U: UartHardware,
{
    fn on_timer_tick(&mut self) {
        self.axis_a.tick();
        self.axis_b.tick();
    }

    fn on_edge(&mut self, axis: AxisId) {
        match axis {
            AxisId::A => self.axis_a.edge(),
            AxisId::B => self.axis_b.edge(),
        }
    }

    fn on_capture_overflow(&mut self, axis: AxisId) {
        match axis {
            AxisId::A => self.axis_a.overflow(),
            AxisId::B => self.axis_b.overflow(),
        }
    }

    fn on_byte_received(&mut self, channel: ChannelId) {
        match channel {
            ChannelId::Command => self.command.on_receive(),
            ChannelId::Telemetry => self.telemetry.on_receive(),
        }
    }

    fn on_transmit_ready(&mut self, channel: ChannelId) {
        match channel {
            ChannelId::Command => self.command.on_transmit_ready(),
            ChannelId::Telemetry => self.telemetry.on_transmit_ready(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockPin, MockTimer, MockUart};
    use crate::speed::EstimatorState;
    use crate::transport::SerialLink;

    #[test]
    fn axes_are_routed_independently() {
        let (cap_a, cap_b) = (SpeedCapture::new(true), SpeedCapture::new(true));
        let (ticks_a, ticks_b) = (TickCounter::new(), TickCounter::new());
        let (timer_a, timer_b) = (MockTimer::new(), MockTimer::new());
        let pin_b = MockPin::new(false);
        let (cmd_uart, tlm_uart) = (MockUart::new(), MockUart::new());
        let mut cmd_link: SerialLink<8, 8> = SerialLink::new();
        let mut tlm_link: SerialLink<8, 8> = SerialLink::new();
        let (_cmd_port, cmd_isr) = cmd_link.split(&cmd_uart);
        let (_tlm_port, tlm_isr) = tlm_link.split(&tlm_uart);

        let mut isr = RigIsr::new(
            AxisIsr::new(&cap_a, &ticks_a, &timer_a, MockPin::new(true)),
            AxisIsr::new(&cap_b, &ticks_b, &timer_b, pin_b.clone()),
            cmd_isr,
            tlm_isr,
        );

        timer_b.set(5_000);
        isr.on_edge(AxisId::B);
        assert_eq!(cap_b.peek().raw_count, 5_000);
        assert_eq!(cap_b.position(), -1);
        assert_eq!(timer_b.resets(), 1);
        assert_eq!(timer_a.resets(), 0);
        assert_eq!(cap_a.state(), EstimatorState::Stopped);

        isr.on_capture_overflow(AxisId::A);
        assert!(cap_a.peek().is_stalled);
        assert!(!cap_b.peek().is_stalled);

        isr.on_timer_tick();
        isr.on_timer_tick();
        assert_eq!(ticks_a.get(), 2);
        assert_eq!(ticks_b.get(), 2);
    }

    #[test]
    fn serial_vectors_reach_their_channel() {
        let capture = SpeedCapture::new(true);
        let ticks = TickCounter::new();
        let timer = MockTimer::new();
        let (cmd_uart, tlm_uart) = (MockUart::new(), MockUart::new());
        let mut cmd_link: SerialLink<8, 8> = SerialLink::new();
        let mut tlm_link: SerialLink<8, 8> = SerialLink::new();
        let (mut cmd_port, cmd_isr) = cmd_link.split(&cmd_uart);
        let (mut tlm_port, tlm_isr) = tlm_link.split(&tlm_uart);

        let mut isr = RigIsr::new(
            AxisIsr::new(&capture, &ticks, &timer, MockPin::new(true)),
            AxisIsr::new(&capture, &ticks, &timer, MockPin::new(true)),
            cmd_isr,
            tlm_isr,
        );

        cmd_uart.inject(0x05);
        isr.on_byte_received(ChannelId::Command);
        assert_eq!(cmd_port.receive().map(|r| r.byte), Some(0x05));
        assert_eq!(tlm_port.available(), 0);

        tlm_port.send(b'2');
        isr.on_transmit_ready(ChannelId::Telemetry);
        isr.on_transmit_ready(ChannelId::Telemetry);
        assert_eq!(tlm_uart.written(), vec![b'2']);
        assert!(!tlm_uart.tx_interrupt_enabled());
        assert!(cmd_uart.written().is_empty());
    }
}

//! Main-loop coordinator for the two-axis rig.
//!
//! This module provides [`Rig`], which owns the main-loop side of
//! everything: both serial ports, both axes and a view of the shared
//! command/status byte.
//!
//! # Overview
//!
//! Each call to [`Rig::poll`] is one control cycle:
//! 1. Drain the command channel into the status byte (bytes with line
//!    errors are discarded)
//! 2. Take the pending command, if any, and act on it: start, stop,
//!    setpoint nudges, data request
//! 3. While running: watch the telemetry channel for the stop character,
//!    step both axes, send a `'2'` telemetry line
//! 4. While idle: hold both motors stopped, send a `'1'` line only on a
//!    data request
//!
//! `poll` never blocks except when the telemetry transmit ring is full.
//!
//! # Example
//!
//! ```rust
//! use rig_control::config::RigConfig;
//! use rig_control::control::{Axis, TickCounter};
//! use rig_control::hal::{MockMotor, MockUart};
//! use rig_control::protocol::{Flag, SharedStatusByte, StatusByte};
//! use rig_control::rig::Rig;
//! use rig_control::speed::SpeedCapture;
//! use rig_control::traits::AxisId;
//! use rig_control::transport::SerialLink;
//!
//! static CAPTURE_A: SpeedCapture = SpeedCapture::new(true);
//! static CAPTURE_B: SpeedCapture = SpeedCapture::new(false);
//! static TICKS_A: TickCounter = TickCounter::new();
//! static TICKS_B: TickCounter = TickCounter::new();
//! static STATUS: SharedStatusByte = SharedStatusByte::new();
//!
//! let config = RigConfig::default();
//! let (cmd_uart, tlm_uart) = (MockUart::new(), MockUart::new());
//! let mut cmd_link: SerialLink<16, 64> = SerialLink::new();
//! let mut tlm_link: SerialLink<16, 64> = SerialLink::new();
//! let (cmd_port, mut cmd_isr) = cmd_link.split(&cmd_uart);
//! let (tlm_port, _tlm_isr) = tlm_link.split(&tlm_uart);
//!
//! let axis_a = Axis::new(AxisId::A, &config.axis_a, &CAPTURE_A, &TICKS_A, MockMotor::new());
//! let axis_b = Axis::new(AxisId::B, &config.axis_b, &CAPTURE_B, &TICKS_B, MockMotor::new());
//! let mut rig = Rig::new(&config, cmd_port, tlm_port, axis_a, axis_b, &STATUS);
//! rig.start_up().unwrap();
//!
//! // Host sends "start"
//! cmd_uart.inject(StatusByte::encode([Flag::Start]).raw());
//! cmd_isr.on_receive();
//!
//! let frame = rig.poll().unwrap().unwrap();
//! assert!(rig.is_running());
//! assert_eq!(frame.axes[0].actuation, 1400);
//! ```

use core::fmt;

use crate::config::{RigConfig, SerialConfig};
use crate::control::Axis;
use crate::display::Readout;
use crate::error::ConfigError;
use crate::protocol::{
    AxisReport, CommandFlags, Flag, SharedStatusByte, StatusByte, TelemetryFrame,
};
use crate::traits::{MotorDriver, UartHardware};
use crate::transport::{RxErrors, SerialPort};

/// Greeting sent on the telemetry channel by [`Rig::start_up`].
pub const BANNER: &str = "rig-control ready\n\r";

/// Byte on the telemetry channel that stops a running rig.
pub const STOP_CHAR: u8 = b'.';

/// Error from the rig: bad configuration or a failing motor driver.
#[derive(Debug, PartialEq)]
pub enum RigError<EA, EB> {
    /// Configuration was rejected during start-up.
    Config(ConfigError),
    /// Axis A's driver failed.
    AxisA(EA),
    /// Axis B's driver failed.
    AxisB(EB),
}

impl<EA, EB> From<ConfigError> for RigError<EA, EB> {
    fn from(err: ConfigError) -> Self {
        RigError::Config(err)
    }
}

impl<EA: fmt::Debug, EB: fmt::Debug> fmt::Display for RigError<EA, EB> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RigError::Config(err) => write!(f, "invalid configuration: {}", err),
            RigError::AxisA(err) => write!(f, "axis A driver error: {:?}", err),
            RigError::AxisB(err) => write!(f, "axis B driver error: {:?}", err),
        }
    }
}

#[cfg(feature = "std")]
impl<EA: fmt::Debug, EB: fmt::Debug> std::error::Error for RigError<EA, EB> {}

/// Snapshot of the rig for a UI or a log line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RigState {
    /// Whether the rig is running.
    pub running: bool,
    /// Axis A then axis B.
    pub axes: [AxisReport; 2],
    /// Running position of each axis.
    pub positions: [i32; 2],
    /// Raw command/status byte.
    pub status: u8,
}

/// The rig's main-loop state.
///
/// # Type Parameters
///
/// - `C`, `T`: serial hardware of the command and telemetry channels
/// - `MA`, `MB`: motor drivers of axes A and B
/// - `RX`, `TX`: ring capacities shared by both channels
pub struct Rig<'a, C, T, MA, MB, const RX: usize, const TX: usize>
where
    C: UartHardware,
    T: UartHardware,
    MA: MotorDriver,
    MB: MotorDriver,
{
    command: SerialPort<'a, C, RX, TX>,
    telemetry: SerialPort<'a, T, RX, TX>,
    axis_a: Axis<'a, MA>,
    axis_b: Axis<'a, MB>,
    status: &'a SharedStatusByte,

    command_config: SerialConfig,
    telemetry_config: SerialConfig,
    validation: Result<(), ConfigError>,
    setpoint_step: i32,
    mirror_b: bool,

    running: bool,
    last_command: u8,
}

impl<'a, C, T, MA, MB, const RX: usize, const TX: usize> Rig<'a, C, T, MA, MB, RX, TX>
where
    C: UartHardware,
    T: UartHardware,
    MA: MotorDriver,
    MB: MotorDriver,
{
    /// Assemble the rig. Nothing is touched until [`start_up`](Self::start_up).
    pub fn new(
        config: &RigConfig,
        command: SerialPort<'a, C, RX, TX>,
        telemetry: SerialPort<'a, T, RX, TX>,
        axis_a: Axis<'a, MA>,
        axis_b: Axis<'a, MB>,
        status: &'a SharedStatusByte,
    ) -> Self {
        Self {
            command,
            telemetry,
            axis_a,
            axis_b,
            status,
            command_config: config.command,
            telemetry_config: config.telemetry,
            validation: config.validate(),
            setpoint_step: config.setpoint_step,
            mirror_b: config.mirror_b_from_a,
            running: false,
            last_command: 0,
        }
    }

    /// Bring up both channels, stop both motors and send the banner.
    ///
    /// Interrupts may be enabled once this returns.
    pub fn start_up(&mut self) -> Result<(), RigError<MA::Error, MB::Error>> {
        self.validation?;
        self.command.init(&self.command_config)?;
        self.telemetry.init(&self.telemetry_config)?;
        self.stop_axes()?;
        self.running = false;
        self.telemetry.send_str(BANNER);
        log::info!("rig up, idle");
        Ok(())
    }

    /// Run one control cycle.
    ///
    /// Returns the telemetry frame sent this cycle, if any.
    pub fn poll(&mut self) -> Result<Option<TelemetryFrame>, RigError<MA::Error, MB::Error>> {
        self.read_commands();

        let data_request = match self.status.take() {
            Some(command) => self.apply(command),
            None => false,
        };

        if self.running && self.stop_requested() {
            log::info!("stop character received, going idle");
            self.running = false;
            self.status.post(Flag::Stop);
        }

        if self.running {
            let actuation = self.axis_a.step().map_err(RigError::AxisA)?;
            if self.mirror_b {
                self.axis_b.drive(actuation).map_err(RigError::AxisB)?;
            } else {
                self.axis_b.step().map_err(RigError::AxisB)?;
            }
            Ok(Some(self.send_frame()))
        } else {
            self.stop_axes()?;
            Ok(data_request.then(|| self.send_frame()))
        }
    }

    /// Whether the rig is running.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Axis A.
    pub fn axis_a(&self) -> &Axis<'a, MA> {
        &self.axis_a
    }

    /// Axis A, for gain or setpoint changes.
    pub fn axis_a_mut(&mut self) -> &mut Axis<'a, MA> {
        &mut self.axis_a
    }

    /// Axis B.
    pub fn axis_b(&self) -> &Axis<'a, MB> {
        &self.axis_b
    }

    /// Axis B, for gain or setpoint changes.
    pub fn axis_b_mut(&mut self) -> &mut Axis<'a, MB> {
        &mut self.axis_b
    }

    /// The telemetry port, for extra debug output.
    pub fn telemetry_mut(&mut self) -> &mut SerialPort<'a, T, RX, TX> {
        &mut self.telemetry
    }

    /// Values for the character readout.
    pub fn readout(&self) -> Readout {
        Readout {
            setpoint: self.axis_a.pid().setpoint(),
            speed: self.axis_a.speed(),
            position: self.axis_a.position(),
            status: self.status.load().raw(),
            output: self.axis_b.actuation(),
            command: self.last_command,
            running: self.running,
        }
    }

    /// Snapshot of the whole rig.
    pub fn state(&self) -> RigState {
        RigState {
            running: self.running,
            axes: [self.axis_a.report(), self.axis_b.report()],
            positions: [self.axis_a.position(), self.axis_b.position()],
            status: self.status.load().raw(),
        }
    }

    fn read_commands(&mut self) {
        while let Some(received) = self.command.receive() {
            if received.errors.contains(RxErrors::BUFFER_OVERFLOW) {
                log::warn!("command channel overflow, bytes dropped");
            }
            if received.errors.is_line_error() {
                log::warn!(
                    "discarding command byte {:#04x} ({:?})",
                    received.byte,
                    received.errors
                );
                continue;
            }
            self.last_command = received.byte;
            self.status.merge(StatusByte::new(received.byte));
        }
    }

    /// Act on a command. Returns whether telemetry was requested.
    fn apply(&mut self, command: CommandFlags) -> bool {
        if command.contains(CommandFlags::STOP) {
            if self.running {
                log::info!("stop");
                self.running = false;
            }
        } else if command.contains(CommandFlags::START) && !self.running {
            log::info!("start");
            self.running = true;
            // A stop character typed while idle is not meant for this run
            self.telemetry.flush();
            self.axis_a.restart();
            self.axis_b.restart();
        }

        let step = self.setpoint_step;
        if command.contains(CommandFlags::INCREASE_A) {
            self.axis_a.pid_mut().increase_setpoint(step);
            log::debug!("axis A setpoint {}", self.axis_a.pid().setpoint());
        }
        if command.contains(CommandFlags::DECREASE_A) {
            self.axis_a.pid_mut().decrease_setpoint(step);
            log::debug!("axis A setpoint {}", self.axis_a.pid().setpoint());
        }
        if command.contains(CommandFlags::INCREASE_B) {
            self.axis_b.pid_mut().increase_setpoint(step);
            log::debug!("axis B setpoint {}", self.axis_b.pid().setpoint());
        }
        if command.contains(CommandFlags::DECREASE_B) {
            self.axis_b.pid_mut().decrease_setpoint(step);
            log::debug!("axis B setpoint {}", self.axis_b.pid().setpoint());
        }

        command.contains(CommandFlags::DATA_REQUEST)
    }

    fn stop_requested(&mut self) -> bool {
        let mut stop = false;
        while let Some(received) = self.telemetry.receive() {
            if !received.errors.is_line_error() && received.byte == STOP_CHAR {
                stop = true;
            }
        }
        stop
    }

    fn stop_axes(&mut self) -> Result<(), RigError<MA::Error, MB::Error>> {
        self.axis_a.stop().map_err(RigError::AxisA)?;
        self.axis_b.stop().map_err(RigError::AxisB)
    }

    fn send_frame(&mut self) -> TelemetryFrame {
        let frame = TelemetryFrame::new(self.running, self.axis_a.report(), self.axis_b.report());
        self.telemetry.send_str(&frame.to_line());
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AxisConfig;
    use crate::control::TickCounter;
    use crate::hal::{MockMotor, MockUart};
    use crate::protocol::TAG_IDLE;
    use crate::speed::SpeedCapture;
    use crate::traits::AxisId;
    use crate::transport::{SerialIsr, SerialLink};

    type Isr<'a> = SerialIsr<'a, MockUart, 16, 256>;

    struct Bench {
        cmd_uart: MockUart,
        tlm_uart: MockUart,
        captures: [SpeedCapture; 2],
        ticks: [TickCounter; 2],
        status: SharedStatusByte,
    }

    impl Bench {
        fn new() -> Self {
            Self {
                cmd_uart: MockUart::new(),
                tlm_uart: MockUart::new(),
                captures: [SpeedCapture::new(true), SpeedCapture::new(true)],
                ticks: [TickCounter::new(), TickCounter::new()],
                status: SharedStatusByte::new(),
            }
        }
    }

    fn send(uart: &MockUart, isr: &mut Isr<'_>, byte: u8) {
        uart.inject(byte);
        isr.on_receive();
    }

    fn drain(isr: &mut Isr<'_>) {
        for _ in 0..256 {
            isr.on_transmit_ready();
        }
    }

    macro_rules! rig {
        ($bench:ident, $config:expr, $rig:ident, $cmd:ident, $tlm:ident) => {
            let config = $config;
            let mut cmd_link: SerialLink<16, 256> = SerialLink::new();
            let mut tlm_link: SerialLink<16, 256> = SerialLink::new();
            #[allow(unused_mut, unused_variables)]
            let (cmd_port, mut $cmd) = cmd_link.split(&$bench.cmd_uart);
            let (tlm_port, mut $tlm) = tlm_link.split(&$bench.tlm_uart);
            let axis_a = Axis::new(
                AxisId::A,
                &config.axis_a,
                &$bench.captures[0],
                &$bench.ticks[0],
                MockMotor::new(),
            );
            let axis_b = Axis::new(
                AxisId::B,
                &config.axis_b,
                &$bench.captures[1],
                &$bench.ticks[1],
                MockMotor::new(),
            );
            let mut $rig =
                Rig::new(&config, cmd_port, tlm_port, axis_a, axis_b, &$bench.status);
            $rig.start_up().unwrap();
            drain(&mut $tlm);
            $bench.tlm_uart.clear_written();
        };
    }

    fn byte(flags: &[Flag]) -> u8 {
        StatusByte::encode(flags.iter().copied()).raw()
    }

    // =========================================================================
    // Start-up
    // =========================================================================

    #[test]
    fn start_up_sends_banner_and_stops_motors() {
        let bench = Bench::new();
        let config = RigConfig::default();
        let mut cmd_link: SerialLink<16, 256> = SerialLink::new();
        let mut tlm_link: SerialLink<16, 256> = SerialLink::new();
        let (cmd_port, _cmd) = cmd_link.split(&bench.cmd_uart);
        let (tlm_port, mut tlm) = tlm_link.split(&bench.tlm_uart);
        let axis_a = Axis::new(
            AxisId::A,
            &config.axis_a,
            &bench.captures[0],
            &bench.ticks[0],
            MockMotor::new(),
        );
        let axis_b = Axis::new(
            AxisId::B,
            &config.axis_b,
            &bench.captures[1],
            &bench.ticks[1],
            MockMotor::new(),
        );
        let mut rig = Rig::new(&config, cmd_port, tlm_port, axis_a, axis_b, &bench.status);

        rig.start_up().unwrap();
        drain(&mut tlm);

        assert_eq!(bench.tlm_uart.written_str(), BANNER);
        assert_eq!(bench.cmd_uart.divisor(), Some(16));
        assert_eq!(rig.axis_a().motor().history, vec![0]);
        assert!(!rig.is_running());
    }

    #[test]
    fn start_up_rejects_invalid_config() {
        let bench = Bench::new();
        let config = RigConfig::default()
            .with_axis_b(AxisConfig::default().with_output_limits(5, 5));
        let mut cmd_link: SerialLink<16, 256> = SerialLink::new();
        let mut tlm_link: SerialLink<16, 256> = SerialLink::new();
        let (cmd_port, _cmd) = cmd_link.split(&bench.cmd_uart);
        let (tlm_port, _tlm) = tlm_link.split(&bench.tlm_uart);
        let axis_a = Axis::new(
            AxisId::A,
            &config.axis_a,
            &bench.captures[0],
            &bench.ticks[0],
            MockMotor::new(),
        );
        let axis_b = Axis::new(
            AxisId::B,
            &config.axis_b,
            &bench.captures[1],
            &bench.ticks[1],
            MockMotor::new(),
        );
        let mut rig = Rig::new(&config, cmd_port, tlm_port, axis_a, axis_b, &bench.status);

        assert_eq!(
            rig.start_up(),
            Err(RigError::Config(ConfigError::InvalidOutputRange { min: 5, max: 5 }))
        );
        assert_eq!(bench.cmd_uart.divisor(), None);
    }

    // =========================================================================
    // Idle
    // =========================================================================

    #[test]
    fn idle_is_silent_without_data_request() {
        let bench = Bench::new();
        rig!(bench, RigConfig::default(), rig, cmd, tlm);

        assert_eq!(rig.poll().unwrap(), None);
        drain(&mut tlm);
        assert_eq!(bench.tlm_uart.written_str(), "");
    }

    #[test]
    fn idle_data_request_sends_tag_one() {
        let bench = Bench::new();
        rig!(bench, RigConfig::default(), rig, cmd, tlm);

        send(&bench.cmd_uart, &mut cmd, byte(&[Flag::DataRequest]));
        let frame = rig.poll().unwrap().unwrap();
        assert_eq!(frame.tag, TAG_IDLE);

        drain(&mut tlm);
        assert_eq!(bench.tlm_uart.written_str(), "1 0 1500 0 0 1500 0\n\r");

        // One-shot: the next cycle is silent again
        assert_eq!(rig.poll().unwrap(), None);
    }

    #[test]
    fn stale_byte_is_ignored() {
        let bench = Bench::new();
        rig!(bench, RigConfig::default(), rig, cmd, tlm);

        // START without the validity bit
        send(&bench.cmd_uart, &mut cmd, CommandFlags::START.bits());
        assert_eq!(rig.poll().unwrap(), None);
        assert!(!rig.is_running());
    }

    // =========================================================================
    // Running
    // =========================================================================

    #[test]
    fn start_runs_both_axes_and_streams_telemetry() {
        let bench = Bench::new();
        rig!(bench, RigConfig::default(), rig, cmd, tlm);

        send(&bench.cmd_uart, &mut cmd, byte(&[Flag::Start]));
        let first = rig.poll().unwrap().unwrap();
        assert!(rig.is_running());
        assert_eq!(first.axes[0].actuation, 1400);
        assert_eq!(first.axes[1].actuation, 1400);

        // Telemetry every cycle while running, no further command needed
        assert!(rig.poll().unwrap().is_some());
        drain(&mut tlm);
        assert_eq!(
            bench.tlm_uart.written_str(),
            "2 0 1500 1400 0 1500 1400\n\r2 0 1500 1400 0 1500 1400\n\r"
        );
    }

    #[test]
    fn stop_command_goes_idle_and_stops_motors() {
        let bench = Bench::new();
        rig!(bench, RigConfig::default(), rig, cmd, tlm);

        send(&bench.cmd_uart, &mut cmd, byte(&[Flag::Start]));
        rig.poll().unwrap();
        send(&bench.cmd_uart, &mut cmd, byte(&[Flag::Stop]));
        assert_eq!(rig.poll().unwrap(), None);

        assert!(!rig.is_running());
        assert_eq!(rig.axis_a().motor().output, 0);
        assert_eq!(rig.axis_b().motor().output, 0);
    }

    #[test]
    fn stop_character_on_telemetry_channel() {
        let bench = Bench::new();
        rig!(bench, RigConfig::default(), rig, cmd, tlm);

        send(&bench.cmd_uart, &mut cmd, byte(&[Flag::Start]));
        rig.poll().unwrap();

        bench.tlm_uart.inject(STOP_CHAR);
        tlm.on_receive();
        assert_eq!(rig.poll().unwrap(), None);
        assert!(!rig.is_running());
        assert!(rig.state().status & CommandFlags::STOP.bits() != 0);

        // A later nudge does not restart the rig
        send(&bench.cmd_uart, &mut cmd, byte(&[Flag::IncreaseA]));
        rig.poll().unwrap();
        assert!(!rig.is_running());
    }

    #[test]
    fn stop_character_after_console_overflow() {
        let bench = Bench::new();
        rig!(bench, RigConfig::default(), rig, cmd, tlm);

        // Console floods the telemetry channel while idle
        for _ in 0..20 {
            bench.tlm_uart.inject(b'x');
            tlm.on_receive();
        }
        send(&bench.cmd_uart, &mut cmd, byte(&[Flag::Start]));
        rig.poll().unwrap();
        assert!(rig.is_running());

        bench.tlm_uart.inject(STOP_CHAR);
        tlm.on_receive();
        assert_eq!(rig.poll().unwrap(), None);
        assert!(!rig.is_running());
    }

    #[test]
    fn stop_character_flagged_with_overflow_still_stops() {
        let bench = Bench::new();
        rig!(bench, RigConfig::default(), rig, cmd, tlm);

        send(&bench.cmd_uart, &mut cmd, byte(&[Flag::Start]));
        rig.poll().unwrap();

        // Ring holds 15; the rest are dropped and the '.' at the head
        // carries the overflow
        bench.tlm_uart.inject(STOP_CHAR);
        tlm.on_receive();
        for _ in 0..20 {
            bench.tlm_uart.inject(b'x');
            tlm.on_receive();
        }
        rig.poll().unwrap();
        assert!(!rig.is_running());
    }

    #[test]
    fn stop_character_with_framing_error_is_ignored() {
        let bench = Bench::new();
        rig!(bench, RigConfig::default(), rig, cmd, tlm);

        send(&bench.cmd_uart, &mut cmd, byte(&[Flag::Start]));
        rig.poll().unwrap();

        bench.tlm_uart.inject_with_errors(STOP_CHAR, RxErrors::FRAME);
        tlm.on_receive();
        rig.poll().unwrap();
        assert!(rig.is_running());
    }

    #[test]
    fn restart_does_not_resend_stale_telemetry() {
        let bench = Bench::new();
        rig!(bench, RigConfig::default(), rig, cmd, tlm);

        send(&bench.cmd_uart, &mut cmd, byte(&[Flag::Start]));
        rig.poll().unwrap();
        rig.poll().unwrap();
        // Nothing drained: two lines still queued
        rig.start_up().unwrap();
        drain(&mut tlm);
        assert_eq!(bench.tlm_uart.written_str(), BANNER);
    }

    #[test]
    fn stop_character_typed_while_idle_is_discarded_on_start() {
        let bench = Bench::new();
        rig!(bench, RigConfig::default(), rig, cmd, tlm);

        bench.tlm_uart.inject(STOP_CHAR);
        tlm.on_receive();
        send(&bench.cmd_uart, &mut cmd, byte(&[Flag::Start]));
        rig.poll().unwrap();
        rig.poll().unwrap();
        assert!(rig.is_running());
    }

    #[test]
    fn nudges_move_setpoints_by_step() {
        let bench = Bench::new();
        rig!(bench, RigConfig::default().with_setpoint_step(25), rig, cmd, tlm);

        send(&bench.cmd_uart, &mut cmd, byte(&[Flag::IncreaseA, Flag::DecreaseB]));
        rig.poll().unwrap();
        assert_eq!(rig.axis_a().pid().setpoint(), 1525);
        assert_eq!(rig.axis_b().pid().setpoint(), 1475);
    }

    #[test]
    fn framing_error_byte_is_discarded() {
        let bench = Bench::new();
        rig!(bench, RigConfig::default(), rig, cmd, tlm);

        bench
            .cmd_uart
            .inject_with_errors(byte(&[Flag::Start]), RxErrors::FRAME);
        cmd.on_receive();
        rig.poll().unwrap();
        assert!(!rig.is_running());
        assert_eq!(rig.readout().command, 0);
    }

    #[test]
    fn mirror_drives_b_with_a() {
        let bench = Bench::new();
        let config = RigConfig::default()
            .with_mirror_b_from_a(true)
            .with_axis_b(AxisConfig::default().with_output_limits(-500, 500));
        rig!(bench, config, rig, cmd, tlm);

        send(&bench.cmd_uart, &mut cmd, byte(&[Flag::Start]));
        let frame = rig.poll().unwrap().unwrap();
        assert_eq!(frame.axes[0].actuation, 1400);
        assert_eq!(frame.axes[1].actuation, 500);
        assert_eq!(rig.axis_b().pid().last_output(), 0.0);
    }

    #[test]
    fn readout_reflects_state() {
        let bench = Bench::new();
        rig!(bench, RigConfig::default(), rig, cmd, tlm);

        bench.captures[0].on_edge(10_000, true);
        send(&bench.cmd_uart, &mut cmd, byte(&[Flag::Start]));
        rig.poll().unwrap();

        let readout = rig.readout();
        assert!(readout.running);
        assert_eq!(readout.setpoint, 1500);
        assert_eq!(readout.speed, 1500);
        assert_eq!(readout.position, 1);
        assert_eq!(readout.command, byte(&[Flag::Start]));
    }
}

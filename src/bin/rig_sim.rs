//! Host simulation of the two-axis rig.
//!
//! Runs the real control core against mock hardware: two first-order motor
//! models generate encoder edges and capture-timer overflows, a scripted
//! host sends command bytes, and telemetry is decoded from the mock UART.
//!
//! # Usage
//!
//! ```bash
//! cargo run --features sim --bin rig_sim -- [cycles] [--mirror]
//! RUST_LOG=debug cargo run --features sim --bin rig_sim
//! ```

use anyhow::{bail, Context};
use rig_control::config::RigConfig;
use rig_control::control::{Axis, TickCounter};
use rig_control::hal::{MockDisplay, MockMotor, MockPin, MockTimer, MockUart};
use rig_control::isr::{AxisIsr, RigIsr};
use rig_control::protocol::{Flag, SharedStatusByte, StatusByte};
use rig_control::rig::{Rig, STOP_CHAR};
use rig_control::speed::{SpeedCapture, CAPTURE_PERIOD_TICKS};
use rig_control::traits::{AxisId, CaptureTimer, ChannelId, InterruptHandlers, ReadoutDisplay};
use rig_control::transport::SerialLink;

/// Capture timer ticks per control cycle (4 ms at 250 kHz).
const CYCLE_TICKS: u32 = 1_000;

/// Steady-state RPM per actuation count.
const RPM_PER_COUNT: f32 = 1.6;

/// First-order lag of the motor model, per cycle.
const MOTOR_ALPHA: f32 = 0.02;

/// Log every Nth telemetry line.
const LOG_EVERY: u32 = 100;

const DEFAULT_CYCLES: u32 = 3_000;

/// Motor and encoder model for one axis.
struct SimMotor {
    axis: AxisId,
    rpm: f32,
    phase: f32,
    timer_hz: f32,
    quadrature: MockPin,
}

impl SimMotor {
    fn new(axis: AxisId, timer_hz: u32) -> Self {
        Self {
            axis,
            rpm: 0.0,
            phase: 0.0,
            timer_hz: timer_hz as f32,
            quadrature: MockPin::new(true),
        }
    }

    /// Advance one control cycle, firing edge and overflow interrupts.
    fn advance<I: InterruptHandlers>(&mut self, actuation: i16, timer: &MockTimer, isr: &mut I) {
        let target = f32::from(actuation) * RPM_PER_COUNT;
        self.rpm += (target - self.rpm) * MOTOR_ALPHA;
        self.quadrature.set_high(self.rpm >= 0.0);

        let revs_per_tick = self.rpm.abs() / 60.0 / self.timer_hz;
        let mut remaining = CYCLE_TICKS as f32;
        while remaining > 0.0 {
            let to_edge = if revs_per_tick > 0.0 {
                (1.0 - self.phase) / revs_per_tick
            } else {
                f32::INFINITY
            };
            if to_edge <= remaining {
                self.run_timer(to_edge as u32, timer, isr);
                isr.on_edge(self.axis);
                self.phase = 0.0;
                remaining -= to_edge;
            } else {
                self.run_timer(remaining as u32, timer, isr);
                self.phase += remaining * revs_per_tick;
                remaining = 0.0;
            }
        }
    }

    fn run_timer<I: InterruptHandlers>(&self, ticks: u32, timer: &MockTimer, isr: &mut I) {
        let mut count = u32::from(timer.count()) + ticks;
        while count >= CAPTURE_PERIOD_TICKS {
            count -= CAPTURE_PERIOD_TICKS;
            timer.set(0);
            isr.on_capture_overflow(self.axis);
        }
        timer.set(count as u16);
    }
}

/// A scripted host action.
enum Event {
    /// Byte on the command channel.
    Command(u8),
    /// Byte on the telemetry channel.
    Console(u8),
}

/// What the scripted host does on a given cycle.
fn script(cycle: u32, cycles: u32) -> Option<Event> {
    let byte = |flags: &[Flag]| Event::Command(StatusByte::encode(flags.iter().copied()).raw());
    match cycle {
        10 => Some(byte(&[Flag::DataRequest])),
        20 => Some(byte(&[Flag::Start])),
        c if c == cycles / 3 => Some(byte(&[Flag::DecreaseA, Flag::IncreaseB])),
        c if c == cycles / 2 => Some(byte(&[Flag::DecreaseA, Flag::DecreaseB])),
        c if c == cycles * 3 / 4 => Some(Event::Console(STOP_CHAR)),
        c if c == cycles * 3 / 4 + 25 => Some(byte(&[Flag::Start])),
        c if c == cycles - 20 => Some(byte(&[Flag::Stop])),
        c if c == cycles - 10 => Some(byte(&[Flag::DataRequest])),
        _ => None,
    }
}

fn main() -> anyhow::Result<()> {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).init();

    let mut cycles = DEFAULT_CYCLES;
    let mut mirror = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--mirror" => mirror = true,
            other => {
                cycles = other
                    .parse()
                    .with_context(|| format!("invalid cycle count {:?}", other))?
            }
        }
    }
    if cycles < 100 {
        bail!("need at least 100 cycles, got {}", cycles);
    }

    let config = RigConfig::default().with_mirror_b_from_a(mirror);
    config.validate()?;

    let captures = [
        SpeedCapture::new(config.axis_a.estimator.count_up_when_high),
        SpeedCapture::new(config.axis_b.estimator.count_up_when_high),
    ];
    let ticks = [TickCounter::new(), TickCounter::new()];
    let status = SharedStatusByte::new();
    let mut motors = [
        SimMotor::new(AxisId::A, config.axis_a.estimator.timer_hz),
        SimMotor::new(AxisId::B, config.axis_b.estimator.timer_hz),
    ];

    let (cmd_uart, tlm_uart) = (MockUart::new(), MockUart::new());
    let mut cmd_link: SerialLink<16, 256> = SerialLink::new();
    let mut tlm_link: SerialLink<16, 256> = SerialLink::new();
    let (cmd_port, cmd_isr) = cmd_link.split(&cmd_uart);
    let (tlm_port, tlm_isr) = tlm_link.split(&tlm_uart);

    let axis_a = Axis::new(AxisId::A, &config.axis_a, &captures[0], &ticks[0], MockMotor::new());
    let axis_b = Axis::new(AxisId::B, &config.axis_b, &captures[1], &ticks[1], MockMotor::new());
    let mut rig = Rig::new(&config, cmd_port, tlm_port, axis_a, axis_b, &status);

    let timers = [MockTimer::new(), MockTimer::new()];
    let mut isr = RigIsr::new(
        AxisIsr::new(&captures[0], &ticks[0], &timers[0], motors[0].quadrature.clone()),
        AxisIsr::new(&captures[1], &ticks[1], &timers[1], motors[1].quadrature.clone()),
        cmd_isr,
        tlm_isr,
    );

    let mut display = MockDisplay::new();
    display
        .init()
        .map_err(|()| anyhow::anyhow!("display init failed"))?;

    rig.start_up()?;
    log::info!("simulating {} cycles (mirror: {})", cycles, mirror);

    let mut lines = 0u32;
    for cycle in 0..cycles {
        match script(cycle, cycles) {
            Some(Event::Command(byte)) => {
                log::debug!("host -> {:#010b}", byte);
                cmd_uart.inject(byte);
                isr.on_byte_received(ChannelId::Command);
            }
            Some(Event::Console(byte)) => {
                log::debug!("console -> {:?}", char::from(byte));
                tlm_uart.inject(byte);
                isr.on_byte_received(ChannelId::Telemetry);
            }
            None => {}
        }

        isr.on_timer_tick();
        let actuations = [rig.axis_a().actuation(), rig.axis_b().actuation()];
        for ((motor, timer), actuation) in motors.iter_mut().zip(&timers).zip(actuations) {
            motor.advance(actuation, timer, &mut isr);
        }

        let sent = rig.poll()?;

        while tlm_uart.tx_interrupt_enabled() {
            isr.on_transmit_ready(ChannelId::Telemetry);
        }
        let text = tlm_uart.written_str();
        tlm_uart.clear_written();
        for line in text.split("\n\r").filter(|l| !l.is_empty()) {
            if sent.is_none() || lines % LOG_EVERY == 0 {
                log::info!("[{:>5}] {}", cycle, line);
            }
            lines += 1;
        }

        if cycle % 500 == 0 {
            display
                .render(&rig.readout())
                .map_err(|()| anyhow::anyhow!("display write failed"))?;
            log::info!("lcd |{}|{}|", display.lines[0], display.lines[1]);
        }
    }

    let state = rig.state();
    log::info!(
        "done: running={} positions={:?} axes={:?}",
        state.running,
        state.positions,
        state.axes
    );
    Ok(())
}

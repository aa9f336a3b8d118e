use crate::config::AxisConfig;
use crate::control::pid::{limit, Pid, TickCounter};
use crate::protocol::AxisReport;
use crate::speed::{SpeedCapture, SpeedEstimator};
use crate::traits::{AxisId, MotorDriver};

/// One regulated axis: speed estimator, regulator and motor driver.
///
/// Owns the main-loop side of the axis. The interrupt side (capture and
/// tick counter) is borrowed, so interrupt handlers never see the
/// regulator or the driver.
///
/// # Example
///
/// ```rust
/// use rig_control::config::AxisConfig;
/// use rig_control::control::{Axis, TickCounter};
/// use rig_control::hal::MockMotor;
/// use rig_control::speed::SpeedCapture;
/// use rig_control::traits::AxisId;
///
/// static CAPTURE: SpeedCapture = SpeedCapture::new(true);
/// static TICKS: TickCounter = TickCounter::new();
///
/// let mut axis = Axis::new(AxisId::A, &AxisConfig::default(), &CAPTURE, &TICKS, MockMotor::new());
///
/// // Motor not turning yet: full forward actuation
/// assert_eq!(axis.step().unwrap(), 1400);
/// assert_eq!(axis.motor().output, 1400);
/// ```
pub struct Axis<'a, M: MotorDriver> {
    id: AxisId,
    estimator: SpeedEstimator<'a>,
    pid: Pid<'a>,
    motor: M,
    min_output: i16,
    max_output: i16,
    low_speed_threshold: i32,
    speed: i32,
    actuation: i16,
}

impl<'a, M: MotorDriver> Axis<'a, M> {
    /// Assemble an axis.
    pub fn new(
        id: AxisId,
        config: &AxisConfig,
        capture: &'a SpeedCapture,
        ticks: &'a TickCounter,
        motor: M,
    ) -> Self {
        Self {
            id,
            estimator: SpeedEstimator::new(capture, &config.estimator),
            pid: Pid::new(&config.pid, ticks),
            motor,
            min_output: config.min_output,
            max_output: config.max_output,
            low_speed_threshold: config.pid.low_speed_threshold,
            speed: 0,
            actuation: 0,
        }
    }

    /// One control pass: read speed, update the regulator, clamp, actuate.
    ///
    /// Returns the actuation applied.
    pub fn step(&mut self) -> Result<i16, M::Error> {
        self.speed = self.estimator.read_speed();
        // Pacing follows the setpoint magnitude in either direction
        let low_speed =
            self.pid.setpoint().unsigned_abs() < self.low_speed_threshold.unsigned_abs();
        let output = self.pid.compute(self.speed, low_speed);
        let actuation = self.clamp(output);
        self.apply(actuation)
    }

    /// Drive the motor with an externally chosen actuation.
    ///
    /// Speed is still sampled so telemetry stays current; the regulator is
    /// bypassed.
    pub fn drive(&mut self, actuation: i16) -> Result<i16, M::Error> {
        self.speed = self.estimator.read_speed();
        self.apply(limit(actuation, self.min_output, self.max_output))
    }

    /// Stop the motor. Speed is still sampled.
    pub fn stop(&mut self) -> Result<(), M::Error> {
        self.speed = self.estimator.read_speed();
        self.motor.stop()?;
        self.actuation = 0;
        Ok(())
    }

    /// Clear regulator history before a fresh run.
    pub fn restart(&mut self) {
        self.pid.reset(self.speed);
    }

    /// Values for a telemetry line.
    pub fn report(&self) -> AxisReport {
        AxisReport {
            speed: self.speed,
            setpoint: self.pid.setpoint(),
            actuation: self.actuation,
        }
    }

    /// Which axis this is.
    #[inline]
    pub fn id(&self) -> AxisId {
        self.id
    }

    /// Speed sampled on the last pass (RPM).
    #[inline]
    pub fn speed(&self) -> i32 {
        self.speed
    }

    /// Actuation applied on the last pass.
    #[inline]
    pub fn actuation(&self) -> i16 {
        self.actuation
    }

    /// Running position count.
    #[inline]
    pub fn position(&self) -> i32 {
        self.estimator.position()
    }

    /// The estimator.
    pub fn estimator(&self) -> &SpeedEstimator<'a> {
        &self.estimator
    }

    /// The regulator.
    pub fn pid(&self) -> &Pid<'a> {
        &self.pid
    }

    /// The regulator, for setpoint and gain changes.
    pub fn pid_mut(&mut self) -> &mut Pid<'a> {
        &mut self.pid
    }

    /// The motor driver.
    pub fn motor(&self) -> &M {
        &self.motor
    }

    /// The motor driver, mutably.
    pub fn motor_mut(&mut self) -> &mut M {
        &mut self.motor
    }

    fn clamp(&self, output: f32) -> i16 {
        // Saturating float cast; NaN maps to zero
        limit(output, f32::from(self.min_output), f32::from(self.max_output)) as i16
    }

    fn apply(&mut self, actuation: i16) -> Result<i16, M::Error> {
        self.motor.set_output(actuation)?;
        self.actuation = actuation;
        Ok(actuation)
    }
}

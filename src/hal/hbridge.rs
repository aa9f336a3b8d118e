//! Generic H-bridge motor driver over `embedded-hal` 1.0.
//!
//! The bridge is controlled with one PWM channel for magnitude and two
//! direction inputs:
//! - Forward: IN_A high, IN_B low, duty = |output|
//! - Reverse: IN_A low, IN_B high, duty = |output|
//! - Stopped: both low, duty 0 (coast)
//!
//! Works with any HAL that implements [`SetDutyCycle`] and [`OutputPin`].

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::traits::MotorDriver;

/// Which way the bridge is driving.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// IN_A high.
    Forward,
    /// IN_B high.
    Reverse,
    /// Both inputs low.
    #[default]
    Stopped,
}

/// Error from either the PWM channel or a direction pin.
#[derive(Debug, PartialEq, Eq)]
pub enum HBridgeError<PwmE, PinE> {
    /// Setting the duty cycle failed.
    Pwm(PwmE),
    /// Driving a direction pin failed.
    Pin(PinE),
}

/// H-bridge driver.
///
/// `full_scale` is the actuation magnitude that maps to 100% duty; larger
/// magnitudes are held at 100%.
///
/// # Example
///
/// ```ignore
/// use rig_control::hal::HBridge;
/// use rig_control::traits::MotorDriver;
///
/// let mut motor = HBridge::new(pwm_channel, in_a, in_b, 1400);
/// motor.set_output(-700)?; // reverse at 50%
/// ```
pub struct HBridge<P, A, B> {
    pwm: P,
    in_a: A,
    in_b: B,
    full_scale: u16,
    direction: Direction,
}

impl<P, A, B, PinE> HBridge<P, A, B>
where
    P: SetDutyCycle,
    A: OutputPin<Error = PinE>,
    B: OutputPin<Error = PinE>,
{
    /// Wrap a PWM channel and two direction pins.
    ///
    /// The bridge is not touched until the first `set_output`.
    pub fn new(pwm: P, in_a: A, in_b: B, full_scale: u16) -> Self {
        Self {
            pwm,
            in_a,
            in_b,
            full_scale: full_scale.max(1),
            direction: Direction::Stopped,
        }
    }

    /// Direction applied by the last `set_output`.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Release the pins and PWM channel.
    pub fn release(self) -> (P, A, B) {
        (self.pwm, self.in_a, self.in_b)
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), PinE> {
        match direction {
            Direction::Forward => {
                self.in_b.set_low()?;
                self.in_a.set_high()
            }
            Direction::Reverse => {
                self.in_a.set_low()?;
                self.in_b.set_high()
            }
            Direction::Stopped => {
                self.in_a.set_low()?;
                self.in_b.set_low()
            }
        }
    }
}

impl<P, A, B, PinE> MotorDriver for HBridge<P, A, B>
where
    P: SetDutyCycle,
    A: OutputPin<Error = PinE>,
    B: OutputPin<Error = PinE>,
{
    type Error = HBridgeError<P::Error, PinE>;

    fn set_output(&mut self, output: i16) -> Result<(), Self::Error> {
        let direction = match output {
            o if o > 0 => Direction::Forward,
            o if o < 0 => Direction::Reverse,
            _ => Direction::Stopped,
        };
        let magnitude = output.unsigned_abs().min(self.full_scale);

        // Duty goes to zero before the direction pins change
        if direction != self.direction {
            self.pwm.set_duty_cycle_fully_off().map_err(HBridgeError::Pwm)?;
            self.set_direction(direction).map_err(HBridgeError::Pin)?;
            self.direction = direction;
        }
        self.pwm
            .set_duty_cycle_fraction(magnitude, self.full_scale)
            .map_err(HBridgeError::Pwm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    #[derive(Default)]
    struct TestPwm {
        duty: u16,
        writes: Vec<u16>,
    }

    impl embedded_hal::pwm::ErrorType for TestPwm {
        type Error = Infallible;
    }

    impl SetDutyCycle for TestPwm {
        fn max_duty_cycle(&self) -> u16 {
            1000
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
            self.duty = duty;
            self.writes.push(duty);
            Ok(())
        }
    }

    #[derive(Default)]
    struct TestPin {
        high: bool,
    }

    impl embedded_hal::digital::ErrorType for TestPin {
        type Error = Infallible;
    }

    impl OutputPin for TestPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            Ok(())
        }
    }

    fn bridge() -> HBridge<TestPwm, TestPin, TestPin> {
        HBridge::new(TestPwm::default(), TestPin::default(), TestPin::default(), 1400)
    }

    #[test]
    fn forward_sets_in_a_and_scales_duty() {
        let mut motor = bridge();
        motor.set_output(700).unwrap();
        assert_eq!(motor.direction(), Direction::Forward);
        let (pwm, a, b) = motor.release();
        assert!(a.high);
        assert!(!b.high);
        assert_eq!(pwm.duty, 500);
    }

    #[test]
    fn reverse_sets_in_b() {
        let mut motor = bridge();
        motor.set_output(-1400).unwrap();
        assert_eq!(motor.direction(), Direction::Reverse);
        let (pwm, a, b) = motor.release();
        assert!(!a.high);
        assert!(b.high);
        assert_eq!(pwm.duty, 1000);
    }

    #[test]
    fn over_full_scale_is_held_at_full_duty() {
        let mut motor = bridge();
        motor.set_output(i16::MIN).unwrap();
        let (pwm, _, _) = motor.release();
        assert_eq!(pwm.duty, 1000);
    }

    #[test]
    fn stop_coasts() {
        let mut motor = bridge();
        motor.set_output(300).unwrap();
        motor.stop().unwrap();
        assert_eq!(motor.direction(), Direction::Stopped);
        let (pwm, a, b) = motor.release();
        assert!(!a.high && !b.high);
        assert_eq!(pwm.duty, 0);
    }

    #[test]
    fn reversal_cuts_duty_first() {
        let mut motor = bridge();
        motor.set_output(1400).unwrap();
        motor.set_output(-700).unwrap();
        let (pwm, _, _) = motor.release();
        // 0 on each direction change, then the new magnitude
        assert_eq!(pwm.writes, vec![0, 1000, 0, 500]);
    }

    #[test]
    fn same_direction_only_updates_duty() {
        let mut motor = bridge();
        motor.set_output(140).unwrap();
        motor.set_output(280).unwrap();
        let (pwm, _, _) = motor.release();
        assert_eq!(pwm.writes, vec![0, 100, 200]);
    }
}

use core::fmt::Debug;

use embedded_hal::pwm::SetDutyCycle;

/// Full-scale duty value for a [`PwmOutput`].
pub const MAX_DUTY: u8 = 255;

/// One unidirectional PWM line of a motor driver.
pub trait PwmOutput {
    /// Error reported by the PWM hardware.
    type Error: Debug;

    /// Put the line in output mode.
    fn configure_output(&mut self) -> Result<(), Self::Error>;

    /// Set duty cycle (0 ~ 255).
    fn set_duty(&mut self, duty: u8) -> Result<(), Self::Error>;
}

/// PWM channel backed by any `embedded-hal` duty cycle driver.
///
/// The 0 ~ 255 duty range is scaled onto the driver's own resolution.
pub struct DutyCycleChannel<P> {
    pwm: P,
    duty: u8,
}

impl<P: SetDutyCycle> DutyCycleChannel<P> {
    /// Create a new PWM channel.
    pub fn new(pwm: P) -> Self {
        Self { pwm, duty: 0 }
    }

    /// Last duty written (0 ~ 255).
    pub fn duty(&self) -> u8 {
        self.duty
    }

    /// Get max duty cycle of the underlying driver.
    pub fn max_duty(&self) -> u16 {
        self.pwm.max_duty_cycle()
    }

    /// Give back the wrapped driver.
    pub fn release(self) -> P {
        self.pwm
    }
}

impl<P: SetDutyCycle> PwmOutput for DutyCycleChannel<P> {
    type Error = P::Error;

    fn configure_output(&mut self) -> Result<(), Self::Error> {
        // The HAL driver owns the pin mode; start from a silent output.
        self.set_duty(0)
    }

    fn set_duty(&mut self, duty: u8) -> Result<(), Self::Error> {
        self.pwm
            .set_duty_cycle_fraction(u16::from(duty), u16::from(MAX_DUTY))?;
        self.duty = duty;
        Ok(())
    }
}

use crate::clamp::clamp_drive;
use crate::clock::Clock;
use crate::encoder::Encoder;
use crate::pid::PidController;
use crate::pwm::{PwmOutput, MAX_DUTY};
use thiserror::Error;

/// Motor error.
#[derive(Debug, Error)]
pub enum MotorError<P, E> {
    #[error("Pwm error: {0:?}")]
    PwmError(P),
    #[error("Encoder error: {0:?}")]
    EncoderError(E),
}

/// What `update` drives the motor from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MotorMode {
    /// Open loop, from the value given to `set_analog`.
    #[default]
    Analog,
    /// Closed loop on the encoder count, towards the `set_position` target.
    PositionPid,
    /// Both lines held at zero.
    Stopped,
}

/// Wiring direction of the motor leads.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Polarity {
    #[default]
    Normal,
    /// Leads swapped: positive drive runs on the reverse line.
    Inverted,
}

impl Polarity {
    /// Sign applied to every drive value.
    pub fn sign(self) -> i32 {
        match self {
            Polarity::Normal => 1,
            Polarity::Inverted => -1,
        }
    }
}

/// Single motor on a dual-PWM driver with an encoder.
///
/// Positive drive values run the forward line, negative ones the reverse line,
/// after the polarity sign is applied. Drive magnitude is capped at 255.
pub struct MotorController<P, E, C> {
    forward: P,
    reverse: P,
    polarity: Polarity,
    encoder: E,
    pid: PidController<C>,
    mode: MotorMode,
    setpoint: i32, // Target encoder count
    speed: i32,    // Open loop drive value
}

impl<P, E, C> MotorController<P, E, C>
where
    P: PwmOutput,
    E: Encoder,
    C: Clock,
{
    /// Create a new motor controller.
    ///
    /// Nothing is written to the hardware until [`setup`](Self::setup).
    pub fn new(
        forward: P,
        reverse: P,
        polarity: Polarity,
        encoder: E,
        pid: PidController<C>,
    ) -> Self {
        Self {
            forward,
            reverse,
            polarity,
            encoder,
            pid,
            mode: MotorMode::default(),
            setpoint: 0,
            speed: 0,
        }
    }

    /// Configure both PWM lines and stop the motor.
    pub fn setup(&mut self) -> Result<(), MotorError<P::Error, E::Error>> {
        self.forward
            .configure_output()
            .map_err(MotorError::PwmError)?;
        self.reverse
            .configure_output()
            .map_err(MotorError::PwmError)?;
        log::info!("Motor setup, polarity: {:?}", self.polarity);
        self.stop()
    }

    /// Stop the motor.
    pub fn stop(&mut self) -> Result<(), MotorError<P::Error, E::Error>> {
        if self.mode != MotorMode::Stopped {
            log::debug!("Motor mode: {:?} -> Stopped", self.mode);
        }
        self.mode = MotorMode::Stopped;
        self.write_analog(0)
    }

    /// Run one control tick for the current mode.
    pub fn update(&mut self) -> Result<(), MotorError<P::Error, E::Error>> {
        match self.mode {
            MotorMode::Analog => self.write_analog(self.speed),
            MotorMode::PositionPid => {
                let count = self.get_enc()?;
                let output = self
                    .pid
                    .calculate(f64::from(count), f64::from(self.setpoint));
                // Truncates toward zero; NaN becomes 0.
                self.write_analog(output as i32)
            }
            MotorMode::Stopped => self.stop(),
        }
    }

    /// Set the target encoder count for position mode.
    pub fn set_position(&mut self, pos: i32) {
        self.setpoint = pos;
    }

    /// Set the open loop drive value (-255 ~ 255, clamped when written).
    pub fn set_analog(&mut self, speed: i32) {
        self.speed = speed;
    }

    /// Switch to open loop drive.
    pub fn set_analog_mode(&mut self) {
        self.set_mode(MotorMode::Analog);
    }

    /// Switch to closed loop position control.
    pub fn set_position_mode(&mut self) {
        self.set_mode(MotorMode::PositionPid);
    }

    fn set_mode(&mut self, mode: MotorMode) {
        if self.mode != mode {
            log::debug!("Motor mode: {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
    }

    /// Write a signed drive value to the two PWM lines.
    ///
    /// 0 < value <= 255 forwards, -255 <= value < 0 backwards.
    pub fn write_analog(&mut self, value: i32) -> Result<(), MotorError<P::Error, E::Error>> {
        let value = clamp_drive(value) * self.polarity.sign();
        let duty = u8::try_from(value.unsigned_abs()).unwrap_or(MAX_DUTY);

        // Release the idle line before driving the active one.
        if value < 0 {
            self.forward.set_duty(0).map_err(MotorError::PwmError)?;
            self.reverse.set_duty(duty).map_err(MotorError::PwmError)?;
        } else {
            self.reverse.set_duty(0).map_err(MotorError::PwmError)?;
            self.forward.set_duty(duty).map_err(MotorError::PwmError)?;
        }

        log::trace!("Motor drive: {}", value);
        Ok(())
    }

    /// Get the encoder value.
    pub fn get_enc(&mut self) -> Result<i32, MotorError<P::Error, E::Error>> {
        self.encoder.count().map_err(MotorError::EncoderError)
    }

    /// Overwrite the encoder value.
    pub fn set_enc(&mut self, count: i32) -> Result<(), MotorError<P::Error, E::Error>> {
        self.encoder
            .set_count(count)
            .map_err(MotorError::EncoderError)
    }

    /// Get the current mode.
    pub fn mode(&self) -> MotorMode {
        self.mode
    }

    /// Get the target encoder count.
    pub fn setpoint(&self) -> i32 {
        self.setpoint
    }

    /// Get the open loop drive value.
    pub fn speed(&self) -> i32 {
        self.speed
    }

    /// Get the wiring polarity.
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Get the PID controller.
    pub fn pid(&self) -> &PidController<C> {
        &self.pid
    }

    /// Mutable access to the PID, e.g. to retune or reset it.
    pub fn pid_mut(&mut self) -> &mut PidController<C> {
        &mut self.pid
    }

    /// Give back the forward line, reverse line, encoder and PID.
    pub fn release(self) -> (P, P, E, PidController<C>) {
        (self.forward, self.reverse, self.encoder, self.pid)
    }
}

use thiserror::Error;

use crate::clamp::{clamp_magnitude, rescale_magnitude};
use crate::clock::Clock;

/// PID tuning error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PidConfigError {
    #[error("PID parameter `{0}` is not finite")]
    NotFinite(&'static str),
    #[error("Output bounds must satisfy 0 <= zero ({zero}) <= min ({min}) <= max ({max})")]
    OutputBounds { zero: f64, min: f64, max: f64 },
    #[error("Integral region is negative: {0}")]
    NegativeIntegralRegion(f64),
    #[error("Integrator limit is negative: {0}")]
    NegativeIntegratorLimit(f64),
}

/// Fixed tuning of a [`PidController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidConfig {
    pub kp: f64,          // Proportional coefficient
    pub ki: f64,          // Integral coefficient (per ms)
    pub kd: f64,          // Derivative coefficient (ms)
    pub zero_output: f64, // Outputs below this magnitude are forced to 0
    pub min_output: f64,  // Outputs below this magnitude are kicked to max_output
    pub max_output: f64,  // Saturation bound
    pub i_region: f64,    // Integrate only while |error| is below this
    pub i_max: f64,       // Integrator clamp
}

impl PidConfig {
    /// Create a new configuration with plain gains.
    ///
    /// No deadband or minimum output, saturation at 255 and integration disabled.
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            zero_output: 0.0,
            min_output: 0.0,
            max_output: 255.0,
            i_region: 0.0,
            i_max: 0.0,
        }
    }

    /// Set deadband, minimum effective output and saturation bound.
    pub fn with_output_shaping(
        mut self,
        zero_output: f64,
        min_output: f64,
        max_output: f64,
    ) -> Self {
        self.zero_output = zero_output;
        self.min_output = min_output;
        self.max_output = max_output;
        self
    }

    /// Set the error region where the integrator runs and its clamp.
    pub fn with_integral(mut self, i_region: f64, i_max: f64) -> Self {
        self.i_region = i_region;
        self.i_max = i_max;
        self
    }

    /// Check the tuning invariants.
    pub fn validate(&self) -> Result<(), PidConfigError> {
        let values = [
            ("kp", self.kp),
            ("ki", self.ki),
            ("kd", self.kd),
            ("zero_output", self.zero_output),
            ("min_output", self.min_output),
            ("max_output", self.max_output),
            ("i_region", self.i_region),
            ("i_max", self.i_max),
        ];
        for (name, value) in values {
            if !value.is_finite() {
                return Err(PidConfigError::NotFinite(name));
            }
        }

        if !(0.0 <= self.zero_output
            && self.zero_output <= self.min_output
            && self.min_output <= self.max_output)
        {
            return Err(PidConfigError::OutputBounds {
                zero: self.zero_output,
                min: self.min_output,
                max: self.max_output,
            });
        }
        if self.i_region < 0.0 {
            return Err(PidConfigError::NegativeIntegralRegion(self.i_region));
        }
        if self.i_max < 0.0 {
            return Err(PidConfigError::NegativeIntegratorLimit(self.i_max));
        }
        Ok(())
    }

    /// Saturate, then apply deadband and minimum-output kick.
    fn shape(&self, raw: f64) -> f64 {
        let output = clamp_magnitude(raw, self.max_output);

        if output.abs() < self.zero_output {
            0.0
        } else if output.abs() < self.min_output {
            // Jump straight to full output to break static friction.
            rescale_magnitude(output, self.max_output)
        } else {
            output
        }
    }
}

/// Position PID controller with region-limited integration.
///
/// The error is `measurement - setpoint` and the derivative is taken on the
/// measurement, so setpoint steps do not kick the output.
#[derive(Debug)]
pub struct PidController<C> {
    config: PidConfig,
    clock: C,
    prev_time: f64,                // Timestamp of the last calculation (ms)
    prev_measurement: Option<f64>, // Measurement seen by the last calculation
    integrator: f64,               // Accumulated integral term
}

impl<C: Clock> PidController<C> {
    /// Create a new PID controller.
    pub fn new(config: PidConfig, clock: C) -> Result<Self, PidConfigError> {
        config.validate()?;
        let prev_time = clock.now_ms();
        Ok(Self {
            config,
            clock,
            prev_time,
            prev_measurement: Some(0.0),
            integrator: 0.0,
        })
    }

    /// Calculate PID output.
    ///
    /// The first call after construction sees a previous measurement of 0 and
    /// may produce a derivative spike.
    ///
    /// If no time has passed since the previous call (or the clock stepped
    /// back), the derivative is treated as 0 and the integrator is held.
    pub fn calculate(&mut self, measurement: f64, setpoint: f64) -> f64 {
        let now = self.clock.now_ms();
        let dt = now - self.prev_time;
        self.prev_time = now;

        let error = measurement - setpoint;

        let derivative = if dt > 0.0 && dt.is_finite() {
            if error.abs() < self.config.i_region {
                self.integrator = clamp_magnitude(
                    self.integrator + error * self.config.ki * dt,
                    self.config.i_max,
                );
            }
            // No history after a reset.
            self.prev_measurement
                .map_or(0.0, |prev| (measurement - prev) / dt)
        } else {
            log::warn!("PID dt is {dt} ms, skipping derivative and integral");
            0.0
        };
        self.prev_measurement = Some(measurement);

        let raw = self.config.kp * error + self.integrator + self.config.kd * derivative;
        let output = self.config.shape(raw);

        log::trace!(
            "PID dt: {:.3}, error: {:.2}, I: {:.2}, D: {:.3}, raw: {:.2}, out: {:.2}",
            dt,
            error,
            self.integrator,
            derivative,
            raw,
            output
        );

        output
    }

    /// Clear integrator and derivative history.
    ///
    /// The next calculation takes no derivative term.
    pub fn reset(&mut self) {
        self.prev_time = self.clock.now_ms();
        self.prev_measurement = None;
        self.integrator = 0.0;
    }

    /// Replace the tuning, keeping the running state.
    pub fn set_config(&mut self, config: PidConfig) -> Result<(), PidConfigError> {
        config.validate()?;
        log::debug!("PID retuned: {:?}", config);
        self.config = config;
        self.integrator = clamp_magnitude(self.integrator, config.i_max);
        Ok(())
    }

    /// Current tuning.
    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    /// Accumulated integral term.
    pub fn integrator(&self) -> f64 {
        self.integrator
    }
}

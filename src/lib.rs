//! Closed-loop motor control: a position PID controller and a dual-PWM motor
//! driver with open loop, position and stopped modes.

pub mod clamp;
pub mod clock;
pub mod encoder;
#[cfg(feature = "esp")]
pub mod esp;
pub mod motor;
pub mod pid;
pub mod pwm;

pub use clock::{Clock, ManualClock, SystemClock};
pub use encoder::Encoder;
pub use motor::{MotorController, MotorError, MotorMode, Polarity};
pub use pid::{PidConfig, PidConfigError, PidController};
pub use pwm::{DutyCycleChannel, PwmOutput};

//! Closed-loop runs of the motor controller against a simulated DC motor.

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use motor_control::{
    Clock, Encoder, ManualClock, MotorController, MotorMode, PidConfig, PidController, Polarity,
    PwmOutput,
};

const TICK_MS: f64 = 1.0;
const MAX_SPEED: f64 = 2.0; // Counts per ms at full duty
const RESPONSE: f64 = 0.2; // Fraction of speed error closed per ms

#[derive(Clone, Default)]
struct SharedPwm(Rc<Cell<u8>>);

impl PwmOutput for SharedPwm {
    type Error = Infallible;

    fn configure_output(&mut self) -> Result<(), Self::Error> {
        self.0.set(0);
        Ok(())
    }

    fn set_duty(&mut self, duty: u8) -> Result<(), Self::Error> {
        self.0.set(duty);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct SimEncoder(Rc<Cell<f64>>);

impl Encoder for SimEncoder {
    type Error = Infallible;

    fn count(&mut self) -> Result<i32, Self::Error> {
        Ok(self.0.get().round() as i32)
    }

    fn set_count(&mut self, count: i32) -> Result<(), Self::Error> {
        self.0.set(f64::from(count));
        Ok(())
    }
}

/// First order DC motor: forward duty counts the encoder up.
struct Plant {
    forward: SharedPwm,
    reverse: SharedPwm,
    position: SimEncoder,
    speed: f64,
}

impl Plant {
    fn new() -> Self {
        Self {
            forward: SharedPwm::default(),
            reverse: SharedPwm::default(),
            position: SimEncoder::default(),
            speed: 0.0,
        }
    }

    fn drive(&self) -> f64 {
        f64::from(self.forward.0.get()) - f64::from(self.reverse.0.get())
    }

    fn step(&mut self, dt: f64) {
        let target_speed = self.drive() / 255.0 * MAX_SPEED;
        self.speed += (target_speed - self.speed) * RESPONSE * dt;
        let position = &self.position.0;
        position.set(position.get() + self.speed * dt);
    }

    fn position(&self) -> f64 {
        self.position.0.get()
    }
}

type SimMotor<'a> = MotorController<SharedPwm, SimEncoder, &'a ManualClock>;

fn build<'a>(
    plant: &Plant,
    clock: &'a ManualClock,
    config: PidConfig,
) -> anyhow::Result<SimMotor<'a>> {
    let pid = PidController::new(config, clock)?;
    let mut motor = MotorController::new(
        plant.forward.clone(),
        plant.reverse.clone(),
        // Positive PID output means "above target", so it must run the motor backwards.
        Polarity::Inverted,
        plant.position.clone(),
        pid,
    );
    motor.setup()?;
    Ok(motor)
}

fn run(
    motor: &mut SimMotor<'_>,
    plant: &mut Plant,
    clock: &ManualClock,
    ms: u32,
) -> anyhow::Result<()> {
    for _ in 0..ms {
        clock.advance(TICK_MS);
        motor.update()?;
        plant.step(TICK_MS);
    }
    Ok(())
}

#[test]
fn test_position_mode_settles_on_target() -> anyhow::Result<()> {
    let clock = ManualClock::new(0.0);
    let mut plant = Plant::new();
    let mut motor = build(&plant, &clock, PidConfig::new(0.5, 0.0, 50.0))?;

    motor.set_position(1000);
    motor.set_position_mode();
    run(&mut motor, &mut plant, &clock, 5000)?;

    assert!((plant.position() - 1000.0).abs() < 10.0, "position {}", plant.position());
    assert_eq!(motor.mode(), MotorMode::PositionPid);

    // Move back past zero.
    motor.set_position(-400);
    run(&mut motor, &mut plant, &clock, 5000)?;
    assert!((plant.position() + 400.0).abs() < 10.0, "position {}", plant.position());
    Ok(())
}

#[test]
fn test_position_mode_duty_respects_output_shaping() -> anyhow::Result<()> {
    let clock = ManualClock::new(0.0);
    let mut plant = Plant::new();
    let config = PidConfig::new(0.5, 0.0, 50.0)
        .with_output_shaping(3.0, 20.0, 120.0)
        .with_integral(30.0, 10.0);
    let mut motor = build(&plant, &clock, config)?;

    motor.set_position(600);
    motor.set_position_mode();
    for _ in 0..4000 {
        clock.advance(TICK_MS);
        motor.update()?;

        let (forward, reverse) = (plant.forward.0.get(), plant.reverse.0.get());
        assert!(forward == 0 || reverse == 0);
        let duty = forward.max(reverse);
        assert!(duty == 0 || (20..=120).contains(&duty), "duty {duty}");
        assert!(motor.pid().integrator().abs() <= 10.0);

        plant.step(TICK_MS);
    }

    // The full-output kick leaves a small limit cycle around the target at most.
    assert!((plant.position() - 600.0).abs() < 40.0, "position {}", plant.position());
    Ok(())
}

#[test]
fn test_analog_then_stop() -> anyhow::Result<()> {
    let clock = ManualClock::new(0.0);
    let mut plant = Plant::new();
    let mut motor = build(&plant, &clock, PidConfig::new(1.0, 0.0, 0.0))?;
    assert_eq!(motor.mode(), MotorMode::Stopped);

    motor.set_analog(-128);
    motor.set_analog_mode();
    run(&mut motor, &mut plant, &clock, 200)?;

    // Inverted wiring: negative drive runs forward.
    assert_eq!(plant.forward.0.get(), 128);
    assert_eq!(plant.reverse.0.get(), 0);
    let moved = plant.position();
    assert!(moved > 100.0, "position {moved}");

    motor.stop()?;
    assert_eq!(plant.drive(), 0.0);
    run(&mut motor, &mut plant, &clock, 200)?;
    assert_eq!(plant.drive(), 0.0);
    assert!(plant.position() - moved < 10.0);
    Ok(())
}

#[test]
fn test_recalibrate_and_retune_while_running() -> anyhow::Result<()> {
    let clock = ManualClock::new(0.0);
    let mut plant = Plant::new();
    let mut motor = build(&plant, &clock, PidConfig::new(0.5, 0.0, 50.0))?;

    motor.set_enc(5000)?;
    assert_eq!(motor.get_enc()?, 5000);

    motor.set_position(5300);
    motor.set_position_mode();
    run(&mut motor, &mut plant, &clock, 1000)?;

    motor.pid_mut().set_config(PidConfig::new(0.8, 0.0, 60.0))?;
    motor.pid_mut().reset();
    run(&mut motor, &mut plant, &clock, 4000)?;

    assert!((plant.position() - 5300.0).abs() < 10.0, "position {}", plant.position());
    assert_eq!(motor.pid().config().kp, 0.8);
    assert!(clock.now_ms() >= 5000.0);
    Ok(())
}

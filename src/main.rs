use esp_idf_svc as svc;
use hal::sys;
use svc::hal;

use motor_control::esp::{PcntEncoder, PCNT_HIGH_LIMIT, PCNT_LOW_LIMIT};
use motor_control::{
    DutyCycleChannel, MotorController, PidConfig, PidController, Polarity, SystemClock,
};

use hal::delay::FreeRtos;
use hal::gpio::AnyInputPin;
use hal::ledc::{self, LedcDriver, LedcTimerDriver, Resolution};
use hal::pcnt::{
    PcntChannel, PcntChannelConfig, PcntControlMode, PcntCountMode, PcntDriver, PinIndex,
};
use hal::peripherals::Peripherals;
use hal::units::Hertz;

const KP: f64 = 0.6; // Proportional coefficient
const KI: f64 = 0.0004; // Integral coefficient
const KD: f64 = 4.0; // Derivative coefficient
const ZERO_OUTPUT: f64 = 4.0;
const MIN_OUTPUT: f64 = 25.0;
const MAX_OUTPUT: f64 = 255.0;
const I_REGION: f64 = 200.0;
const I_MAX: f64 = 60.0;

const CONTROL_PERIOD_MS: u32 = 5;
const HOLD_TICKS: u32 = 400;
const TARGETS: [i32; 3] = [2000, -2000, 0];

fn main() -> anyhow::Result<()> {
    sys::link_patches();

    svc::log::EspLogger::initialize_default();

    let p = Peripherals::take()?;
    let lpwm_pin = p.pins.gpio1;
    let rpwm_pin = p.pins.gpio9;
    let e1_a = p.pins.gpio40;
    let e1_b = p.pins.gpio41;

    let pwm_tim = LedcTimerDriver::new(
        p.ledc.timer0,
        &ledc::config::TimerConfig::default()
            .frequency(Hertz(3_000))
            .resolution(Resolution::Bits14),
    )?;
    let lpwm = LedcDriver::new(p.ledc.channel0, &pwm_tim, lpwm_pin)?;
    let rpwm = LedcDriver::new(p.ledc.channel1, &pwm_tim, rpwm_pin)?;

    let mut pcnt = PcntDriver::new(
        p.pcnt0,
        Some(e1_a),
        Some(e1_b),
        Option::<AnyInputPin>::None,
        Option::<AnyInputPin>::None,
    )?;
    pcnt.channel_config(
        PcntChannel::Channel0,
        PinIndex::Pin0,
        PinIndex::Pin1,
        &PcntChannelConfig {
            lctrl_mode: PcntControlMode::Reverse,
            hctrl_mode: PcntControlMode::Keep,
            pos_mode: PcntCountMode::Increment, // Positive pulse increment
            neg_mode: PcntCountMode::Decrement, // Negative pulse decrement
            counter_h_lim: PCNT_HIGH_LIMIT,
            counter_l_lim: PCNT_LOW_LIMIT,
        },
    )?;
    pcnt.set_filter_value(1000)?;
    pcnt.filter_enable()?;
    pcnt.counter_pause()?;
    pcnt.counter_clear()?;
    pcnt.counter_resume()?;
    let encoder = PcntEncoder::new(pcnt)?;

    let config = PidConfig::new(KP, KI, KD)
        .with_output_shaping(ZERO_OUTPUT, MIN_OUTPUT, MAX_OUTPUT)
        .with_integral(I_REGION, I_MAX);
    let pid = PidController::new(config, SystemClock::new())?;

    let mut motor = MotorController::new(
        DutyCycleChannel::new(lpwm),
        DutyCycleChannel::new(rpwm),
        Polarity::Inverted,
        encoder,
        pid,
    );
    motor.setup()?;
    motor.set_enc(0)?;

    log::info!("Start...");

    motor.set_position_mode();
    loop {
        for &target in TARGETS.iter() {
            motor.set_position(target);
            log::info!("Target: {}", target);

            for _ in 0..HOLD_TICKS {
                motor.update()?;
                FreeRtos::delay_ms(CONTROL_PERIOD_MS);
            }

            log::info!("Reached: {}, target: {}", motor.get_enc()?, target);
        }
    }
}

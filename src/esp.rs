//! ESP32 backends for the motor controller.
use esp_idf_svc::hal;

use crate::encoder::Encoder;
use hal::pcnt::PcntDriver;
use hal::sys::EspError;

/// Counter limits the PCNT unit must be configured with.
pub const PCNT_HIGH_LIMIT: i16 = i16::MAX;
pub const PCNT_LOW_LIMIT: i16 = i16::MIN;

/// Quadrature encoder on a PCNT unit, extended to 32 bits in software.
///
/// The unit must count between [`PCNT_LOW_LIMIT`] and [`PCNT_HIGH_LIMIT`];
/// it resets to 0 on either limit. `count` must be polled at least once per
/// half counter range of travel for the wrap to be tracked.
pub struct PcntEncoder<'a> {
    pcnt: PcntDriver<'a>,
    base: i32,
    last_raw: i16,
}

impl<'a> PcntEncoder<'a> {
    /// Create a new encoder, clearing the hardware counter.
    pub fn new(pcnt: PcntDriver<'a>) -> Result<Self, EspError> {
        pcnt.counter_clear()?;
        Ok(Self {
            pcnt,
            base: 0,
            last_raw: 0,
        })
    }
}

impl Encoder for PcntEncoder<'_> {
    type Error = EspError;

    fn count(&mut self) -> Result<i32, Self::Error> {
        const HALF_RANGE: i32 = PCNT_HIGH_LIMIT as i32 / 2;

        let raw = self.pcnt.get_counter_value()?;
        let mut delta = i32::from(raw) - i32::from(self.last_raw);

        // The counter passed a limit and restarted from 0.
        if delta < -HALF_RANGE {
            delta += i32::from(PCNT_HIGH_LIMIT);
        } else if delta > HALF_RANGE {
            delta += i32::from(PCNT_LOW_LIMIT);
        }

        self.base = self.base.wrapping_add(delta);
        self.last_raw = raw;
        Ok(self.base)
    }

    fn set_count(&mut self, count: i32) -> Result<(), Self::Error> {
        self.pcnt.counter_clear()?;
        self.base = count;
        self.last_raw = 0;
        Ok(())
    }
}

//! PWM frequency and duty computation.
//!
//! The hardware is abstracted as a [`PwmDriver`] that programs a top value
//! (period) and a compare value (duty threshold) into an 8-bit timer.
//! [`Pwm`] owns the arithmetic: frequency to clamped top value, duty
//! percentage to compare value against the last programmed top.
//! [`Pwm::new`] takes the initial frequency, so a duty computation always
//! has a programmed period behind it.

use num_traits::float::FloatCore;

/// The output driver: programs the timer period and duty threshold. No
/// decision logic lives here.
pub trait PwmDriver {
    /// Programs the counter top value (the period).
    fn set_top(&mut self, top: u8);

    /// Programs the compare value (the duty threshold). Zero is fully off;
    /// equal to the top value is fully on.
    fn set_compare(&mut self, compare: u8);
}

/// Clocking parameters of the PWM timer.
#[derive(Debug, Clone, Copy)]
pub struct PwmConfig {
    /// Input clock in Hz.
    pub clock_hz: u32,
    /// Fixed prescale divider between the clock and the counter.
    pub prescale: u32,
    /// Lowest permitted top value; bounds the frequency from above and
    /// keeps a usable duty resolution.
    pub min_res: u8,
    /// Highest permitted top value; bounds the frequency from below.
    pub max_res: u8,
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            clock_hz: 16_000_000,
            prescale: 64,
            min_res: 20,
            max_res: 255,
        }
    }
}

/// PWM actuation state: the driver plus the last programmed top value and
/// the effective frequency it yields.
pub struct Pwm<D: PwmDriver> {
    driver: D,
    config: PwmConfig,
    top: u8,
    frequency: f32,
}

impl<D: PwmDriver> Pwm<D> {
    /// Creates the actuator and programs the initial frequency with the
    /// output off.
    pub fn new(driver: D, config: PwmConfig, frequency_hz: f32) -> Self {
        let mut pwm = Self {
            driver,
            config,
            top: 0,
            frequency: 0.0,
        };
        pwm.set_frequency(frequency_hz);
        pwm.set_duty(0.0);
        pwm
    }

    /// Programs the output frequency.
    ///
    /// The requested frequency maps to a top value of
    /// `clock / (prescale * hz)`, clamped into `[min_res, max_res]`; the
    /// stored effective frequency reflects the clamp. The duty threshold is
    /// relative to the top value, so callers changing frequency mid-flight
    /// should re-issue [`Pwm::set_duty`].
    pub fn set_frequency(&mut self, hz: f32) {
        let base = (self.config.clock_hz / self.config.prescale) as f32;
        let raw = if hz > 0.0 { base / hz } else { f32::INFINITY };
        let top = if raw < self.config.min_res as f32 {
            self.config.min_res
        } else if raw >= self.config.max_res as f32 {
            self.config.max_res
        } else {
            raw as u8
        };
        self.top = top;
        self.frequency = base / top as f32;
        self.driver.set_top(top);
    }

    /// Programs the duty cycle as a percentage of the period.
    ///
    /// At or below 0 the output is forced fully off; above 100 it is forced
    /// fully on; in between the compare value is the rounded fraction of
    /// the last programmed top value.
    pub fn set_duty(&mut self, percent: f32) {
        let compare = if percent <= 0.0 {
            0
        } else if percent > 100.0 {
            self.top
        } else {
            FloatCore::round(percent / 100.0 * self.top as f32) as u8
        };
        self.driver.set_compare(compare);
    }

    /// Returns the effective output frequency in Hz after clamping.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Returns the last programmed top value.
    pub fn top(&self) -> u8 {
        self.top
    }

    /// Returns the driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Returns the driver mutably.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}

//! Temperature sensor acquisition state machine.
//!
//! Converts a stream of raw analog readings into one validated temperature
//! per sampling period. Each period averages `samples_per_reading` samples,
//! with per-sample outlier rejection against the previously accepted sample:
//! steady electrical noise is suppressed by the mean, transient spikes by
//! the variance check, without the cost of a full digital filter.
//!
//! The polling cadence is owned by the caller (one [`Sensor::poll`] per
//! 10 ms tick at the device layer); the heater starts each period on its own
//! 100 ms cadence via [`Sensor::start_reading`].

use num_traits::float::FloatCore;

/// A source of instantaneous raw temperature readings, one analog channel
/// per call. The front end is expected to deliver engineering units
/// (degrees Celsius); disconnection and power loss show up as rail readings
/// that the sensor classifies, not as errors from this trait.
pub trait SampleSource {
    /// Takes one raw reading from `channel`.
    fn sample(&mut self, channel: u8) -> f32;
}

impl<T: FnMut(u8) -> f32> SampleSource for T {
    fn sample(&mut self, channel: u8) -> f32 {
        self(channel)
    }
}

/// Acquisition state. The register interface reserves 0 for "not yet
/// published", so discriminants start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SensorState {
    /// No validated reading is available; the last period classified as a
    /// fault, or no period has completed yet.
    HasNoData = 1,
    /// The last completed period produced a validated temperature.
    HasData = 2,
    /// Terminal: repeated out-of-variance samples exhausted the retry
    /// budget. Cleared only by [`Sensor::reset`].
    Shutdown = 3,
}

/// Diagnostic detail accompanying [`SensorState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SensorCode {
    /// Nothing wrong.
    Ok = 0,
    /// The period mean read above the disconnect threshold: the probe is
    /// open-circuit and the amplifier has railed high.
    Disconnected = 1,
    /// The period mean read below the no-power threshold: the amplifier is
    /// unpowered and its output has railed low.
    NoPower = 2,
    /// The retry budget was exhausted without an in-variance sample.
    BadReadings = 3,
}

/// Acquisition tuning for one analog front end.
///
/// The defaults describe a K-type thermocouple behind an AD597-class
/// amplifier on a 10-bit converter: full 10-sample periods at the 10 ms
/// tick, a rail-high disconnect level and a rail-low no-power level.
#[derive(Debug, Clone, Copy)]
pub struct SensorConfig {
    /// Analog channel passed through to the [`SampleSource`].
    pub channel: u8,
    /// Samples averaged into one validated reading.
    pub samples_per_reading: u8,
    /// Resample attempts per sample before latching [`SensorState::Shutdown`].
    pub retries: u8,
    /// Maximum allowed deviation between consecutive accepted samples.
    pub variance: f32,
    /// Period means above this level classify as [`SensorCode::Disconnected`].
    pub disconnect_temperature: f32,
    /// Period means below this level classify as [`SensorCode::NoPower`].
    pub no_power_temperature: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            samples_per_reading: 10,
            retries: 4,
            variance: 5.0,
            disconnect_temperature: 400.0,
            no_power_temperature: -50.0,
        }
    }
}

/// The sensor acquisition state machine.
pub struct Sensor {
    config: SensorConfig,
    state: SensorState,
    code: SensorCode,
    samples: u8,
    accumulator: f32,
    previous: f32,
    temperature: Option<f32>,
}

impl Sensor {
    /// Creates a sensor with no validated data and a fresh period pending.
    pub fn new(config: SensorConfig) -> Self {
        Self {
            config,
            state: SensorState::HasNoData,
            code: SensorCode::Ok,
            samples: 0,
            accumulator: 0.0,
            previous: 0.0,
            temperature: None,
        }
    }

    /// Returns the acquisition state.
    pub fn state(&self) -> SensorState {
        self.state
    }

    /// Returns the latest diagnostic code.
    pub fn code(&self) -> SensorCode {
        self.code
    }

    /// Returns the last validated temperature, `Some` only in
    /// [`SensorState::HasData`].
    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    /// Returns the number of samples collected in the current period.
    pub fn samples(&self) -> u8 {
        self.samples
    }

    /// Returns the acquisition tuning.
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Starts a new sampling period.
    ///
    /// Idempotent; a period already in progress is truncated, so a caller
    /// may request a fresh reading on demand.
    pub fn start_reading(&mut self) {
        self.samples = 0;
    }

    /// Re-initializes the sensor, clearing a latched shutdown.
    pub fn reset(&mut self) {
        self.state = SensorState::HasNoData;
        self.code = SensorCode::Ok;
        self.samples = 0;
        self.accumulator = 0.0;
        self.temperature = None;
    }

    /// Collects one sample; to be invoked once per 10 ms tick.
    ///
    /// No-op while shut down and while the current period is complete but
    /// not yet restarted, so the sample count never exceeds
    /// `samples_per_reading`. Completing a period produces exactly one
    /// validated temperature or one fault classification.
    pub fn poll(&mut self, source: &mut impl SampleSource) -> SensorCode {
        if self.state == SensorState::Shutdown {
            return self.code;
        }
        if self.samples >= self.config.samples_per_reading {
            return self.code;
        }

        let new_period = self.samples == 0;
        if new_period {
            self.accumulator = 0.0;
        }
        let sample = match self.acquire(source, new_period) {
            Some(sample) => sample,
            None => {
                self.state = SensorState::Shutdown;
                self.code = SensorCode::BadReadings;
                self.temperature = None;
                #[cfg(feature = "defmt")]
                defmt::warn!("sensor shutdown: retry budget exhausted on unstable samples");
                return self.code;
            }
        };

        self.accumulator = self.accumulator + sample;
        self.samples += 1;
        if self.samples < self.config.samples_per_reading {
            return self.code;
        }

        let mean = self.accumulator / f32::from(self.samples);
        if mean > self.config.disconnect_temperature {
            self.state = SensorState::HasNoData;
            self.code = SensorCode::Disconnected;
            self.temperature = None;
            #[cfg(feature = "defmt")]
            defmt::warn!("sensor reading railed high: thermocouple disconnected");
        } else if mean < self.config.no_power_temperature {
            self.state = SensorState::HasNoData;
            self.code = SensorCode::NoPower;
            self.temperature = None;
            #[cfg(feature = "defmt")]
            defmt::warn!("sensor reading railed low: amplifier unpowered");
        } else {
            self.state = SensorState::HasData;
            self.code = SensorCode::Ok;
            self.temperature = Some(mean);
        }
        self.code
    }

    /// Takes one sample, resampling while it deviates from the previously
    /// accepted sample by the variance threshold or more. The first sample
    /// of a period seeds the reference and is accepted unconditionally.
    /// Returns `None` once the retry budget is spent.
    fn acquire(&mut self, source: &mut impl SampleSource, new_period: bool) -> Option<f32> {
        let mut sample = source.sample(self.config.channel);
        if new_period {
            self.previous = sample;
            return Some(sample);
        }
        for _ in 0..self.config.retries {
            if FloatCore::abs(sample - self.previous) < self.config.variance {
                self.previous = sample;
                return Some(sample);
            }
            sample = source.sample(self.config.channel);
        }
        None
    }
}

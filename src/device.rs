//! Device composition and the cooperative dispatch loop.
//!
//! [`Device`] owns every state machine (sensor, heater, PID, PWM, register
//! file) and fans the 10 ms tick out to them; nothing in the crate is a
//! global. The main loop of a firmware build calls [`Device::dispatch`]
//! once per iteration with the bus handler first in priority, or
//! [`Device::poll`] directly when there is no bus to service.

use num_traits::float::FloatCore;

use crate::heater::{Heater, HeaterConfig};
use crate::pid::{PidConfig, PidConfigBuilder};
use crate::pwm::{Pwm, PwmConfig, PwmDriver};
use crate::regs::{self, RegisterError, RegisterFile};
use crate::sensor::{SampleSource, Sensor, SensorConfig};
use crate::tick::{TickFlag, Ticker};

/// Base of the register file in the host bus address space; the region
/// below it belongs to the common bus protocol.
pub const REGISTER_BASE: u8 = 0x40;

/// Default PWM output frequency in Hz.
pub const PWM_FREQUENCY_HZ: f32 = 1000.0;

/// Outcome of one dispatch-loop entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// The handler consumed this loop iteration; restart at the highest
    /// priority entry. A pending tick stays pending.
    Again,
    /// Nothing urgent; execution continues down the priority list.
    Done,
}

/// The bus communication handler, serviced ahead of the tick every
/// dispatch iteration. Framing and command parsing live behind this trait;
/// the core only hands it the register file.
pub trait BusService {
    /// Services pending bus traffic against the register file.
    fn service(&mut self, regs: &mut RegisterFile) -> Dispatch;
}

/// Aggregate configuration for a [`Device`].
#[derive(Debug, Clone, Copy)]
pub struct DeviceConfig {
    /// Sensor acquisition tuning.
    pub sensor: SensorConfig,
    /// Heater supervision thresholds.
    pub heater: HeaterConfig,
    /// PID gains and limits.
    pub pid: PidConfig<f32>,
    /// PWM clocking parameters.
    pub pwm: PwmConfig,
    /// Initial PWM output frequency in Hz.
    pub pwm_frequency: f32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            sensor: SensorConfig::default(),
            heater: HeaterConfig::default(),
            pid: default_pid_config(),
            pwm: PwmConfig::default(),
            pwm_frequency: PWM_FREQUENCY_HZ,
        }
    }
}

/// Stock regulation tuning: a moderately aggressive P term with gentle I
/// and D, a small integration deadband, the 100 ms heater cadence, and
/// output bounded to the 0–100 duty range.
fn default_pid_config() -> PidConfig<f32> {
    PidConfigBuilder::default()
        .kp(5.0)
        .ki(0.1)
        .kd(0.4)
        .epsilon(0.01)
        .sample_time(0.1)
        .output_limits(0.0, 100.0)
        .build()
        .expect("stock PID tuning is valid")
}

/// The device control core: every state machine plus the cadence counters,
/// generic over the raw sample source and the PWM output driver.
pub struct Device<S: SampleSource, D: PwmDriver> {
    ticker: Ticker,
    source: S,
    sensor: Sensor,
    heater: Heater,
    pwm: Pwm<D>,
    regs: RegisterFile,
    uptime: u16,
    duty: f32,
}

impl<S: SampleSource, D: PwmDriver> Device<S, D> {
    /// Builds the device and publishes the initial state to the register
    /// file, so the host sees a coherent picture before the first tick.
    pub fn new(source: S, driver: D, config: DeviceConfig) -> Self {
        let mut device = Self {
            ticker: Ticker::new(),
            source,
            sensor: Sensor::new(config.sensor),
            heater: Heater::new(config.heater, config.pid),
            pwm: Pwm::new(driver, config.pwm, config.pwm_frequency),
            regs: RegisterFile::new(),
            uptime: 0,
            duty: 0.0,
        };
        device.publish();
        device
    }

    /// Runs one dispatch-loop iteration: the bus handler first, then the
    /// tick handler. [`Dispatch::Again`] from the bus defers the tick to a
    /// later iteration without losing it.
    pub fn dispatch(&mut self, tick: &TickFlag, bus: &mut impl BusService) {
        if bus.service(&mut self.regs) == Dispatch::Again {
            return;
        }
        self.poll(tick);
    }

    /// Drains one pending tick, if any, and runs the cadence callbacks to
    /// completion. Idempotent when no tick is pending; callable any number
    /// of times per main-loop iteration. Returns whether a tick was
    /// serviced.
    pub fn poll(&mut self, tick: &TickFlag) -> bool {
        if !tick.take() {
            return false;
        }
        self.tick_10ms();
        let cadence = self.ticker.advance();
        if cadence.hundred_ms {
            self.tick_100ms();
        }
        if cadence.one_sec {
            self.tick_1sec();
        }
        true
    }

    /// Arms the heater. The host-facing on switch; regulation starts at
    /// the next 100 ms tick with a validated reading.
    pub fn turn_heater_on(&mut self) {
        self.heater.turn_on();
    }

    /// Disarms the heater and forces the output off immediately rather
    /// than at the next 100 ms tick.
    pub fn turn_heater_off(&mut self) {
        self.heater.turn_off();
        self.duty = 0.0;
        self.pwm.set_duty(0.0);
    }

    /// Re-initializes the whole core: heater, sensor, PID history,
    /// registers and counters. The bus-level reset hook.
    pub fn reset(&mut self) {
        self.heater.reset();
        self.sensor.reset();
        self.ticker = Ticker::new();
        self.regs = RegisterFile::new();
        self.uptime = 0;
        self.duty = 0.0;
        self.pwm.set_duty(0.0);
        self.publish();
    }

    /// Reads one register byte at a host bus address.
    ///
    /// # Errors
    /// [`RegisterError::InvalidAddress`] when the address falls outside
    /// the device window.
    pub fn bus_read(&self, address: u8) -> Result<u8, RegisterError> {
        let local = address
            .checked_sub(REGISTER_BASE)
            .ok_or(RegisterError::InvalidAddress)?;
        self.regs.read(local)
    }

    /// Writes one register byte at a host bus address.
    ///
    /// # Errors
    /// [`RegisterError::InvalidAddress`] when the address falls outside
    /// the device window; nothing is mutated.
    pub fn bus_write(&mut self, address: u8, value: u8) -> Result<(), RegisterError> {
        let local = address
            .checked_sub(REGISTER_BASE)
            .ok_or(RegisterError::InvalidAddress)?;
        self.regs.write(local, value)
    }

    /// Returns the sensor state machine.
    pub fn sensor(&self) -> &Sensor {
        &self.sensor
    }

    /// Returns the heater state machine.
    pub fn heater(&self) -> &Heater {
        &self.heater
    }

    /// Returns the heater state machine for retuning.
    pub fn heater_mut(&mut self) -> &mut Heater {
        &mut self.heater
    }

    /// Returns the PWM actuation state.
    pub fn pwm(&self) -> &Pwm<D> {
        &self.pwm
    }

    /// Returns the register file.
    pub fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// Returns the register file mutably, as handed to the bus service.
    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    fn tick_10ms(&mut self) {
        self.sensor.poll(&mut self.source);
    }

    fn tick_100ms(&mut self) {
        let setpoint = regs::decode_setpoint(self.regs.word(regs::SETPOINT));
        self.heater.set_setpoint(setpoint);

        let duty = self.heater.poll(&mut self.sensor);
        self.pwm.set_duty(duty);
        self.duty = duty;
        self.publish();
    }

    fn tick_1sec(&mut self) {
        self.uptime = self.uptime.wrapping_add(1);
        self.regs.put_u16(regs::UPTIME, self.uptime);
    }

    fn publish(&mut self) {
        self.regs.put(regs::HEATER_STATE, self.heater.state() as u8);
        self.regs.put(regs::HEATER_CODE, self.heater.code() as u8);
        self.regs
            .put_u16(regs::SETPOINT, regs::encode_setpoint(self.heater.setpoint()));
        self.regs.put(regs::SENSOR_STATE, self.sensor.state() as u8);
        self.regs.put(regs::SENSOR_CODE, self.sensor.code() as u8);
        if let Some(temperature) = self.sensor.temperature() {
            self.regs
                .put_u16(regs::TEMPERATURE, regs::encode_temperature(temperature));
        }
        self.regs
            .put(regs::DUTY, FloatCore::round(self.duty) as u8);
        let config = self.heater.pid().config();
        self.regs.put_u16(regs::KP, regs::encode_gain(config.kp()));
        self.regs.put_u16(regs::KI, regs::encode_gain(config.ki()));
        self.regs.put_u16(regs::KD, regs::encode_gain(config.kd()));
        self.regs.put_u16(regs::UPTIME, self.uptime);
    }
}

//! Heater supervision state machine.
//!
//! Runs once per 100 ms tick. Each callback requests a fresh sensor period,
//! mirrors the validated temperature, advances the regulation timeouts and
//! closes the loop: the PID output is returned as the duty percentage for
//! the PWM actuator. Every fault path returns duty 0, so the heater always
//! degrades to inert.

use num_traits::float::FloatCore;

use crate::pid::{PidConfig, PidController};
use crate::sensor::{Sensor, SensorState};

/// Heater callbacks per second; the supervision cadence is 100 ms.
pub const TICKS_PER_SECOND: u32 = 10;

const TICK_SECONDS: f32 = 0.1;

/// Supervision state. The register interface reserves 0 for "not yet
/// published", so discriminants start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum HeaterState {
    /// Inert; no sensor readings are requested and duty stays 0.
    Off = 1,
    /// Armed; transitions to [`HeaterState::Heating`] on the first callback
    /// that sees a validated temperature.
    On = 2,
    /// Regulating toward the set-point, timeouts armed.
    Heating = 3,
    /// Holding the set-point; timeouts are no longer checked.
    AtTemperature = 4,
    /// Overheat cutoff tripped; temperature is recorded but nothing is
    /// actuated. Cleared by [`Heater::turn_on`].
    Cooling = 5,
    /// Terminal fault. Cleared only by [`Heater::turn_on`], which
    /// re-initializes the session.
    Shutdown = 6,
}

/// Diagnostic detail accompanying [`HeaterState`]. Fault codes latch until
/// the heater is explicitly re-initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum HeaterCode {
    /// Nothing wrong.
    Ok = 0,
    /// The temperature never left ambient within the ambient timeout:
    /// likely a disconnected heater element or a mis-mounted probe.
    AmbientTimedOut = 1,
    /// The temperature was still below the set-point at the regulation
    /// timeout: likely undersized power or an unreachable set-point.
    RegulationTimedOut = 2,
    /// The overheat cutoff temperature was reached.
    Overheat = 3,
    /// The sensor latched its own shutdown while the heater was active.
    SensorFault = 4,
}

/// Supervision thresholds and timeouts.
///
/// The two timeouts diagnose different hardware faults from the same safe
/// action: failing to leave ambient points at the heater circuit, rising too
/// slowly to reach the set-point points at the power budget.
#[derive(Debug, Clone, Copy)]
pub struct HeaterConfig {
    /// Seconds allowed to climb above `ambient_temperature` after heating
    /// starts.
    pub ambient_timeout: f32,
    /// Seconds allowed to reach the set-point after heating starts.
    pub regulation_timeout: f32,
    /// Temperatures below this are considered ambient.
    pub ambient_temperature: f32,
    /// Cutoff; at or above this the heater stops actuating and cools.
    pub overheat_temperature: f32,
    /// Band below the set-point within which regulation is considered
    /// achieved.
    pub regulation_range: f32,
}

impl Default for HeaterConfig {
    fn default() -> Self {
        Self {
            ambient_timeout: 90.0,
            regulation_timeout: 300.0,
            ambient_temperature: 40.0,
            overheat_temperature: 300.0,
            regulation_range: 2.0,
        }
    }
}

/// The heater supervision state machine. Owns the PID regulator; the sensor
/// is borrowed per callback so the device layer keeps ownership of both.
pub struct Heater {
    config: HeaterConfig,
    state: HeaterState,
    code: HeaterCode,
    temperature: f32,
    setpoint: f32,
    regulation_ticks: u32,
    ambient_timeout_ticks: u32,
    regulation_timeout_ticks: u32,
    pid: PidController<f32>,
}

impl Heater {
    /// Creates a heater in [`HeaterState::Off`].
    ///
    /// Timeouts are converted to whole tick counts up front; all elapsed
    /// time is tick-counted so the timeout comparisons are exact.
    pub fn new(config: HeaterConfig, pid_config: PidConfig<f32>) -> Self {
        let ambient_timeout_ticks =
            FloatCore::round(config.ambient_timeout * TICKS_PER_SECOND as f32) as u32;
        let regulation_timeout_ticks =
            FloatCore::round(config.regulation_timeout * TICKS_PER_SECOND as f32) as u32;
        Self {
            config,
            state: HeaterState::Off,
            code: HeaterCode::Ok,
            temperature: 0.0,
            setpoint: 0.0,
            regulation_ticks: 0,
            ambient_timeout_ticks,
            regulation_timeout_ticks,
            pid: PidController::new(pid_config),
        }
    }

    /// Returns the supervision state.
    pub fn state(&self) -> HeaterState {
        self.state
    }

    /// Returns the latched diagnostic code.
    pub fn code(&self) -> HeaterCode {
        self.code
    }

    /// Returns the last temperature mirrored from the sensor.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Returns the regulation set-point.
    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    /// Sets the regulation set-point. The only externally writable field;
    /// takes effect at the next callback.
    pub fn set_setpoint(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    /// Returns the seconds spent in [`HeaterState::Heating`] this session.
    pub fn elapsed_regulation(&self) -> f32 {
        self.regulation_ticks as f32 * TICK_SECONDS
    }

    /// Returns the supervision thresholds.
    pub fn config(&self) -> &HeaterConfig {
        &self.config
    }

    /// Returns the owned PID regulator.
    pub fn pid(&self) -> &PidController<f32> {
        &self.pid
    }

    /// Returns the owned PID regulator for tuning.
    pub fn pid_mut(&mut self) -> &mut PidController<f32> {
        &mut self.pid
    }

    /// Arms the heater.
    ///
    /// From [`HeaterState::Shutdown`] the session is re-initialized first:
    /// the diagnostic code, regulation timer and PID history are cleared.
    /// A no-op when already armed or regulating.
    pub fn turn_on(&mut self) {
        match self.state {
            HeaterState::Shutdown => {
                self.reinit();
                self.state = HeaterState::On;
            }
            HeaterState::Off | HeaterState::Cooling => {
                self.state = HeaterState::On;
            }
            HeaterState::On | HeaterState::Heating | HeaterState::AtTemperature => return,
        }
        #[cfg(feature = "defmt")]
        defmt::info!("heater armed");
    }

    /// Disarms the heater from any active state. A no-op while cooling or
    /// shut down.
    pub fn turn_off(&mut self) {
        match self.state {
            HeaterState::On | HeaterState::Heating | HeaterState::AtTemperature => {
                self.state = HeaterState::Off;
                #[cfg(feature = "defmt")]
                defmt::info!("heater disarmed");
            }
            HeaterState::Off | HeaterState::Cooling | HeaterState::Shutdown => {}
        }
    }

    /// Re-initializes the heater to [`HeaterState::Off`], clearing any
    /// latched fault, the PID history and the set-point. [`Heater::turn_on`]
    /// from shutdown keeps the set-point; this does not.
    pub fn reset(&mut self) {
        self.reinit();
        self.setpoint = 0.0;
        self.state = HeaterState::Off;
    }

    /// Runs one supervision step; to be invoked once per 100 ms tick.
    ///
    /// Returns the duty percentage for the PWM actuator. Inactive, waiting
    /// and fault paths all return 0.
    pub fn poll(&mut self, sensor: &mut Sensor) -> f32 {
        match self.state {
            HeaterState::Off | HeaterState::Shutdown => return 0.0,
            _ => {}
        }

        // Kick off the next period before inspecting the last one; the
        // state and temperature describe the period that just completed.
        sensor.start_reading();
        if sensor.state() == SensorState::Shutdown {
            self.state = HeaterState::Shutdown;
            self.code = HeaterCode::SensorFault;
            #[cfg(feature = "defmt")]
            defmt::warn!("heater shutdown: sensor fault");
            return 0.0;
        }
        let temperature = match sensor.temperature() {
            Some(temperature) => temperature,
            None => return 0.0,
        };
        self.temperature = temperature;

        match self.state {
            HeaterState::Cooling => 0.0,
            HeaterState::On => {
                self.regulation_ticks = 0;
                self.state = HeaterState::Heating;
                0.0
            }
            HeaterState::Heating => {
                self.regulation_ticks += 1;
                if temperature >= self.config.overheat_temperature {
                    self.trip_overheat();
                    return 0.0;
                }
                if temperature < self.config.ambient_temperature
                    && self.regulation_ticks >= self.ambient_timeout_ticks
                {
                    self.state = HeaterState::Shutdown;
                    self.code = HeaterCode::AmbientTimedOut;
                    #[cfg(feature = "defmt")]
                    defmt::warn!("heater shutdown: never left ambient");
                    return 0.0;
                }
                if temperature < self.setpoint
                    && self.regulation_ticks >= self.regulation_timeout_ticks
                {
                    self.state = HeaterState::Shutdown;
                    self.code = HeaterCode::RegulationTimedOut;
                    #[cfg(feature = "defmt")]
                    defmt::warn!("heater shutdown: regulation timed out");
                    return 0.0;
                }
                if temperature >= self.setpoint - self.config.regulation_range {
                    self.state = HeaterState::AtTemperature;
                }
                self.pid.compute(temperature, self.setpoint)
            }
            HeaterState::AtTemperature => {
                if temperature >= self.config.overheat_temperature {
                    self.trip_overheat();
                    return 0.0;
                }
                self.pid.compute(temperature, self.setpoint)
            }
            // Handled by the early return above.
            HeaterState::Off | HeaterState::Shutdown => 0.0,
        }
    }

    fn trip_overheat(&mut self) {
        self.state = HeaterState::Cooling;
        self.code = HeaterCode::Overheat;
        #[cfg(feature = "defmt")]
        defmt::warn!("heater overheat cutoff");
    }

    fn reinit(&mut self) {
        self.code = HeaterCode::Ok;
        self.temperature = 0.0;
        self.regulation_ticks = 0;
        self.pid.reset();
    }
}

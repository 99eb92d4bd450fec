//! Plant models for closed-loop testing.

/// A first-order thermal plant: a heated mass that relaxes toward the
/// drive-dependent steady state with a single time constant.
///
/// The steady-state temperature is `ambient + gain * duty`, so `gain` is
/// the temperature rise per duty percent at equilibrium. Integration is
/// forward Euler, which is ample for test steps far below the time
/// constant.
pub struct ThermalPlant {
    /// Ambient temperature the plant relaxes to with no drive.
    pub ambient: f32,
    /// Steady-state temperature rise per duty percent.
    pub gain: f32,
    /// Thermal time constant in seconds.
    pub time_constant: f32,
    temperature: f32,
}

impl ThermalPlant {
    /// Creates a plant resting at ambient.
    pub fn new(ambient: f32, gain: f32, time_constant: f32) -> Self {
        Self {
            ambient,
            gain,
            time_constant,
            temperature: ambient,
        }
    }

    /// Returns the plant temperature.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Advances the plant by `dt` seconds under `duty_percent` drive.
    pub fn step(&mut self, duty_percent: f32, dt: f32) {
        let duty = duty_percent.clamp(0.0, 100.0);
        let steady = self.ambient + self.gain * duty;
        self.temperature += (steady - self.temperature) * (dt / self.time_constant);
    }
}

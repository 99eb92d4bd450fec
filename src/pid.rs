//! Discrete PID controller for the heater regulation loop.
//!
//! The controller is fixed-step: the sample time is configuration, not
//! something measured at run time. The heater callback owns the cadence
//! (one computation per 100 ms tick at the device layer) and the integral
//! and derivative terms are only meaningful at that cadence.
//!
//! Two flavours are provided. [`FuncPidController::compute`] is functionally
//! pure (the caller threads a [`PidContext`] through every call), which
//! makes it easy to test and to reason about. [`PidController`] embeds the
//! context for callers that prefer a conventional mutable object.

use num_traits::float::FloatCore;

/// Errors reported when validating PID configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PidConfigError {
    /// The proportional gain must be positive and finite.
    #[cfg_attr(feature = "std", error("proportional gain must be positive and finite"))]
    InvalidProportionalGain,

    /// The integral gain must be non-negative and finite.
    #[cfg_attr(feature = "std", error("integral gain must be non-negative and finite"))]
    InvalidIntegralGain,

    /// The derivative gain must be non-negative and finite.
    #[cfg_attr(feature = "std", error("derivative gain must be non-negative and finite"))]
    InvalidDerivativeGain,

    /// The integration deadband must be non-negative and finite.
    #[cfg_attr(feature = "std", error("epsilon must be non-negative and finite"))]
    InvalidEpsilon,

    /// The sample time must be positive and finite.
    #[cfg_attr(feature = "std", error("sample time must be positive and finite"))]
    InvalidSampleTime,

    /// The output limits must satisfy `min < max` and contain no NaN.
    #[cfg_attr(feature = "std", error("output limits must satisfy min < max"))]
    InvalidOutputLimits,
}

/// Validated PID configuration: gains, deadband, sample time and output
/// saturation bounds.
#[derive(Copy, Clone, Debug)]
pub struct PidConfig<F: FloatCore> {
    /// Proportional gain coefficient.
    kp: F,

    /// Integral gain coefficient.
    ki: F,

    /// Derivative gain coefficient.
    kd: F,

    /// Integration deadband. While `|error| <= epsilon` the integral
    /// accumulator is frozen, so the controller cannot wind up while it is
    /// already holding the set-point.
    epsilon: F,

    /// Fixed sample time in seconds between successive `compute` calls.
    sample_time: F,

    /// Minimum output value. Defaults to negative infinity, i.e. no limit.
    output_min: F,

    /// Maximum output value. Defaults to positive infinity, i.e. no limit.
    output_max: F,
}

impl<F: FloatCore> Default for PidConfig<F> {
    fn default() -> Self {
        PidConfig {
            kp: F::one(),
            ki: F::zero(),
            kd: F::zero(),
            epsilon: F::zero(),
            sample_time: F::one(),
            output_min: -F::infinity(),
            output_max: F::infinity(),
        }
    }
}

impl<F: FloatCore> PidConfig<F> {
    /// Returns the proportional gain.
    pub fn kp(&self) -> F {
        self.kp
    }

    /// Returns the integral gain.
    pub fn ki(&self) -> F {
        self.ki
    }

    /// Returns the derivative gain.
    pub fn kd(&self) -> F {
        self.kd
    }

    /// Returns the integration deadband.
    pub fn epsilon(&self) -> F {
        self.epsilon
    }

    /// Returns the fixed sample time in seconds.
    pub fn sample_time(&self) -> F {
        self.sample_time
    }

    /// Returns the minimum output limit.
    pub fn output_min(&self) -> F {
        self.output_min
    }

    /// Returns the maximum output limit.
    pub fn output_max(&self) -> F {
        self.output_max
    }

    /// Convenience method that returns the three gains together as a tuple.
    pub fn gains(&self) -> (F, F, F) {
        (self.kp, self.ki, self.kd)
    }

    /// Sets the proportional gain.
    ///
    /// # Errors
    /// [`PidConfigError::InvalidProportionalGain`] if `kp` is not positive
    /// and finite; the stored value is unchanged.
    pub fn set_kp(&mut self, kp: F) -> Result<(), PidConfigError> {
        if kp <= F::zero() || !kp.is_finite() {
            return Err(PidConfigError::InvalidProportionalGain);
        }
        self.kp = kp;
        Ok(())
    }

    /// Sets the integral gain. Zero disables the integral term.
    ///
    /// # Errors
    /// [`PidConfigError::InvalidIntegralGain`] if `ki` is negative or not
    /// finite; the stored value is unchanged.
    pub fn set_ki(&mut self, ki: F) -> Result<(), PidConfigError> {
        if ki < F::zero() || !ki.is_finite() {
            return Err(PidConfigError::InvalidIntegralGain);
        }
        self.ki = ki;
        Ok(())
    }

    /// Sets the derivative gain. Zero disables the derivative term.
    ///
    /// # Errors
    /// [`PidConfigError::InvalidDerivativeGain`] if `kd` is negative or not
    /// finite; the stored value is unchanged.
    pub fn set_kd(&mut self, kd: F) -> Result<(), PidConfigError> {
        if kd < F::zero() || !kd.is_finite() {
            return Err(PidConfigError::InvalidDerivativeGain);
        }
        self.kd = kd;
        Ok(())
    }

    /// Convenience method to set all three gains together.
    pub fn set_gains(&mut self, kp: F, ki: F, kd: F) -> Result<(), PidConfigError> {
        self.set_kp(kp)?;
        self.set_ki(ki)?;
        self.set_kd(kd)
    }

    /// Sets the integration deadband.
    ///
    /// # Errors
    /// [`PidConfigError::InvalidEpsilon`] if `epsilon` is negative or not
    /// finite; the stored value is unchanged.
    pub fn set_epsilon(&mut self, epsilon: F) -> Result<(), PidConfigError> {
        if epsilon < F::zero() || !epsilon.is_finite() {
            return Err(PidConfigError::InvalidEpsilon);
        }
        self.epsilon = epsilon;
        Ok(())
    }

    /// Sets the fixed sample time in seconds.
    ///
    /// The integral accumulator and derivative are scaled by this value, so
    /// it must match the cadence the caller actually computes at.
    ///
    /// # Errors
    /// [`PidConfigError::InvalidSampleTime`] if `sample_time` is not
    /// positive and finite; the stored value is unchanged.
    pub fn set_sample_time(&mut self, sample_time: F) -> Result<(), PidConfigError> {
        if sample_time <= F::zero() || !sample_time.is_finite() {
            return Err(PidConfigError::InvalidSampleTime);
        }
        self.sample_time = sample_time;
        Ok(())
    }

    /// Sets the output saturation bounds. Infinite bounds disable clamping.
    ///
    /// # Errors
    /// [`PidConfigError::InvalidOutputLimits`] if `output_min >= output_max`
    /// or either bound is NaN; the stored values are unchanged.
    pub fn set_output_limits(&mut self, output_min: F, output_max: F) -> Result<(), PidConfigError> {
        if output_min >= output_max || output_min.is_nan() || output_max.is_nan() {
            return Err(PidConfigError::InvalidOutputLimits);
        }
        self.output_min = output_min;
        self.output_max = output_max;
        Ok(())
    }
}

/// Builder for [`PidConfig`], validating every value at `build` time.
#[derive(Copy, Clone, Debug)]
pub struct PidConfigBuilder<F: FloatCore> {
    kp: F,
    ki: F,
    kd: F,
    epsilon: F,
    sample_time: F,
    output_min: F,
    output_max: F,
}

impl<F: FloatCore> Default for PidConfigBuilder<F> {
    fn default() -> Self {
        let config = PidConfig::default();
        PidConfigBuilder {
            kp: config.kp,
            ki: config.ki,
            kd: config.kd,
            epsilon: config.epsilon,
            sample_time: config.sample_time,
            output_min: config.output_min,
            output_max: config.output_max,
        }
    }
}

impl<F: FloatCore> PidConfigBuilder<F> {
    /// Stages the proportional gain.
    pub fn kp(mut self, kp: F) -> Self {
        self.kp = kp;
        self
    }

    /// Stages the integral gain.
    pub fn ki(mut self, ki: F) -> Self {
        self.ki = ki;
        self
    }

    /// Stages the derivative gain.
    pub fn kd(mut self, kd: F) -> Self {
        self.kd = kd;
        self
    }

    /// Stages the integration deadband.
    pub fn epsilon(mut self, epsilon: F) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Stages the fixed sample time in seconds.
    pub fn sample_time(mut self, sample_time: F) -> Self {
        self.sample_time = sample_time;
        self
    }

    /// Stages the output saturation bounds.
    pub fn output_limits(mut self, output_min: F, output_max: F) -> Self {
        self.output_min = output_min;
        self.output_max = output_max;
        self
    }

    /// Validates the staged values and produces a [`PidConfig`].
    ///
    /// # Errors
    /// The first validation failure, in gain/epsilon/sample-time/limits
    /// order.
    pub fn build(self) -> Result<PidConfig<F>, PidConfigError> {
        let mut config = PidConfig::default();
        config.set_kp(self.kp)?;
        config.set_ki(self.ki)?;
        config.set_kd(self.kd)?;
        config.set_epsilon(self.epsilon)?;
        config.set_sample_time(self.sample_time)?;
        config.set_output_limits(self.output_min, self.output_max)?;
        Ok(config)
    }
}

/// The error history of a PID controller.
///
/// The context is reset only by [`PidContext::reset`] (or by constructing a
/// fresh one), never implicitly by a `compute` call: the integral term must
/// persist across computations within a regulation session or the control
/// output jumps discontinuously.
#[derive(Copy, Clone, Debug)]
pub struct PidContext<F: FloatCore> {
    error: F,
    prev_error: F,
    integral: F,
    derivative: F,
    output: F,
}

impl<F: FloatCore> PidContext<F> {
    /// Creates a zeroed context.
    pub fn new() -> Self {
        Self {
            error: F::zero(),
            prev_error: F::zero(),
            integral: F::zero(),
            derivative: F::zero(),
            output: F::zero(),
        }
    }

    /// Clears the error history.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Returns the error from the most recent computation.
    pub fn error(&self) -> F {
        self.error
    }

    /// Returns the integral accumulator.
    pub fn integral(&self) -> F {
        self.integral
    }

    /// Returns the derivative from the most recent computation.
    pub fn derivative(&self) -> F {
        self.derivative
    }

    /// Returns the clamped output of the most recent computation.
    pub fn output(&self) -> F {
        self.output
    }
}

impl<F: FloatCore> Default for PidContext<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// A functionally pure PID controller.
///
/// `compute` takes the error history by value and returns the updated copy
/// alongside the output, so the controller itself can stay immutable (and
/// shared) while the caller owns the state.
pub struct FuncPidController<F: FloatCore> {
    config: PidConfig<F>,
}

impl<F: FloatCore> FuncPidController<F> {
    /// Creates a controller from a validated configuration.
    pub fn new(config: PidConfig<F>) -> Self {
        FuncPidController { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PidConfig<F> {
        &self.config
    }

    /// Returns the configuration for on-the-fly tuning.
    pub fn config_mut(&mut self) -> &mut PidConfig<F> {
        &mut self.config
    }

    /// Runs one fixed-step computation and returns the clamped output with
    /// the updated context.
    ///
    /// The integral only accumulates while `|error|` exceeds the configured
    /// deadband, and the backward-difference derivative is taken on the
    /// error. Always produces a value; there are no failure modes.
    pub fn compute(&self, mut ctx: PidContext<F>, measured: F, setpoint: F) -> (F, PidContext<F>) {
        let dt = self.config.sample_time;
        let error = setpoint - measured;

        if error.abs() > self.config.epsilon {
            ctx.integral = ctx.integral + error * dt;
        }
        let derivative = (error - ctx.prev_error) / dt;

        let output =
            self.config.kp * error + self.config.ki * ctx.integral + self.config.kd * derivative;
        let output = if output > self.config.output_max {
            self.config.output_max
        } else if output < self.config.output_min {
            self.config.output_min
        } else {
            output
        };

        ctx.prev_error = error;
        ctx.error = error;
        ctx.derivative = derivative;
        ctx.output = output;
        (output, ctx)
    }
}

/// A stateful PID controller wrapping [`FuncPidController`] and an embedded
/// [`PidContext`].
pub struct PidController<F: FloatCore> {
    ctx: PidContext<F>,
    controller: FuncPidController<F>,
}

impl<F: FloatCore> PidController<F> {
    /// Creates a controller with a zeroed error history.
    pub fn new(config: PidConfig<F>) -> Self {
        Self {
            ctx: PidContext::new(),
            controller: FuncPidController::new(config),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PidConfig<F> {
        &self.controller.config
    }

    /// Returns the configuration for on-the-fly tuning.
    pub fn config_mut(&mut self) -> &mut PidConfig<F> {
        &mut self.controller.config
    }

    /// Returns the embedded error history.
    pub fn context(&self) -> &PidContext<F> {
        &self.ctx
    }

    /// Runs one fixed-step computation and returns the clamped output.
    pub fn compute(&mut self, measured: F, setpoint: F) -> F {
        let (output, ctx) = self.controller.compute(self.ctx, measured, setpoint);
        self.ctx = ctx;
        output
    }

    /// Explicitly clears the error history. This is the only way the
    /// history is ever discarded.
    pub fn reset(&mut self) {
        self.ctx.reset();
    }
}

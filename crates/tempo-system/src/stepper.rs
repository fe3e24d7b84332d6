//! Time steppers and their stability factors.
//!
//! The chooser core treats the integrator as a black box that reports one
//! number, [`TimeStepper::stable_step`]. The values below are the extent
//! of each scheme's stability region along the negative real axis,
//! normalized so that forward Euler is `1.0`.

/// A time-integration scheme, as seen by the step choosers.
pub trait TimeStepper: Send + 'static {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Order of accuracy.
    fn order(&self) -> usize;

    /// Stable step factor `σ`, relative to forward Euler. Always positive.
    fn stable_step(&self) -> f64;
}

/// First-order forward Euler.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardEuler;

impl TimeStepper for ForwardEuler {
    fn name(&self) -> &str {
        "ForwardEuler"
    }

    fn order(&self) -> usize {
        1
    }

    fn stable_step(&self) -> f64 {
        1.0
    }
}

/// Three-stage, third-order strong-stability-preserving Runge–Kutta.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rk3Ssp;

impl TimeStepper for Rk3Ssp {
    fn name(&self) -> &str {
        "Rk3Ssp"
    }

    fn order(&self) -> usize {
        3
    }

    fn stable_step(&self) -> f64 {
        1.256_372_663_309_164_5
    }
}

/// Classical four-stage, fourth-order Runge–Kutta.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClassicalRk4;

impl TimeStepper for ClassicalRk4 {
    fn name(&self) -> &str {
        "ClassicalRk4"
    }

    fn order(&self) -> usize {
        4
    }

    fn stable_step(&self) -> f64 {
        1.392_646_781_702_641_1
    }
}

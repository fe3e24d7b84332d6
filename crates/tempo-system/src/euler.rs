//! Newtonian Euler equations of compressible, inviscid flow.
//!
//! The characteristic speeds of the Euler system along a unit normal `n`
//! are `v·n - c`, `v·n` and `v·n + c`, where `c` is the sound speed. The
//! largest over all directions is therefore `|v| + c`.

use std::marker::PhantomData;

use crate::error::SystemError;
use crate::system::EvolutionSystem;

/// Ideal-fluid equation of state, `p = (γ - 1) ρ ε`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IdealFluid {
    adiabatic_index: f64,
}

impl IdealFluid {
    /// Create an ideal fluid with adiabatic index `γ`.
    ///
    /// Returns `None` unless `γ` is finite and greater than one.
    pub fn new(adiabatic_index: f64) -> Option<Self> {
        (adiabatic_index.is_finite() && adiabatic_index > 1.0).then_some(Self { adiabatic_index })
    }

    /// Monatomic ideal gas, `γ = 5/3`.
    pub fn monatomic() -> Self {
        Self {
            adiabatic_index: 5.0 / 3.0,
        }
    }

    /// The adiabatic index `γ`.
    pub fn adiabatic_index(&self) -> f64 {
        self.adiabatic_index
    }

    /// `c² = γ p / ρ`.
    pub fn sound_speed_squared(&self, mass_density: f64, pressure: f64) -> f64 {
        self.adiabatic_index * pressure / mass_density
    }
}

/// Primitive variables of the Euler system on one element.
///
/// Stored point-major: entry `i` of every array belongs to grid point `i`.
#[derive(Clone, Debug, PartialEq)]
pub struct EulerPrimitives<const DIM: usize> {
    mass_density: Vec<f64>,
    velocity: Vec<[f64; DIM]>,
    pressure: Vec<f64>,
    equation_of_state: IdealFluid,
}

impl<const DIM: usize> EulerPrimitives<DIM> {
    /// Bundle primitive arrays, checking that they agree in length.
    pub fn new(
        mass_density: Vec<f64>,
        velocity: Vec<[f64; DIM]>,
        pressure: Vec<f64>,
        equation_of_state: IdealFluid,
    ) -> Result<Self, SystemError> {
        let n = mass_density.len();
        if velocity.len() != n {
            return Err(SystemError::ShapeMismatch {
                what: "velocity",
                expected: n,
                found: velocity.len(),
            });
        }
        if pressure.len() != n {
            return Err(SystemError::ShapeMismatch {
                what: "pressure",
                expected: n,
                found: pressure.len(),
            });
        }
        Ok(Self {
            mass_density,
            velocity,
            pressure,
            equation_of_state,
        })
    }

    /// A spatially constant state on `points` grid points.
    pub fn uniform(
        points: usize,
        mass_density: f64,
        velocity: [f64; DIM],
        pressure: f64,
        equation_of_state: IdealFluid,
    ) -> Self {
        Self {
            mass_density: vec![mass_density; points],
            velocity: vec![velocity; points],
            pressure: vec![pressure; points],
            equation_of_state,
        }
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.mass_density.len()
    }

    /// Whether the state covers zero points.
    pub fn is_empty(&self) -> bool {
        self.mass_density.is_empty()
    }

    /// The equation of state closing the system.
    pub fn equation_of_state(&self) -> &IdealFluid {
        &self.equation_of_state
    }

    /// Mutable access to the velocity at each point.
    pub fn velocity_mut(&mut self) -> &mut [[f64; DIM]] {
        &mut self.velocity
    }

    /// Mutable access to the pressure at each point.
    pub fn pressure_mut(&mut self) -> &mut [f64] {
        &mut self.pressure
    }
}

/// The Newtonian Euler system in `DIM` spatial dimensions.
#[derive(Clone, Copy, Debug, Default)]
pub struct NewtonianEuler<const DIM: usize> {
    _dim: PhantomData<[(); DIM]>,
}

impl<const DIM: usize> EvolutionSystem for NewtonianEuler<DIM> {
    const NAME: &'static str = "NewtonianEuler";
    const VOLUME_DIM: usize = DIM;
    type FieldState = EulerPrimitives<DIM>;

    fn largest_characteristic_speed(state: &EulerPrimitives<DIM>) -> Result<f64, SystemError> {
        let eos = state.equation_of_state;
        let mut largest = 0.0f64;
        for i in 0..state.len() {
            let rho = state.mass_density[i];
            let p = state.pressure[i];
            if !(rho.is_finite() && rho > 0.0) {
                return Err(SystemError::UnphysicalState {
                    point: i,
                    reason: format!("mass density {rho} is not positive"),
                });
            }
            if !(p.is_finite() && p >= 0.0) {
                return Err(SystemError::UnphysicalState {
                    point: i,
                    reason: format!("pressure {p} is negative or non-finite"),
                });
            }
            let v2: f64 = state.velocity[i].iter().map(|v| v * v).sum();
            if !v2.is_finite() {
                return Err(SystemError::UnphysicalState {
                    point: i,
                    reason: "velocity is non-finite".to_string(),
                });
            }
            let speed = v2.sqrt() + eos.sound_speed_squared(rho, p).sqrt();
            largest = largest.max(speed);
        }
        Ok(largest)
    }
}

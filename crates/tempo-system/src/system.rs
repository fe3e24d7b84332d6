//! The [`EvolutionSystem`] trait bundle.

use crate::error::SystemError;

/// A system of conservation laws evolved on the mesh.
///
/// The step-control core never looks inside the field state. It needs the
/// static dimensionality of the system and one derived number, the
/// largest characteristic speed.
///
/// # Examples
///
/// ```
/// use tempo_system::{EvolutionSystem, SystemError};
///
/// /// Linear advection at a fixed speed.
/// struct Advection;
///
/// impl EvolutionSystem for Advection {
///     const NAME: &'static str = "Advection";
///     const VOLUME_DIM: usize = 1;
///     type FieldState = f64;
///
///     fn largest_characteristic_speed(speed: &f64) -> Result<f64, SystemError> {
///         Ok(speed.abs())
///     }
/// }
///
/// assert_eq!(Advection::largest_characteristic_speed(&-2.0).unwrap(), 2.0);
/// ```
pub trait EvolutionSystem: Send + Sync + 'static {
    /// Human-readable name for logging.
    const NAME: &'static str;

    /// Number of spatial dimensions.
    const VOLUME_DIM: usize;

    /// Whatever local field state the speed computation reads.
    type FieldState;

    /// Fastest signal speed supported by `state`, never negative.
    fn largest_characteristic_speed(state: &Self::FieldState) -> Result<f64, SystemError>;
}

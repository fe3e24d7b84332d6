//! The [`StabilityQuantitySource`] trait and its element implementation.

use std::fmt;

use tempo_core::StepQuantity;

use crate::error::SystemError;
use crate::mesh::ElementMesh;
use crate::system::EvolutionSystem;

/// Supplies the per-element quantities a chooser may ask for.
///
/// Queried synchronously by the driver before choosers run.
pub trait StabilityQuantitySource {
    /// Smallest grid spacing in this element.
    fn minimum_grid_spacing(&self) -> f64;

    /// Largest characteristic speed of this element's field state.
    fn largest_characteristic_speed(&self) -> Result<f64, SystemError>;

    /// Resolve a local quantity by tag.
    ///
    /// Returns `Ok(None)` for quantities this source does not own (the
    /// stability factor and the globally reduced quantities).
    fn quantity(&self, quantity: StepQuantity) -> Result<Option<f64>, SystemError> {
        match quantity {
            StepQuantity::MinimumGridSpacing => Ok(Some(self.minimum_grid_spacing())),
            StepQuantity::LargestCharacteristicSpeed => {
                self.largest_characteristic_speed().map(Some)
            }
            StepQuantity::StabilityFactor
            | StepQuantity::GlobalMinimumGridSpacing
            | StepQuantity::GlobalLargestCharacteristicSpeed => Ok(None),
        }
    }
}

/// A mesh element paired with its field state.
pub struct Element<'a, S: EvolutionSystem, const DIM: usize> {
    mesh: &'a ElementMesh<DIM>,
    state: &'a S::FieldState,
}

impl<'a, S: EvolutionSystem, const DIM: usize> Element<'a, S, DIM> {
    /// Pair a mesh with field state, checking dimensions agree.
    pub fn new(mesh: &'a ElementMesh<DIM>, state: &'a S::FieldState) -> Result<Self, SystemError> {
        if S::VOLUME_DIM != DIM {
            return Err(SystemError::DimensionMismatch {
                system: S::VOLUME_DIM,
                mesh: DIM,
            });
        }
        Ok(Self { mesh, state })
    }

    /// The element's mesh.
    pub fn mesh(&self) -> &ElementMesh<DIM> {
        self.mesh
    }
}

impl<S: EvolutionSystem, const DIM: usize> fmt::Debug for Element<'_, S, DIM> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("system", &S::NAME)
            .field("extents", &self.mesh.extents())
            .finish()
    }
}

impl<S: EvolutionSystem, const DIM: usize> StabilityQuantitySource for Element<'_, S, DIM> {
    fn minimum_grid_spacing(&self) -> f64 {
        self.mesh.minimum_grid_spacing()
    }

    fn largest_characteristic_speed(&self) -> Result<f64, SystemError> {
        S::largest_characteristic_speed(self.state)
    }
}

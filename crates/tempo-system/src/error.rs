//! Error types for mesh construction and field-state evaluation.

use std::fmt;

/// Errors arising from element meshes or PDE field state.
#[derive(Clone, Debug, PartialEq)]
pub enum SystemError {
    /// Field arrays or coordinates disagree on the number of grid points.
    ShapeMismatch {
        /// What was being checked.
        what: &'static str,
        /// Expected number of points.
        expected: usize,
        /// Number of points supplied.
        found: usize,
    },
    /// A grid point holds a state the equations cannot describe.
    UnphysicalState {
        /// Index of the first offending grid point.
        point: usize,
        /// What is wrong with it.
        reason: String,
    },
    /// A mesh has fewer than two points along some axis.
    DegenerateMesh {
        /// The axis with too few points.
        axis: usize,
        /// Number of points along that axis.
        extent: usize,
    },
    /// The mesh dimension differs from the system's volume dimension.
    DimensionMismatch {
        /// Dimension the system declares.
        system: usize,
        /// Dimension of the mesh.
        mesh: usize,
    },
}

impl fmt::Display for SystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShapeMismatch {
                what,
                expected,
                found,
            } => {
                write!(f, "{what}: expected {expected} points, found {found}")
            }
            Self::UnphysicalState { point, reason } => {
                write!(f, "unphysical state at point {point}: {reason}")
            }
            Self::DegenerateMesh { axis, extent } => {
                write!(
                    f,
                    "mesh axis {axis} has {extent} points (at least 2 required)"
                )
            }
            Self::DimensionMismatch { system, mesh } => {
                write!(
                    f,
                    "system is {system}-dimensional but the mesh is {mesh}-dimensional"
                )
            }
        }
    }
}

impl std::error::Error for SystemError {}

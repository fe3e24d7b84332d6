//! PDE system bundle, element meshes, and time steppers.
//!
//! These are the collaborators a step chooser draws its inputs from. The
//! chooser core only consumes three numbers from them per evaluation: the
//! minimum grid spacing of an element, the stability factor of the time
//! stepper, and the largest characteristic speed of the local field state.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod euler;
pub mod mesh;
pub mod source;
pub mod stepper;
pub mod system;

pub use error::SystemError;
pub use euler::{EulerPrimitives, IdealFluid, NewtonianEuler};
pub use mesh::ElementMesh;
pub use source::{Element, StabilityQuantitySource};
pub use stepper::{ClassicalRk4, ForwardEuler, Rk3Ssp, TimeStepper};
pub use system::EvolutionSystem;

//! Core types for the tempo adaptive time-step controller.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace: step
//! requests and decisions, the quantity tags choosers declare as their
//! inputs, error types, and the little-endian codec primitives used by
//! the migration format.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod decision;
pub mod error;
pub mod quantity;

pub use decision::{
    AggregatedDecision, ChooserDecision, StepDirection, StepRequest, UNCONSTRAINED_GOAL,
};
pub use error::{ChooserError, MigrateError};
pub use quantity::{QuantityCompute, QuantitySet, StepQuantity};

//! Step chooser contract, evaluation context, and decision aggregation.
//!
//! A [`StepChooser`] proposes a bound on the next step and judges the step
//! just taken. The [`StepChooserRegistry`] runs every registered chooser
//! and reduces their verdicts into one
//! [`AggregatedDecision`](tempo_core::AggregatedDecision).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod chooser;
pub mod context;
pub mod registry;

pub use chooser::{Migratable, StepChooser};
pub use context::StepContext;
pub use registry::{DecisionAccumulator, PendingDecision, StepChooserRegistry};

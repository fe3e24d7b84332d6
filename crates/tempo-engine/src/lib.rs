//! Adaptive time-step driver for tempo.
//!
//! Ties the chooser registry into a time-integration loop:
//!
//! - [`ElementDriver`] runs the per-element step protocol: resolve
//!   quantities, evaluate choosers, accept or retry, notify events.
//! - [`AllReduce`] provides the cross-element reduction that global
//!   choosers wait on.
//! - [`ControllerConfig`] and [`ChooserConfig`] describe a run.
//!
//! Each element owns its driver exclusively. Drivers share nothing but the
//! reduction channels, and are snapshotted and restored whole when an
//! element moves between workers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod driver;
pub mod events;
pub mod metrics;
pub mod reduction;

pub use config::{build_registry, ChooserConfig, ConfigError, ControllerConfig};
pub use driver::{ElementDriver, PendingStep, StepError, StepOutcome};
pub use events::{EventRunner, NoEvents};
pub use metrics::ControllerMetrics;
pub use reduction::{
    AllReduce, GlobalQuantities, LocalContribution, ReductionError, ReductionHandle,
};

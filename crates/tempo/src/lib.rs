//! Tempo: adaptive time-step control for element-based PDE solvers.
//!
//! This is the facade crate that re-exports the public API of every tempo
//! sub-crate. Most users only need this one dependency.
//!
//! # Quick start
//!
//! ```rust
//! use tempo::prelude::*;
//!
//! let registry = StepChooserRegistry::new()
//!     .with(Cfl::with_dimension(0.5, 1))?
//!     .with(Maximum::new(0.02))?;
//!
//! let ctx = StepContext::new(0.01)
//!     .with(StepQuantity::MinimumGridSpacing, 0.1)
//!     .with(StepQuantity::StabilityFactor, 1.0)
//!     .with(StepQuantity::LargestCharacteristicSpeed, 2.0);
//!
//! let decision = registry.decide(&ctx)?;
//! assert!(decision.step_accepted);
//! assert_eq!(decision.next_step_size_goal, 0.02);
//! assert_eq!(decision.binding, Some(1));
//! # Ok::<(), ChooserError>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tempo-core` | Quantity tags, decisions, errors, byte codec |
//! | [`system`] | `tempo-system` | Evolution systems, meshes, steppers, elements |
//! | [`chooser`] | `tempo-chooser` | `StepChooser` trait, context, registry |
//! | [`choosers`] | `tempo-choosers` | CFL, global CFL, maximum, growth limit |
//! | [`migrate`] | `tempo-migrate` | Registry checkpoints and type table |
//! | [`engine`] | `tempo-engine` | Per-element driver, config, reduction |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Quantity tags, decision values, errors and the byte codec (`tempo-core`).
pub use tempo_core as types;

/// Evolution systems and the quantities they expose (`tempo-system`).
///
/// Implement [`system::EvolutionSystem`] to plug a new equation set into
/// the CFL choosers.
pub use tempo_system as system;

/// The chooser trait and decision aggregation (`tempo-chooser`).
pub use tempo_chooser as chooser;

/// Built-in step choosers (`tempo-choosers`).
pub use tempo_choosers as choosers;

/// Registry checkpoints for element migration (`tempo-migrate`).
pub use tempo_migrate as migrate;

/// Per-element step driver and cross-element reduction (`tempo-engine`).
pub use tempo_engine as engine;

/// Common imports for typical tempo usage.
pub mod prelude {
    // Core values
    pub use tempo_core::{
        AggregatedDecision, ChooserDecision, ChooserError, MigrateError, QuantitySet,
        StepQuantity, StepRequest,
    };

    // Systems
    pub use tempo_system::{
        Element, ElementMesh, EvolutionSystem, StabilityQuantitySource, TimeStepper,
    };

    // Choosers
    pub use tempo_chooser::{Migratable, StepChooser, StepChooserRegistry, StepContext};
    pub use tempo_choosers::{Cfl, GlobalCfl, LimitIncrease, Maximum};

    // Migration
    pub use tempo_migrate::{ChooserTypes, UnknownTypePolicy};

    // Engine
    pub use tempo_engine::{
        AllReduce, ChooserConfig, ControllerConfig, ElementDriver, StepError, StepOutcome,
    };
}

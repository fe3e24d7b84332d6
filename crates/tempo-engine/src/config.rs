//! Controller configuration, validation, and error types.
//!
//! [`ControllerConfig`] holds the step limits of one element driver and is
//! checked once, when the driver is built. [`ChooserConfig`] describes one
//! chooser; [`build_registry`] turns a list of them into a registry.
//! Chooser parameters themselves are checked at first evaluation.

use std::error::Error;
use std::fmt;

use tempo_chooser::StepChooserRegistry;
use tempo_choosers::{Cfl, GlobalCfl, LimitIncrease, Maximum};
use tempo_core::ChooserError;
use tempo_system::EvolutionSystem;

// ── ControllerConfig ───────────────────────────────────────────────

/// Step-size limits for one element driver.
///
/// The sign of `initial_step` sets the integration direction for the whole
/// run; the other limits are magnitudes.
#[derive(Clone, Debug, PartialEq)]
pub struct ControllerConfig {
    /// First step to attempt. Negative integrates backward. Default: 1e-3.
    pub initial_step: f64,
    /// Smallest step magnitude the driver will attempt. Default: 1e-12.
    pub min_step: f64,
    /// Largest step magnitude, also used when no chooser constrains the
    /// step. Default: 1.0.
    pub max_step: f64,
    /// Consecutive rejections tolerated before giving up. Default: 8.
    pub max_retries: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            initial_step: 1e-3,
            min_step: 1e-12,
            max_step: 1.0,
            max_retries: 8,
        }
    }
}

impl ControllerConfig {
    /// Check every invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Limits are finite and positive.
        for (name, value) in [("min_step", self.min_step), ("max_step", self.max_step)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidStep { name, value });
            }
        }
        // 2. Limits are ordered.
        if self.min_step > self.max_step {
            return Err(ConfigError::StepBoundsInverted {
                min: self.min_step,
                max: self.max_step,
            });
        }
        // 3. The initial step is non-zero and inside the limits.
        if !self.initial_step.is_finite() || self.initial_step == 0.0 {
            return Err(ConfigError::InvalidStep {
                name: "initial_step",
                value: self.initial_step,
            });
        }
        let magnitude = self.initial_step.abs();
        if magnitude < self.min_step || magnitude > self.max_step {
            return Err(ConfigError::InitialStepOutOfRange {
                initial: self.initial_step,
                min: self.min_step,
                max: self.max_step,
            });
        }
        Ok(())
    }

    /// `+1.0` for forward integration, `-1.0` for backward.
    pub fn direction(&self) -> f64 {
        1.0f64.copysign(self.initial_step)
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by [`ControllerConfig::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A step parameter is NaN, infinite, zero, or negative.
    InvalidStep {
        /// Which parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// `min_step` exceeds `max_step`.
    StepBoundsInverted {
        /// Configured minimum.
        min: f64,
        /// Configured maximum.
        max: f64,
    },
    /// `|initial_step|` lies outside `[min_step, max_step]`.
    InitialStepOutOfRange {
        /// Configured initial step.
        initial: f64,
        /// Configured minimum.
        min: f64,
        /// Configured maximum.
        max: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStep { name, value } => {
                write!(f, "{name} must be finite and positive, got {value}")
            }
            Self::StepBoundsInverted { min, max } => {
                write!(f, "min_step ({min}) exceeds max_step ({max})")
            }
            Self::InitialStepOutOfRange { initial, min, max } => {
                write!(f, "initial_step {initial} outside [{min}, {max}] in magnitude")
            }
        }
    }
}

impl Error for ConfigError {}

// ── ChooserConfig ──────────────────────────────────────────────────

/// Declarative description of one chooser.
#[derive(Clone, Debug, PartialEq)]
pub enum ChooserConfig {
    /// [`Cfl`] on local quantities.
    Cfl {
        /// CFL safety factor.
        safety_factor: f64,
    },
    /// [`GlobalCfl`] on reduced quantities.
    GlobalCfl {
        /// CFL safety factor.
        safety_factor: f64,
    },
    /// [`Maximum`] step cap.
    Maximum {
        /// Largest allowed step magnitude.
        value: f64,
    },
    /// [`LimitIncrease`] growth limit.
    LimitIncrease {
        /// Largest growth ratio per step.
        factor: f64,
    },
}

/// Build a registry from `configs`, in order, for system `S`.
///
/// CFL choosers take their dimension from `S`.
pub fn build_registry<S: EvolutionSystem>(
    configs: &[ChooserConfig],
) -> Result<StepChooserRegistry, ChooserError> {
    let mut registry = StepChooserRegistry::new();
    for config in configs {
        match *config {
            ChooserConfig::Cfl { safety_factor } => {
                registry.push(Box::new(Cfl::for_system::<S>(safety_factor)))?
            }
            ChooserConfig::GlobalCfl { safety_factor } => {
                registry.push(Box::new(GlobalCfl::for_system::<S>(safety_factor)))?
            }
            ChooserConfig::Maximum { value } => registry.push(Box::new(Maximum::new(value)))?,
            ChooserConfig::LimitIncrease { factor } => {
                registry.push(Box::new(LimitIncrease::new(factor)))?
            }
        }
    }
    Ok(registry)
}

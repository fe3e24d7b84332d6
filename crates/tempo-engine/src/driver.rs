//! Per-element step driver.
//!
//! [`ElementDriver`] glues one chooser registry into the time-integration
//! loop of one mesh element. Each step goes through two calls:
//!
//! 1. [`begin_step`](ElementDriver::begin_step) after the caller has
//!    taken the trial step. Local quantities are resolved and local
//!    choosers evaluated. If any chooser needs global data the returned
//!    [`PendingStep`] carries this element's [`LocalContribution`].
//! 2. [`complete_step`](ElementDriver::complete_step) once the reduction
//!    (if any) has settled. Deferred choosers run, the decision is
//!    aggregated, and time either advances or the step is retried.
//!
//! Snapshots may only be taken between steps.

use std::error::Error;
use std::fmt;
use std::io::{Read, Write};

use tempo_chooser::{PendingDecision, StepChooserRegistry, StepContext};
use tempo_core::codec::{
    read_f64_le, read_u32_le, read_u64_le, write_f64_le, write_u32_le, write_u64_le,
};
use tempo_core::{ChooserError, MigrateError, QuantityCompute, QuantitySet, StepQuantity};
use tempo_migrate::{
    restore_registry, snapshot_registry, ChooserTypes, HashingReader, HashingWriter,
    RestoreReport, UnknownTypePolicy,
};
use tempo_system::{StabilityQuantitySource, SystemError, TimeStepper};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ControllerConfig};
use crate::events::EventRunner;
use crate::metrics::ControllerMetrics;
use crate::reduction::{GlobalQuantities, LocalContribution, ReductionError, ReductionHandle};

// ── StepError ──────────────────────────────────────────────────────

/// Errors raised by [`ElementDriver`].
///
/// All of them end the run for this element.
#[derive(Debug)]
pub enum StepError {
    /// The controller configuration is invalid.
    Config(ConfigError),
    /// A chooser failed.
    Chooser(ChooserError),
    /// The PDE system could not produce a quantity.
    System(SystemError),
    /// A snapshot could not be written or read.
    Migrate(MigrateError),
    /// The cross-element reduction failed.
    Reduction(ReductionError),
    /// A deferred chooser exists but no reduced quantities were supplied.
    ReductionRequired,
    /// `begin_step` was called while a step was already pending.
    StepInProgress,
    /// `complete_step` was called with no step pending.
    NoStepInProgress,
    /// A snapshot was requested while a step was pending.
    MigrationDuringStep,
    /// Too many consecutive rejections.
    RetriesExhausted {
        /// Rejections in a row, including the last one.
        retries: u32,
        /// Time at which the driver is stuck.
        time: f64,
    },
    /// The choosers asked for a step below the configured minimum.
    ///
    /// After an accepted step, the step is committed first: time has
    /// advanced and events have run.
    StepTooSmall {
        /// The requested step.
        step: f64,
        /// The configured minimum magnitude.
        min_step: f64,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Chooser(e) => write!(f, "chooser: {e}"),
            Self::System(e) => write!(f, "system: {e}"),
            Self::Migrate(e) => write!(f, "migration: {e}"),
            Self::Reduction(e) => write!(f, "reduction: {e}"),
            Self::ReductionRequired => {
                write!(f, "a deferred chooser needs reduced quantities, none supplied")
            }
            Self::StepInProgress => write!(f, "a step is already in progress"),
            Self::NoStepInProgress => write!(f, "no step is in progress"),
            Self::MigrationDuringStep => {
                write!(f, "cannot snapshot while a step decision is pending")
            }
            Self::RetriesExhausted { retries, time } => {
                write!(f, "step rejected {retries} times in a row at t={time}")
            }
            Self::StepTooSmall { step, min_step } => {
                write!(f, "requested step {step} is below the minimum {min_step}")
            }
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Chooser(e) => Some(e),
            Self::System(e) => Some(e),
            Self::Migrate(e) => Some(e),
            Self::Reduction(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for StepError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<ChooserError> for StepError {
    fn from(e: ChooserError) -> Self {
        Self::Chooser(e)
    }
}

impl From<SystemError> for StepError {
    fn from(e: SystemError) -> Self {
        Self::System(e)
    }
}

impl From<MigrateError> for StepError {
    fn from(e: MigrateError) -> Self {
        Self::Migrate(e)
    }
}

impl From<ReductionError> for StepError {
    fn from(e: ReductionError) -> Self {
        Self::Reduction(e)
    }
}

// ── PendingStep / StepOutcome ──────────────────────────────────────

/// A step whose local choosers have run.
#[derive(Debug)]
#[must_use]
pub struct PendingStep {
    decision: PendingDecision,
    context: StepContext,
    contribution: Option<LocalContribution>,
}

impl PendingStep {
    /// This element's input to the reduction, if one is needed.
    pub fn contribution(&self) -> Option<LocalContribution> {
        self.contribution
    }

    /// Whether [`ElementDriver::complete_step`] needs reduced quantities.
    pub fn needs_reduction(&self) -> bool {
        self.decision.needs_reduction()
    }

    /// The context the choosers were evaluated against.
    pub fn context(&self) -> &StepContext {
        &self.context
    }
}

/// What happened to the trial step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
    /// Time advanced.
    Accepted {
        /// Time after the step.
        time: f64,
        /// The step taken.
        step: f64,
        /// Trial step for the next call.
        next_step: f64,
    },
    /// Time stays put and the step is retried smaller.
    Rejected {
        /// Unchanged time.
        time: f64,
        /// The step that was rejected.
        step: f64,
        /// Step to retry with.
        retry_step: f64,
    },
}

impl StepOutcome {
    /// Whether the step was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// The trial step the driver will use next.
    pub fn next_trial_step(&self) -> f64 {
        match *self {
            Self::Accepted { next_step, .. } => next_step,
            Self::Rejected { retry_step, .. } => retry_step,
        }
    }
}

// ── ElementDriver ──────────────────────────────────────────────────

/// Adaptive step control for one mesh element.
///
/// Owns the element's chooser registry and time-step state. Only the
/// owning task touches it; `ElementDriver` is `Send` so it can be moved
/// to another worker between steps.
pub struct ElementDriver {
    registry: StepChooserRegistry,
    stepper: Box<dyn TimeStepper>,
    config: ControllerConfig,
    time: f64,
    trial_step: f64,
    accepted_steps: u64,
    retries: u32,
    in_step: bool,
    metrics: ControllerMetrics,
}

// Compile-time assertion: ElementDriver is Send.
const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<ElementDriver>();
    }
};

impl ElementDriver {
    /// A driver at `t = 0` whose first trial step is `config.initial_step`.
    pub fn new(
        registry: StepChooserRegistry,
        stepper: Box<dyn TimeStepper>,
        config: ControllerConfig,
    ) -> Result<Self, StepError> {
        config.validate()?;
        Ok(Self {
            trial_step: config.initial_step,
            registry,
            stepper,
            config,
            time: 0.0,
            accepted_steps: 0,
            retries: 0,
            in_step: false,
            metrics: ControllerMetrics::default(),
        })
    }

    /// The step size to attempt next.
    pub fn trial_step(&self) -> f64 {
        self.trial_step
    }

    /// Current simulation time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Number of accepted steps so far.
    pub fn accepted_steps(&self) -> u64 {
        self.accepted_steps
    }

    /// Consecutive rejections of the current step.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Whether a step is waiting for [`complete_step`](Self::complete_step).
    pub fn is_mid_step(&self) -> bool {
        self.in_step
    }

    /// The chooser registry.
    pub fn registry(&self) -> &StepChooserRegistry {
        &self.registry
    }

    /// The controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Counters accumulated over the run.
    pub fn metrics(&self) -> &ControllerMetrics {
        &self.metrics
    }

    fn resolve(
        &self,
        source: &dyn StabilityQuantitySource,
        wanted: QuantitySet,
        ctx: &mut StepContext,
    ) -> Result<(), SystemError> {
        for quantity in wanted.iter() {
            let value = match quantity.compute() {
                QuantityCompute::StabilityFactorCompute => Some(self.stepper.stable_step()),
                QuantityCompute::GlobalReduction => None,
                QuantityCompute::MinimumGridSpacingCompute
                | QuantityCompute::LargestCharacteristicSpeedCompute => source.quantity(quantity)?,
            };
            if let Some(value) = value {
                ctx.set(quantity, value);
            }
        }
        Ok(())
    }

    fn contribution(
        &self,
        source: &dyn StabilityQuantitySource,
    ) -> Result<Option<LocalContribution>, SystemError> {
        if !self.registry.has_deferred() {
            return Ok(None);
        }
        let deferred = self.registry.deferred_requirements();
        let mut local = LocalContribution::identity();
        if deferred.contains(StepQuantity::GlobalMinimumGridSpacing) {
            local.minimum_grid_spacing = source.minimum_grid_spacing();
        }
        if deferred.contains(StepQuantity::GlobalLargestCharacteristicSpeed) {
            local.largest_characteristic_speed = source.largest_characteristic_speed()?;
        }
        Ok(Some(local))
    }

    /// Judge the trial step just taken against local data.
    pub fn begin_step(
        &mut self,
        source: &dyn StabilityQuantitySource,
    ) -> Result<PendingStep, StepError> {
        if self.in_step {
            return Err(StepError::StepInProgress);
        }
        let mut context = StepContext::new(self.trial_step);
        self.resolve(source, self.registry.requirements(), &mut context)?;
        let contribution = self.contribution(source)?;
        let decision = self.registry.decide_local(&context)?;
        self.in_step = true;
        Ok(PendingStep {
            decision,
            context,
            contribution,
        })
    }

    /// Finish the step once `global` (if needed) is known.
    pub fn complete_step(
        &mut self,
        pending: PendingStep,
        global: Option<GlobalQuantities>,
        events: &mut dyn EventRunner,
    ) -> Result<StepOutcome, StepError> {
        if !self.in_step {
            return Err(StepError::NoStepInProgress);
        }
        self.in_step = false;
        let mut context = pending.context;
        match global {
            Some(global) => global.apply(&mut context),
            None if pending.decision.needs_reduction() => return Err(StepError::ReductionRequired),
            None => {}
        }

        let decision = pending.decision.finish(&self.registry, &context)?;
        let binding = decision
            .binding
            .and_then(|i| self.registry.get(i))
            .map(|c| c.name().to_string());
        let step = self.trial_step;
        self.metrics
            .record(decision.step_accepted, step, binding.as_deref());
        debug!(
            time = self.time,
            step,
            goal = decision.next_step_size_goal,
            accepted = decision.step_accepted,
            binding = binding.as_deref().unwrap_or("none"),
            "step decision"
        );

        let magnitude = if decision.is_unconstrained() {
            self.config.max_step
        } else {
            decision.next_step_size_goal.abs().min(self.config.max_step)
        };
        let next = magnitude.copysign(step);
        let too_small = StepError::StepTooSmall {
            step: next,
            min_step: self.config.min_step,
        };

        if decision.step_accepted {
            // The step itself is committed even when its successor is too small.
            self.time += step;
            self.accepted_steps += 1;
            self.retries = 0;
            events.on_step_accepted(self.time, step);
            if magnitude < self.config.min_step {
                return Err(too_small);
            }
            self.trial_step = next;
            Ok(StepOutcome::Accepted {
                time: self.time,
                step,
                next_step: next,
            })
        } else {
            if magnitude < self.config.min_step {
                return Err(too_small);
            }
            self.retries += 1;
            warn!(
                time = self.time,
                step,
                retry = next,
                retries = self.retries,
                "step rejected"
            );
            if self.retries > self.config.max_retries {
                return Err(StepError::RetriesExhausted {
                    retries: self.retries,
                    time: self.time,
                });
            }
            self.trial_step = next;
            Ok(StepOutcome::Rejected {
                time: self.time,
                step,
                retry_step: next,
            })
        }
    }

    /// Run a whole step when no chooser needs global data.
    pub fn step_local(
        &mut self,
        source: &dyn StabilityQuantitySource,
        events: &mut dyn EventRunner,
    ) -> Result<StepOutcome, StepError> {
        if self.registry.has_deferred() {
            return Err(StepError::ReductionRequired);
        }
        let pending = self.begin_step(source)?;
        self.complete_step(pending, None, events)
    }

    /// Run a whole step, taking part in `reduction` when needed.
    ///
    /// Every element of the reduction must call this (or contribute
    /// directly) each round, or the others block.
    pub fn step_reduced(
        &mut self,
        source: &dyn StabilityQuantitySource,
        reduction: &ReductionHandle,
        events: &mut dyn EventRunner,
    ) -> Result<StepOutcome, StepError> {
        let pending = self.begin_step(source)?;
        let global = match pending.contribution() {
            Some(local) => Some(reduction.contribute(local)?),
            None => None,
        };
        self.complete_step(pending, global, events)
    }

    // ── Migration ──────────────────────────────────────────────

    /// Write the registry and the time-step state.
    ///
    /// The configuration and the stepper are not included; the
    /// destination supplies them to [`restore`](Self::restore).
    pub fn snapshot(&self, w: &mut dyn Write) -> Result<(), StepError> {
        if self.in_step {
            return Err(StepError::MigrationDuringStep);
        }
        snapshot_registry(w, &self.registry)?;
        let mut hw = HashingWriter::new(w);
        write_f64_le(&mut hw, self.time)?;
        write_f64_le(&mut hw, self.trial_step)?;
        write_u64_le(&mut hw, self.accepted_steps)?;
        write_u32_le(&mut hw, self.retries)?;
        let checksum = hw.hash();
        drop(hw);
        write_u64_le(w, checksum)?;
        info!(
            time = self.time,
            accepted = self.accepted_steps,
            choosers = self.registry.len(),
            "driver snapshot taken"
        );
        Ok(())
    }

    /// Rebuild a driver from a [`snapshot`](Self::snapshot).
    ///
    /// Metrics start from zero on the destination.
    pub fn restore(
        r: &mut dyn Read,
        types: &ChooserTypes,
        policy: UnknownTypePolicy,
        stepper: Box<dyn TimeStepper>,
        config: ControllerConfig,
    ) -> Result<(Self, RestoreReport), StepError> {
        config.validate()?;
        let (registry, report) = restore_registry(r, types, policy)?;
        let mut hr = HashingReader::new(r);
        let time = read_f64_le(&mut hr)?;
        let trial_step = read_f64_le(&mut hr)?;
        let accepted_steps = read_u64_le(&mut hr)?;
        let retries = read_u32_le(&mut hr)?;
        let computed = hr.hash();
        drop(hr);
        let recorded = read_u64_le(r)?;
        if recorded != computed {
            return Err(MigrateError::ChecksumMismatch { recorded, computed }.into());
        }
        info!(time, accepted = accepted_steps, "driver restored");
        Ok((
            Self {
                registry,
                stepper,
                config,
                time,
                trial_step,
                accepted_steps,
                retries,
                in_step: false,
                metrics: ControllerMetrics::default(),
            },
            report,
        ))
    }
}

impl fmt::Debug for ElementDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementDriver")
            .field("registry", &self.registry)
            .field("stepper", &self.stepper.name())
            .field("time", &self.time)
            .field("trial_step", &self.trial_step)
            .field("accepted_steps", &self.accepted_steps)
            .field("retries", &self.retries)
            .field("in_step", &self.in_step)
            .finish()
    }
}

//! Chooser registry and decision aggregation.
//!
//! [`StepChooserRegistry`] holds the configured choosers of one element.
//! Each step it evaluates them and reduces the verdicts:
//!
//! - the binding goal is the one with the smallest magnitude, ties going
//!   to the earliest registered chooser;
//! - the step is accepted only if every chooser accepts it;
//! - the sign of the goal follows the step that was taken.
//!
//! Choosers that need cross-element data are evaluated in a second phase
//! ([`PendingDecision::finish`]) once the reduction has settled.

use std::fmt;

use smallvec::SmallVec;
use tempo_core::{AggregatedDecision, ChooserDecision, ChooserError, QuantitySet};
use tracing::trace;

use crate::chooser::StepChooser;
use crate::context::StepContext;

// ── Accumulator ────────────────────────────────────────────────────

/// Running reduction of chooser decisions.
#[derive(Clone, Debug)]
pub struct DecisionAccumulator {
    /// `(registration index, magnitude)` of the binding goal so far.
    best: Option<(usize, f64)>,
    accepted: bool,
    evaluated: usize,
}

impl DecisionAccumulator {
    /// An accumulator that has seen no decisions: unconstrained, accepted.
    pub fn new() -> Self {
        Self {
            best: None,
            accepted: true,
            evaluated: 0,
        }
    }

    /// Fold in the decision of the chooser registered at `index`.
    ///
    /// Rejects NaN or infinite goals instead of letting them reach the
    /// minimum.
    pub fn absorb(
        &mut self,
        index: usize,
        chooser: &str,
        decision: ChooserDecision,
    ) -> Result<(), ChooserError> {
        let goal = decision.request.size_goal;
        if !goal.is_finite() {
            return Err(ChooserError::InvalidGoal {
                chooser: chooser.to_string(),
                value: goal,
            });
        }
        self.accepted &= decision.accept_current_step;
        self.evaluated += 1;

        trace!(
            chooser,
            index,
            goal,
            accept = decision.accept_current_step,
            hint = %decision.request.direction_hint,
            "chooser evaluated"
        );

        if decision.request.is_unconstrained() {
            return Ok(());
        }
        let magnitude = goal.abs();
        let replace = match self.best {
            None => true,
            Some((best_index, best)) => {
                magnitude < best || (magnitude == best && index < best_index)
            }
        };
        if replace {
            self.best = Some((index, magnitude));
        }
        Ok(())
    }

    /// Whether every decision so far accepted the current step.
    pub fn accepted(&self) -> bool {
        self.accepted
    }

    /// Number of decisions absorbed.
    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    /// Registration index of the binding chooser so far.
    pub fn binding(&self) -> Option<usize> {
        self.best.map(|(index, _)| index)
    }

    /// Produce the aggregate, signing the goal like `last_step`.
    pub fn finish(&self, last_step: f64) -> AggregatedDecision {
        match self.best {
            Some((index, magnitude)) => AggregatedDecision {
                next_step_size_goal: magnitude.copysign(last_step),
                step_accepted: self.accepted,
                binding: Some(index),
            },
            None => AggregatedDecision {
                step_accepted: self.accepted,
                ..AggregatedDecision::unconstrained(last_step)
            },
        }
    }
}

impl Default for DecisionAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

// ── Pending decision ───────────────────────────────────────────────

/// A decision whose local choosers have run and whose deferred choosers
/// are waiting for a cross-element reduction.
#[derive(Clone, Debug)]
#[must_use]
pub struct PendingDecision {
    accumulator: DecisionAccumulator,
    deferred: SmallVec<[usize; 4]>,
    last_step: f64,
}

impl PendingDecision {
    /// Registration indices of the choosers still to run.
    pub fn deferred(&self) -> &[usize] {
        &self.deferred
    }

    /// Whether any chooser is waiting on a reduction.
    pub fn needs_reduction(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// The step the decision is about.
    pub fn last_step(&self) -> f64 {
        self.last_step
    }

    /// Partial reduction over the choosers evaluated so far.
    pub fn accumulator(&self) -> &DecisionAccumulator {
        &self.accumulator
    }

    /// Evaluate the deferred choosers against `ctx` and aggregate.
    ///
    /// `registry` must be the registry that produced this pending decision.
    pub fn finish(
        self,
        registry: &StepChooserRegistry,
        ctx: &StepContext,
    ) -> Result<AggregatedDecision, ChooserError> {
        let mut accumulator = self.accumulator;
        for &index in &self.deferred {
            let chooser = registry
                .get(index)
                .ok_or_else(|| ChooserError::Configuration {
                    chooser: format!("#{index}"),
                    reason: "registry changed while a decision was pending".to_string(),
                })?;
            let decision = chooser.evaluate(ctx)?;
            accumulator.absorb(index, chooser.name(), decision)?;
        }
        Ok(accumulator.finish(self.last_step))
    }
}

// ── Registry ───────────────────────────────────────────────────────

/// Ordered collection of the choosers configured for one element.
///
/// Order comes from configuration and only matters for tie-breaking.
#[derive(Default)]
pub struct StepChooserRegistry {
    choosers: Vec<Box<dyn StepChooser>>,
}

impl StepChooserRegistry {
    /// An empty registry. Its decision is always unconstrained and accepted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a chooser.
    ///
    /// Fails with [`ChooserError::Configuration`] when the chooser's
    /// declarations disagree with each other:
    ///
    /// - it claims to use only local data but declares a quantity that
    ///   needs a cross-element reduction;
    /// - its compute tags miss the derivation of one of its argument tags;
    /// - it needs global data but refuses to be delayed until the
    ///   reduction settles.
    pub fn push(&mut self, chooser: Box<dyn StepChooser>) -> Result<(), ChooserError> {
        let misconfigured = |reason: String| ChooserError::Configuration {
            chooser: chooser.name().to_string(),
            reason,
        };
        if chooser.uses_local_data() {
            if let Some(q) = chooser.argument_tags().iter().find(|q| !q.is_local()) {
                return Err(misconfigured(format!("declares local data but reads {q}")));
            }
        } else if !chooser.can_be_delayed() {
            return Err(misconfigured(
                "reads global data but cannot be delayed past the reduction".to_string(),
            ));
        }
        let computes = chooser.compute_tags();
        if let Some(q) = chooser
            .argument_tags()
            .iter()
            .find(|q| !computes.contains(&q.compute()))
        {
            return Err(misconfigured(format!(
                "reads {q} but does not declare {:?}",
                q.compute()
            )));
        }
        trace!(
            chooser = chooser.name(),
            local = chooser.uses_local_data(),
            delayable = chooser.can_be_delayed(),
            "chooser registered"
        );
        self.choosers.push(chooser);
        Ok(())
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, chooser: impl StepChooser) -> Result<Self, ChooserError> {
        self.push(Box::new(chooser))?;
        Ok(self)
    }

    /// Number of registered choosers.
    pub fn len(&self) -> usize {
        self.choosers.len()
    }

    /// Whether no chooser is registered.
    pub fn is_empty(&self) -> bool {
        self.choosers.is_empty()
    }

    /// The chooser registered at `index`.
    pub fn get(&self, index: usize) -> Option<&dyn StepChooser> {
        self.choosers.get(index).map(|c| c.as_ref())
    }

    /// Iterate over the choosers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn StepChooser> + '_ {
        self.choosers.iter().map(|c| c.as_ref())
    }

    /// Union of every chooser's argument tags.
    pub fn requirements(&self) -> QuantitySet {
        self.iter()
            .flat_map(|c| c.argument_tags().iter())
            .collect()
    }

    /// Argument tags of the choosers that run before the reduction.
    pub fn local_requirements(&self) -> QuantitySet {
        self.iter()
            .filter(|c| c.uses_local_data())
            .flat_map(|c| c.argument_tags().iter())
            .collect()
    }

    /// Argument tags of the choosers that wait for the reduction.
    pub fn deferred_requirements(&self) -> QuantitySet {
        self.iter()
            .filter(|c| !c.uses_local_data())
            .flat_map(|c| c.argument_tags().iter())
            .collect()
    }

    /// Whether any chooser must wait for cross-element data.
    pub fn has_deferred(&self) -> bool {
        self.iter().any(|c| !c.uses_local_data())
    }

    /// Evaluate every chooser against one context and aggregate.
    pub fn decide(&self, ctx: &StepContext) -> Result<AggregatedDecision, ChooserError> {
        self.decide_local(ctx)?.finish(self, ctx)
    }

    /// Evaluate only the local choosers; defer the rest.
    pub fn decide_local(&self, ctx: &StepContext) -> Result<PendingDecision, ChooserError> {
        let mut accumulator = DecisionAccumulator::new();
        let mut deferred = SmallVec::new();
        for (index, chooser) in self.choosers.iter().enumerate() {
            if chooser.uses_local_data() {
                let decision = chooser.evaluate(ctx)?;
                accumulator.absorb(index, chooser.name(), decision)?;
            } else {
                deferred.push(index);
            }
        }
        Ok(PendingDecision {
            accumulator,
            deferred,
            last_step: ctx.last_step(),
        })
    }
}

impl Clone for StepChooserRegistry {
    fn clone(&self) -> Self {
        Self {
            choosers: self.choosers.iter().map(|c| c.clone_box()).collect(),
        }
    }
}

impl fmt::Debug for StepChooserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|c| c.name())).finish()
    }
}

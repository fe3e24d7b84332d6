//! Reusable chooser test fixtures.
//!
//! - [`FixedChooser`] returns a fixed goal and verdict, optionally deferred
//!   behind the cross-element reduction.
//! - [`FailingChooser`] fails deterministically after N evaluations.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempo_chooser::{Migratable, StepChooser, StepContext};
use tempo_core::codec::{
    read_f64_le, read_length_prefixed_str, read_u8, write_f64_le, write_length_prefixed_str,
    write_u8,
};
use tempo_core::{
    ChooserDecision, ChooserError, MigrateError, QuantityCompute, StepQuantity, StepRequest,
};

/// Proposes `goal` every step and accepts or rejects per `accept`.
///
/// A deferred fixture declares the global spacing as input, so it only
/// evaluates once a reduction has supplied that quantity.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedChooser {
    pub name: String,
    pub goal: f64,
    pub accept: bool,
    pub deferred: bool,
}

impl FixedChooser {
    pub fn new(name: impl Into<String>, goal: f64, accept: bool) -> Self {
        Self {
            name: name.into(),
            goal,
            accept,
            deferred: false,
        }
    }

    /// Same as [`new`](Self::new) but evaluated after the reduction.
    pub fn deferred(name: impl Into<String>, goal: f64, accept: bool) -> Self {
        Self {
            deferred: true,
            ..Self::new(name, goal, accept)
        }
    }
}

impl StepChooser for FixedChooser {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn argument_tags(&self) -> &'static [StepQuantity] {
        if self.deferred {
            &[StepQuantity::GlobalMinimumGridSpacing]
        } else {
            &[]
        }
    }

    fn compute_tags(&self) -> &'static [QuantityCompute] {
        if self.deferred {
            &[QuantityCompute::GlobalReduction]
        } else {
            &[]
        }
    }

    fn uses_local_data(&self) -> bool {
        !self.deferred
    }

    fn can_be_delayed(&self) -> bool {
        true
    }

    fn evaluate(&self, ctx: &StepContext) -> Result<ChooserDecision, ChooserError> {
        if self.deferred {
            ctx.require(StepQuantity::GlobalMinimumGridSpacing, &self.name)?;
        }
        Ok(ChooserDecision {
            request: StepRequest::toward(self.goal, ctx.last_step()),
            accept_current_step: self.accept,
        })
    }

    fn write_state(&self, w: &mut dyn Write) -> Result<(), MigrateError> {
        write_length_prefixed_str(w, &self.name)?;
        write_f64_le(w, self.goal)?;
        write_u8(w, u8::from(self.accept))?;
        write_u8(w, u8::from(self.deferred))
    }

    fn clone_box(&self) -> Box<dyn StepChooser> {
        Box::new(self.clone())
    }
}

impl Migratable for FixedChooser {
    const TYPE_TAG: &'static str = "Fixed";

    fn read_state(r: &mut dyn Read) -> Result<Self, MigrateError> {
        Ok(Self {
            name: read_length_prefixed_str(r)?,
            goal: read_f64_le(r)?,
            accept: read_u8(r)? != 0,
            deferred: read_u8(r)? != 0,
        })
    }
}

/// Succeeds `succeed_count` times with an unconstrained decision, then
/// returns a configuration error on every later call.
///
/// Clones share the call counter.
#[derive(Clone, Debug)]
pub struct FailingChooser {
    pub succeed_count: usize,
    call_count: Arc<AtomicUsize>,
}

impl FailingChooser {
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// How many times `evaluate()` has been called.
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl StepChooser for FailingChooser {
    fn type_tag(&self) -> &'static str {
        "Failing"
    }

    fn argument_tags(&self) -> &'static [StepQuantity] {
        &[]
    }

    fn compute_tags(&self) -> &'static [QuantityCompute] {
        &[]
    }

    fn uses_local_data(&self) -> bool {
        true
    }

    fn can_be_delayed(&self) -> bool {
        false
    }

    fn evaluate(&self, _ctx: &StepContext) -> Result<ChooserDecision, ChooserError> {
        let n = self.call_count.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(ChooserError::Configuration {
                chooser: self.name().to_string(),
                reason: format!(
                    "deliberate failure after {} successful calls",
                    self.succeed_count
                ),
            });
        }
        Ok(ChooserDecision::unconstrained())
    }

    fn write_state(&self, w: &mut dyn Write) -> Result<(), MigrateError> {
        let count = u32::try_from(self.succeed_count).unwrap_or(u32::MAX);
        tempo_core::codec::write_u32_le(w, count)
    }

    fn clone_box(&self) -> Box<dyn StepChooser> {
        Box::new(self.clone())
    }
}

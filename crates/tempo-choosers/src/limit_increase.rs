//! Growth limit relative to the step just taken.

use std::io::{Read, Write};

use tempo_chooser::{Migratable, StepChooser, StepContext};
use tempo_core::codec::{read_f64_le, write_f64_le};
use tempo_core::{
    ChooserDecision, ChooserError, MigrateError, QuantityCompute, StepDirection, StepQuantity,
    StepRequest,
};

use crate::cfl::unconstrained;

/// Limits the next step to `factor` times the step just taken.
///
/// Always accepts: the current step was already taken at its size, so
/// it cannot violate a limit on growth. A zero-length last step gives no
/// reference to grow from and leaves the next step unconstrained.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LimitIncrease {
    factor: f64,
}

impl LimitIncrease {
    /// A chooser allowing growth by at most `factor` per step.
    pub fn new(factor: f64) -> Self {
        Self { factor }
    }

    /// The configured growth factor.
    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl Default for LimitIncrease {
    fn default() -> Self {
        Self::new(f64::NAN)
    }
}

impl StepChooser for LimitIncrease {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
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
        true
    }

    fn evaluate(&self, ctx: &StepContext) -> Result<ChooserDecision, ChooserError> {
        if !(self.factor.is_finite() && self.factor > 1.0) {
            return Err(ChooserError::Configuration {
                chooser: self.name().to_string(),
                reason: format!("growth factor must be finite and above 1, got {}", self.factor),
            });
        }
        let last = ctx.last_step();
        let bound = self.factor * last.abs();
        if bound == 0.0 || !bound.is_finite() {
            return Ok(unconstrained(last));
        }
        Ok(ChooserDecision {
            request: StepRequest {
                size_goal: bound.copysign(last),
                direction_hint: StepDirection::Expand,
            },
            accept_current_step: true,
        })
    }

    fn write_state(&self, w: &mut dyn Write) -> Result<(), MigrateError> {
        write_f64_le(w, self.factor)
    }

    fn clone_box(&self) -> Box<dyn StepChooser> {
        Box::new(*self)
    }
}

impl Migratable for LimitIncrease {
    const TYPE_TAG: &'static str = "LimitIncrease";

    fn read_state(r: &mut dyn Read) -> Result<Self, MigrateError> {
        Ok(Self::new(read_f64_le(r)?))
    }
}

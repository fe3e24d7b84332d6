//! Fixed upper bound on the step size.

use std::io::{Read, Write};

use tempo_chooser::{Migratable, StepChooser, StepContext};
use tempo_core::codec::{read_f64_le, write_f64_le};
use tempo_core::{
    ChooserDecision, ChooserError, MigrateError, QuantityCompute, StepQuantity, StepRequest,
};

/// Caps every step at a configured magnitude.
///
/// Rejects a step already taken above the cap. The default instance is
/// unset (NaN) and fails at first evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Maximum {
    value: f64,
}

impl Maximum {
    /// A chooser that caps the step magnitude at `value`.
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    /// The configured cap.
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Default for Maximum {
    fn default() -> Self {
        Self::new(f64::NAN)
    }
}

impl StepChooser for Maximum {
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
        if !(self.value.is_finite() && self.value > 0.0) {
            return Err(ChooserError::Configuration {
                chooser: self.name().to_string(),
                reason: format!("maximum step must be finite and positive, got {}", self.value),
            });
        }
        let last = ctx.last_step();
        Ok(ChooserDecision {
            request: StepRequest::toward(self.value, last),
            accept_current_step: last.abs() <= self.value,
        })
    }

    fn write_state(&self, w: &mut dyn Write) -> Result<(), MigrateError> {
        write_f64_le(w, self.value)
    }

    fn clone_box(&self) -> Box<dyn StepChooser> {
        Box::new(*self)
    }
}

impl Migratable for Maximum {
    const TYPE_TAG: &'static str = "Maximum";

    fn read_state(r: &mut dyn Read) -> Result<Self, MigrateError> {
        Ok(Self::new(read_f64_le(r)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caps_and_judges_the_step() {
        let max = Maximum::new(0.1);
        let d = max.evaluate(&StepContext::new(-0.05)).unwrap();
        assert_eq!(d.request.size_goal, -0.1);
        assert!(d.accept_current_step);

        let d = max.evaluate(&StepContext::new(0.2)).unwrap();
        assert_eq!(d.request.size_goal, 0.1);
        assert!(!d.accept_current_step);
    }

    #[test]
    fn unset_or_non_positive_rejected() {
        for max in [Maximum::default(), Maximum::new(0.0), Maximum::new(-1.0)] {
            assert!(matches!(
                max.evaluate(&StepContext::new(0.1)),
                Err(ChooserError::Configuration { .. })
            ));
        }
    }

    #[test]
    fn state_round_trips() {
        let mut buf = Vec::new();
        Maximum::new(2.5).write_state(&mut buf).unwrap();
        assert_eq!(Maximum::read_state(&mut buf.as_slice()).unwrap().value(), 2.5);
    }
}

//! Evaluation context passed to choosers.
//!
//! [`StepContext`] carries the resolved values of the quantity tags plus
//! the step just taken. It is an explicit value threaded through each
//! evaluation; nothing a chooser reads comes from global state.

use tempo_core::{ChooserError, QuantitySet, StepQuantity};

/// Resolved inputs for one chooser evaluation.
///
/// Built by the driver from the argument tags of the registered choosers.
/// Quantities that were not resolved read as `None`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepContext {
    values: [Option<f64>; StepQuantity::COUNT],
    last_step: f64,
}

impl StepContext {
    /// A context with no quantities resolved.
    ///
    /// `last_step` is the signed size of the step just taken.
    pub fn new(last_step: f64) -> Self {
        Self {
            values: [None; StepQuantity::COUNT],
            last_step,
        }
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, quantity: StepQuantity, value: f64) -> Self {
        self.set(quantity, value);
        self
    }

    /// Record the value of a quantity, replacing any earlier value.
    pub fn set(&mut self, quantity: StepQuantity, value: f64) {
        self.values[quantity.index()] = Some(value);
    }

    /// The value of a quantity, if resolved.
    pub fn get(&self, quantity: StepQuantity) -> Option<f64> {
        self.values[quantity.index()]
    }

    /// The value of a quantity a chooser declared as an argument.
    pub fn require(&self, quantity: StepQuantity, chooser: &str) -> Result<f64, ChooserError> {
        self.get(quantity).ok_or_else(|| ChooserError::MissingQuantity {
            chooser: chooser.to_string(),
            quantity,
        })
    }

    /// Signed size of the step just taken.
    pub fn last_step(&self) -> f64 {
        self.last_step
    }

    /// The set of resolved quantities.
    pub fn available(&self) -> QuantitySet {
        StepQuantity::ALL
            .into_iter()
            .filter(|q| self.values[q.index()].is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_quantity_is_missing() {
        let ctx = StepContext::new(0.1);
        assert_eq!(ctx.get(StepQuantity::StabilityFactor), None);
        let err = ctx.require(StepQuantity::StabilityFactor, "Cfl").unwrap_err();
        assert_eq!(
            err,
            ChooserError::MissingQuantity {
                chooser: "Cfl".into(),
                quantity: StepQuantity::StabilityFactor,
            }
        );
        assert!(ctx.available().is_empty());
    }

    #[test]
    fn resolved_quantities_are_visible() {
        let ctx = StepContext::new(-0.5)
            .with(StepQuantity::MinimumGridSpacing, 0.1)
            .with(StepQuantity::GlobalLargestCharacteristicSpeed, 3.0);
        assert_eq!(ctx.last_step(), -0.5);
        assert_eq!(ctx.require(StepQuantity::MinimumGridSpacing, "x").unwrap(), 0.1);
        assert_eq!(ctx.available().len(), 2);
        assert!(ctx.available().needs_reduction());
    }

    #[test]
    fn set_overwrites() {
        let mut ctx = StepContext::new(1.0);
        ctx.set(StepQuantity::StabilityFactor, 1.0);
        ctx.set(StepQuantity::StabilityFactor, 2.0);
        assert_eq!(ctx.get(StepQuantity::StabilityFactor), Some(2.0));
    }
}

//! Step requests and the decisions built from them.
//!
//! A chooser produces a [`ChooserDecision`]; the registry reduces a set of
//! those into one [`AggregatedDecision`] per step.

use std::fmt;

/// Magnitude of the "unconstrained" step goal.
///
/// Finite, so the aggregation minimum never has to handle
/// infinity, and a driver that sees this value falls back to its own
/// configured maximum step.
pub const UNCONSTRAINED_GOAL: f64 = f64::MAX;

/// How a proposed goal relates to the step just taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepDirection {
    /// The goal is at least as large as the step just taken.
    Expand,
    /// The goal is smaller than the step just taken.
    Shrink,
    /// The chooser imposes no limit this step.
    Unconstrained,
}

impl fmt::Display for StepDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expand => write!(f, "expand"),
            Self::Shrink => write!(f, "shrink"),
            Self::Unconstrained => write!(f, "unconstrained"),
        }
    }
}

/// The largest step magnitude a chooser judges safe.
///
/// `size_goal` carries the sign of the integration direction. Choosers are
/// free to produce either sign; the aggregator reconciles the final sign
/// with the direction of the step that was taken.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepRequest {
    /// Proposed step size, signed like the integration direction.
    pub size_goal: f64,
    /// Whether this goal grows or shrinks the step.
    pub direction_hint: StepDirection,
}

impl StepRequest {
    /// The sentinel request that imposes no limit.
    pub fn unconstrained() -> Self {
        Self {
            size_goal: UNCONSTRAINED_GOAL,
            direction_hint: StepDirection::Unconstrained,
        }
    }

    /// Build a request for `bound`, signed like `last_step`.
    ///
    /// The hint is [`StepDirection::Shrink`] when `bound` is smaller than
    /// the magnitude of `last_step` and [`StepDirection::Expand`] otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use tempo_core::{StepDirection, StepRequest};
    ///
    /// let req = StepRequest::toward(0.5, -1.0);
    /// assert_eq!(req.size_goal, -0.5);
    /// assert_eq!(req.direction_hint, StepDirection::Shrink);
    /// ```
    pub fn toward(bound: f64, last_step: f64) -> Self {
        let magnitude = bound.abs();
        let direction_hint = if magnitude < last_step.abs() {
            StepDirection::Shrink
        } else {
            StepDirection::Expand
        };
        Self {
            size_goal: magnitude.copysign(last_step),
            direction_hint,
        }
    }

    /// Magnitude of the goal.
    pub fn magnitude(&self) -> f64 {
        self.size_goal.abs()
    }

    /// Whether this is the unconstrained sentinel.
    pub fn is_unconstrained(&self) -> bool {
        self.direction_hint == StepDirection::Unconstrained
            || self.size_goal.abs() >= UNCONSTRAINED_GOAL
    }
}

/// One chooser's verdict for one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChooserDecision {
    /// Goal for the next step.
    pub request: StepRequest,
    /// Whether the step *already taken* satisfied this chooser.
    ///
    /// A chooser may accept the current step while still asking for a
    /// smaller next one.
    pub accept_current_step: bool,
}

impl ChooserDecision {
    /// An unconstrained goal that accepts the current step.
    pub fn unconstrained() -> Self {
        Self {
            request: StepRequest::unconstrained(),
            accept_current_step: true,
        }
    }
}

/// The combined decision of every registered chooser.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AggregatedDecision {
    /// Smallest-magnitude goal across all choosers, signed like the last step.
    pub next_step_size_goal: f64,
    /// Logical AND of every chooser's `accept_current_step`.
    pub step_accepted: bool,
    /// Registration index of the chooser that set the goal, if any did.
    pub binding: Option<usize>,
}

impl AggregatedDecision {
    /// The decision of an empty registry: unconstrained, accepted.
    pub fn unconstrained(last_step: f64) -> Self {
        Self {
            next_step_size_goal: UNCONSTRAINED_GOAL.copysign(last_step),
            step_accepted: true,
            binding: None,
        }
    }

    /// Whether no chooser constrained the next step.
    pub fn is_unconstrained(&self) -> bool {
        self.next_step_size_goal.abs() >= UNCONSTRAINED_GOAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unconstrained_request_is_finite() {
        let req = StepRequest::unconstrained();
        assert!(req.size_goal.is_finite());
        assert!(req.is_unconstrained());
        assert_eq!(req.direction_hint, StepDirection::Unconstrained);
    }

    #[test]
    fn toward_expands_when_bound_exceeds_last_step() {
        let req = StepRequest::toward(2.0, 1.0);
        assert_eq!(req.size_goal, 2.0);
        assert_eq!(req.direction_hint, StepDirection::Expand);
        assert!(!req.is_unconstrained());
    }

    #[test]
    fn toward_equal_bound_is_expand() {
        let req = StepRequest::toward(1.0, 1.0);
        assert_eq!(req.direction_hint, StepDirection::Expand);
    }

    #[test]
    fn empty_aggregate_follows_sign_of_last_step() {
        let fwd = AggregatedDecision::unconstrained(0.1);
        let back = AggregatedDecision::unconstrained(-0.1);
        assert!(fwd.next_step_size_goal > 0.0);
        assert!(back.next_step_size_goal < 0.0);
        assert!(fwd.step_accepted && back.step_accepted);
        assert!(fwd.is_unconstrained());
        assert_eq!(fwd.binding, None);
    }

    #[test]
    fn direction_display() {
        assert_eq!(StepDirection::Shrink.to_string(), "shrink");
        assert_eq!(StepDirection::Unconstrained.to_string(), "unconstrained");
    }

    proptest! {
        #[test]
        fn toward_preserves_sign(bound in 0.0f64..1e6, last in -1e6f64..1e6) {
            prop_assume!(last != 0.0);
            let req = StepRequest::toward(bound, last);
            prop_assert_eq!(req.size_goal.is_sign_negative(), last.is_sign_negative());
            prop_assert_eq!(req.magnitude(), bound);
        }
    }
}

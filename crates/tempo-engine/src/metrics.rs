//! Running counters for one element driver.
//!
//! [`ControllerMetrics`] is updated after every decision. It is meant for
//! logging and profiling; nothing in the driver reads it back.

use indexmap::IndexMap;

/// Cumulative step-control counters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControllerMetrics {
    /// Number of accepted steps.
    pub accepted_steps: u64,
    /// Number of rejected steps.
    pub rejected_steps: u64,
    /// Number of decisions in which no chooser constrained the step.
    pub unconstrained_decisions: u64,
    /// Smallest accepted step magnitude, if any step was accepted.
    pub smallest_accepted: Option<f64>,
    /// Largest accepted step magnitude, if any step was accepted.
    pub largest_accepted: Option<f64>,
    /// How often each chooser set the goal, keyed by chooser name in
    /// first-seen order.
    pub binding_counts: IndexMap<String, u64>,
}

impl ControllerMetrics {
    /// Record one decision.
    ///
    /// `binding` names the chooser that set the goal, or `None` when the
    /// decision was unconstrained.
    pub fn record(&mut self, accepted: bool, step: f64, binding: Option<&str>) {
        if accepted {
            self.accepted_steps += 1;
            let magnitude = step.abs();
            self.smallest_accepted =
                Some(self.smallest_accepted.map_or(magnitude, |s| s.min(magnitude)));
            self.largest_accepted =
                Some(self.largest_accepted.map_or(magnitude, |l| l.max(magnitude)));
        } else {
            self.rejected_steps += 1;
        }
        match binding {
            Some(name) => *self.binding_counts.entry(name.to_string()).or_insert(0) += 1,
            None => self.unconstrained_decisions += 1,
        }
    }

    /// Fraction of decisions that rejected the step, or 0 before any.
    pub fn rejection_rate(&self) -> f64 {
        let total = self.accepted_steps + self.rejected_steps;
        if total == 0 {
            0.0
        } else {
            self.rejected_steps as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = ControllerMetrics::default();
        assert_eq!(m.accepted_steps, 0);
        assert_eq!(m.rejected_steps, 0);
        assert_eq!(m.unconstrained_decisions, 0);
        assert!(m.smallest_accepted.is_none());
        assert!(m.binding_counts.is_empty());
        assert_eq!(m.rejection_rate(), 0.0);
    }

    #[test]
    fn record_tracks_extremes_and_bindings() {
        let mut m = ControllerMetrics::default();
        m.record(true, 0.2, Some("Cfl"));
        m.record(true, -0.05, Some("Maximum"));
        m.record(false, 0.5, Some("Cfl"));
        m.record(true, 0.1, None);

        assert_eq!(m.accepted_steps, 3);
        assert_eq!(m.rejected_steps, 1);
        assert_eq!(m.unconstrained_decisions, 1);
        assert_eq!(m.smallest_accepted, Some(0.05));
        assert_eq!(m.largest_accepted, Some(0.2));
        assert_eq!(
            m.binding_counts.iter().map(|(k, v)| (k.as_str(), *v)).collect::<Vec<_>>(),
            vec![("Cfl", 2), ("Maximum", 1)]
        );
        assert_eq!(m.rejection_rate(), 0.25);
    }
}

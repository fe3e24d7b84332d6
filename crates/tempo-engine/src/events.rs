//! The hook the driver calls after each accepted step.

/// Receives a notification for every accepted step, exactly once per step.
///
/// Rejected steps are never reported. The driver makes no other calls
/// into the event system.
pub trait EventRunner {
    /// Called after the driver has advanced to `time` by `step`.
    fn on_step_accepted(&mut self, time: f64, step: f64);
}

/// An [`EventRunner`] that ignores every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEvents;

impl EventRunner for NoEvents {
    fn on_step_accepted(&mut self, _time: f64, _step: f64) {}
}

impl<F: FnMut(f64, f64)> EventRunner for F {
    fn on_step_accepted(&mut self, time: f64, step: f64) {
        self(time, step)
    }
}

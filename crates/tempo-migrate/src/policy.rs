//! What to do with chooser types a checkpoint names but this build lacks.

use tracing::warn;

/// Handling of unknown chooser type tags during restore.
///
/// Dropping a chooser under-constrains the step, so aborting is the
/// default. Skipping exists for forward compatibility when an operator
/// knowingly restores a newer checkpoint into an older build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownTypePolicy {
    /// Fail with [`MigrateError::UnknownChooserType`](tempo_core::MigrateError::UnknownChooserType).
    #[default]
    Abort,
    /// Drop the chooser, log a warning, and list it in the [`RestoreReport`].
    SkipWithWarning,
}

/// Outcome of a registry restore.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Number of choosers rebuilt.
    pub restored: usize,
    /// Type tags dropped under [`UnknownTypePolicy::SkipWithWarning`], in
    /// checkpoint order.
    pub skipped: Vec<String>,
}

impl RestoreReport {
    /// Whether every chooser in the checkpoint was restored.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub(crate) fn skip(&mut self, tag: String, position: usize) {
        warn!(
            tag = %tag,
            position,
            "skipping unknown chooser type; restored registry is missing a constraint"
        );
        self.skipped.push(tag);
    }
}

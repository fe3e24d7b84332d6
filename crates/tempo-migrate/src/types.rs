//! The chooser type table used to restore snapshots.

use std::fmt;
use std::io::ErrorKind;

use indexmap::IndexMap;
use tempo_chooser::{Migratable, StepChooser};
use tempo_choosers::{Cfl, GlobalCfl, LimitIncrease, Maximum};
use tempo_core::codec::expect_consumed;
use tempo_core::MigrateError;

/// Rebuilds a boxed chooser from its payload bytes.
pub type RestoreFn = fn(&[u8]) -> Result<Box<dyn StepChooser>, MigrateError>;

fn restore_as<T: Migratable>(payload: &[u8]) -> Result<Box<dyn StepChooser>, MigrateError> {
    let mut rest = payload;
    let chooser = T::read_state(&mut rest).map_err(|e| match e {
        MigrateError::Io(io) if io.kind() == ErrorKind::UnexpectedEof => MigrateError::Malformed {
            detail: format!("truncated '{}' payload", T::TYPE_TAG),
        },
        other => other,
    })?;
    expect_consumed(rest, T::TYPE_TAG)?;
    Ok(Box::new(chooser))
}

/// Maps stable type tags to restore functions.
///
/// Registration order is preserved so listings are deterministic.
#[derive(Clone, Default)]
pub struct ChooserTypes {
    restorers: IndexMap<&'static str, RestoreFn>,
}

impl ChooserTypes {
    /// An empty table. Nothing can be restored until types are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding every chooser shipped with tempo.
    pub fn builtin() -> Self {
        let mut types = Self::new();
        types.insert::<Cfl>();
        types.insert::<GlobalCfl>();
        types.insert::<Maximum>();
        types.insert::<LimitIncrease>();
        types
    }

    fn insert<T: Migratable>(&mut self) {
        self.restorers.insert(T::TYPE_TAG, restore_as::<T>);
    }

    /// Register an additional chooser type.
    ///
    /// Fails if its tag is already taken.
    pub fn register<T: Migratable>(&mut self) -> Result<(), MigrateError> {
        if self.restorers.contains_key(T::TYPE_TAG) {
            return Err(MigrateError::DuplicateChooserType {
                tag: T::TYPE_TAG.to_string(),
            });
        }
        self.insert::<T>();
        Ok(())
    }

    /// Whether `tag` is registered.
    pub fn contains(&self, tag: &str) -> bool {
        self.restorers.contains_key(tag)
    }

    /// The restore function for `tag`.
    pub fn get(&self, tag: &str) -> Option<RestoreFn> {
        self.restorers.get(tag).copied()
    }

    /// Registered tags in registration order.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.restorers.keys().copied()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.restorers.len()
    }

    /// Whether no type is registered.
    pub fn is_empty(&self) -> bool {
        self.restorers.is_empty()
    }
}

impl fmt::Debug for ChooserTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.tags()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tags_in_order() {
        let types = ChooserTypes::builtin();
        assert_eq!(
            types.tags().collect::<Vec<_>>(),
            vec!["Cfl", "GlobalCfl", "Maximum", "LimitIncrease"]
        );
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut types = ChooserTypes::builtin();
        let err = types.register::<Cfl>().unwrap_err();
        assert!(matches!(err, MigrateError::DuplicateChooserType { tag } if tag == "Cfl"));
        assert_eq!(types.len(), 4);
    }

    #[test]
    fn restore_fn_rejects_short_and_long_payloads() {
        let restore = ChooserTypes::builtin().get("Maximum").unwrap();
        assert!(restore(&0.5f64.to_bits().to_le_bytes()).is_ok());

        assert!(matches!(
            restore(&[0u8; 3]),
            Err(MigrateError::Malformed { .. })
        ));
        assert!(matches!(
            restore(&[0u8; 9]),
            Err(MigrateError::Malformed { .. })
        ));
    }

    #[test]
    fn empty_table_knows_nothing() {
        let types = ChooserTypes::new();
        assert!(types.is_empty());
        assert!(!types.contains("Cfl"));
        assert!(types.get("Cfl").is_none());
    }
}

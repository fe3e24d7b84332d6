//! Migration round trips across every chooser type, including user types.

use proptest::prelude::*;
use tempo_chooser::{StepChooser, StepChooserRegistry, StepContext};
use tempo_choosers::{Cfl, GlobalCfl, LimitIncrease, Maximum};
use tempo_core::{MigrateError, StepQuantity};
use tempo_migrate::{
    registry_from_bytes, registry_to_bytes, restore_chooser, snapshot_chooser, ChooserTypes,
    UnknownTypePolicy,
};
use tempo_test_utils::FixedChooser;

fn ctx(last: f64, h: f64, v: f64) -> StepContext {
    StepContext::new(last)
        .with(StepQuantity::MinimumGridSpacing, h)
        .with(StepQuantity::StabilityFactor, 1.256_372_663_309_164_5)
        .with(StepQuantity::LargestCharacteristicSpeed, v)
        .with(StepQuantity::GlobalMinimumGridSpacing, h * 0.5)
        .with(StepQuantity::GlobalLargestCharacteristicSpeed, v * 2.0)
}

fn round_trip(chooser: &dyn StepChooser, types: &ChooserTypes) -> Box<dyn StepChooser> {
    let mut buf = Vec::new();
    snapshot_chooser(&mut buf, chooser).unwrap();
    let mut slice = buf.as_slice();
    let restored = restore_chooser(&mut slice, types).unwrap();
    assert!(slice.is_empty());
    restored
}

#[test]
fn user_type_needs_registration() {
    let reg = StepChooserRegistry::new()
        .with(Cfl::with_dimension(0.5, 2))
        .unwrap()
        .with(FixedChooser::deferred("window", 0.004, true))
        .unwrap();
    let bytes = registry_to_bytes(&reg).unwrap();

    let err = registry_from_bytes(&bytes, &ChooserTypes::builtin(), UnknownTypePolicy::Abort)
        .unwrap_err();
    assert!(matches!(err, MigrateError::UnknownChooserType { ref tag } if tag == "Fixed"));

    let mut types = ChooserTypes::builtin();
    types.register::<FixedChooser>().unwrap();
    let (restored, report) = registry_from_bytes(&bytes, &types, UnknownTypePolicy::Abort).unwrap();
    assert!(report.is_complete());
    assert!(restored.has_deferred());
    assert_eq!(restored.get(1).unwrap().name(), "window");

    let c = ctx(0.01, 0.1, 1.0);
    assert_eq!(restored.decide(&c).unwrap(), reg.decide(&c).unwrap());
}

#[test]
fn restored_registry_snapshots_to_identical_bytes() {
    let reg = StepChooserRegistry::new()
        .with(GlobalCfl::with_dimension(0.9, 1))
        .unwrap()
        .with(Maximum::default())
        .unwrap();
    let bytes = registry_to_bytes(&reg).unwrap();
    let (restored, _) =
        registry_from_bytes(&bytes, &ChooserTypes::builtin(), UnknownTypePolicy::Abort).unwrap();
    assert_eq!(registry_to_bytes(&restored).unwrap(), bytes);
}

proptest! {
    #[test]
    fn restored_choosers_decide_identically(
        safety in 0.05f64..1.0,
        dim in 1u32..4,
        max in 1e-4f64..1.0,
        factor in 1.01f64..3.0,
        last in prop_oneof![-0.5f64..-1e-6, 1e-6f64..0.5],
        h in 1e-4f64..1.0,
        v in 0.0f64..100.0,
    ) {
        let types = ChooserTypes::builtin();
        let choosers: Vec<Box<dyn StepChooser>> = vec![
            Box::new(Cfl::with_dimension(safety, dim)),
            Box::new(GlobalCfl::with_dimension(safety, dim)),
            Box::new(Maximum::new(max)),
            Box::new(LimitIncrease::new(factor)),
        ];
        let c = ctx(last, h, v);
        for chooser in &choosers {
            let restored = round_trip(chooser.as_ref(), &types);
            prop_assert_eq!(restored.type_tag(), chooser.type_tag());
            prop_assert_eq!(restored.evaluate(&c), chooser.evaluate(&c));
        }
    }
}

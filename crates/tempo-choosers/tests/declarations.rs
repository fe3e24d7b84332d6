//! Declared inputs and scheduling hints of the shipped choosers.

use tempo_chooser::{StepChooser, StepChooserRegistry, StepContext};
use tempo_choosers::{Cfl, GlobalCfl, LimitIncrease, Maximum};
use tempo_core::{QuantityCompute, QuantitySet, StepQuantity};
use tempo_test_utils::FixedChooser;

fn computes_cover_arguments(chooser: &dyn StepChooser) -> bool {
    chooser
        .argument_tags()
        .iter()
        .all(|q| chooser.compute_tags().contains(&q.compute()))
}

#[test]
fn cfl_declares_local_quantities() {
    let cfl = Cfl::with_dimension(0.5, 2);
    assert!(cfl.uses_local_data());
    assert!(cfl.can_be_delayed());
    assert_eq!(
        cfl.compute_tags(),
        &[
            QuantityCompute::MinimumGridSpacingCompute,
            QuantityCompute::StabilityFactorCompute,
            QuantityCompute::LargestCharacteristicSpeedCompute,
        ]
    );
    assert!(computes_cover_arguments(&cfl));
}

#[test]
fn global_cfl_declares_reduction() {
    let global = GlobalCfl::with_dimension(0.5, 2);
    assert!(!global.uses_local_data());
    assert!(global.can_be_delayed());
    assert_eq!(
        global.compute_tags(),
        &[
            QuantityCompute::GlobalReduction,
            QuantityCompute::StabilityFactorCompute,
        ]
    );
    assert!(computes_cover_arguments(&global));
}

#[test]
fn scalar_choosers_declare_nothing() {
    let choosers: [Box<dyn StepChooser>; 2] = [
        Box::new(Maximum::new(0.1)),
        Box::new(LimitIncrease::new(2.0)),
    ];
    for c in &choosers {
        assert!(c.uses_local_data(), "{}", c.name());
        assert!(c.can_be_delayed(), "{}", c.name());
        assert!(c.argument_tags().is_empty(), "{}", c.name());
        assert!(c.compute_tags().is_empty(), "{}", c.name());
    }
}

#[test]
fn every_builtin_registers_next_to_fixtures() {
    let reg = StepChooserRegistry::new()
        .with(Cfl::with_dimension(0.9, 3))
        .unwrap()
        .with(GlobalCfl::with_dimension(0.9, 3))
        .unwrap()
        .with(Maximum::new(0.1))
        .unwrap()
        .with(LimitIncrease::new(2.0))
        .unwrap()
        .with(FixedChooser::new("cap", 0.05, true))
        .unwrap()
        .with(FixedChooser::deferred("window", 0.2, true))
        .unwrap();
    assert_eq!(reg.len(), 6);
    assert!(reg.has_deferred());
    assert_eq!(
        reg.deferred_requirements(),
        [
            StepQuantity::GlobalMinimumGridSpacing,
            StepQuantity::StabilityFactor,
            StepQuantity::GlobalLargestCharacteristicSpeed,
        ]
        .into_iter()
        .collect::<QuantitySet>()
    );

    // With all quantities present the growth limit binds.
    let ctx = StepContext::new(0.01)
        .with(StepQuantity::MinimumGridSpacing, 1.0)
        .with(StepQuantity::StabilityFactor, 1.0)
        .with(StepQuantity::LargestCharacteristicSpeed, 1.0)
        .with(StepQuantity::GlobalMinimumGridSpacing, 1.0)
        .with(StepQuantity::GlobalLargestCharacteristicSpeed, 1.0);
    let d = reg.decide(&ctx).unwrap();
    assert_eq!(d.next_step_size_goal, 0.02);
    assert_eq!(d.binding, Some(3));
    assert!(d.step_accepted);
}

//! Benchmark profiles for the tempo step controller.
//!
//! Provides deterministic registries and evaluation contexts:
//!
//! - [`reference_registry`]: the usual local trio of CFL, maximum and growth limit
//! - [`wide_registry`]: `n` local choosers for scaling measurements
//! - [`deferred_registry`]: a registry whose decision waits on a reduction
//! - [`random_contexts`]: seeded contexts carrying every local quantity

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tempo_chooser::{StepChooserRegistry, StepContext};
use tempo_choosers::{Cfl, GlobalCfl, LimitIncrease, Maximum};
use tempo_core::StepQuantity;

/// Build the reference registry: `Cfl(0.8, dim 3)`, `Maximum(1.0)`,
/// `LimitIncrease(2.0)`.
pub fn reference_registry() -> StepChooserRegistry {
    StepChooserRegistry::new()
        .with(Cfl::with_dimension(0.8, 3))
        .and_then(|r| r.with(Maximum::new(1.0)))
        .and_then(|r| r.with(LimitIncrease::new(2.0)))
        .expect("reference choosers are local")
}

/// Build a registry of `n` local choosers with seeded parameters.
///
/// Every third chooser is a `Maximum`; the rest are `Cfl` with safety
/// factors in `[0.1, 1.0)`.
pub fn wide_registry(n: usize, seed: u64) -> StepChooserRegistry {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut registry = StepChooserRegistry::new();
    for i in 0..n {
        let pushed = if i % 3 == 2 {
            registry.push(Box::new(Maximum::new(rng.random_range(0.01..1.0))))
        } else {
            let dim = rng.random_range(1..=3);
            registry.push(Box::new(Cfl::with_dimension(rng.random_range(0.1..1.0), dim)))
        };
        pushed.expect("wide profile choosers are local");
    }
    registry
}

/// Build a registry mixing a local `Cfl` with a deferred `GlobalCfl`.
pub fn deferred_registry() -> StepChooserRegistry {
    StepChooserRegistry::new()
        .with(Cfl::with_dimension(0.9, 3))
        .and_then(|r| r.with(GlobalCfl::with_dimension(0.5, 3)))
        .and_then(|r| r.with(LimitIncrease::new(1.5)))
        .expect("deferred profile choosers are valid")
}

/// Generate `count` contexts with every local quantity filled in.
///
/// Spacings fall in `[1e-4, 1e-1)`, speeds in `[0.1, 10)` and last steps
/// in `[1e-5, 1e-2)`, so CFL bounds land near the last step and both
/// acceptances and rejections occur.
pub fn random_contexts(count: usize, seed: u64) -> Vec<StepContext> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let spacing = 10f64.powf(rng.random_range(-4.0..-1.0));
            let speed = rng.random_range(0.1..10.0);
            let last_step = 10f64.powf(rng.random_range(-5.0..-2.0));
            StepContext::new(last_step)
                .with(StepQuantity::MinimumGridSpacing, spacing)
                .with(StepQuantity::LargestCharacteristicSpeed, speed)
                .with(StepQuantity::StabilityFactor, 1.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_registry_decides_every_context() {
        let registry = reference_registry();
        for ctx in random_contexts(64, 7) {
            let decision = registry.decide(&ctx).unwrap();
            assert!(decision.next_step_size_goal.abs() <= 1.0);
        }
    }

    #[test]
    fn wide_registry_has_requested_length() {
        let registry = wide_registry(10, 42);
        assert_eq!(registry.len(), 10);
        assert!(!registry.has_deferred());
    }

    #[test]
    fn deferred_registry_needs_reduction() {
        assert!(deferred_registry().has_deferred());
    }

    #[test]
    fn random_contexts_deterministic() {
        let a: Vec<f64> = random_contexts(8, 3).iter().map(StepContext::last_step).collect();
        let b: Vec<f64> = random_contexts(8, 3).iter().map(StepContext::last_step).collect();
        assert_eq!(a, b);
    }
}

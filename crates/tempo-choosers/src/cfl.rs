//! Courant–Friedrichs–Lewy step choosers.
//!
//! Both choosers bound the step by
//!
//! ```text
//! bound = safety_factor * σ * h / (v * d)
//! ```
//!
//! where `σ` is the stepper's stability factor, `h` the minimum grid
//! spacing, `v` the largest characteristic speed, and `d` the number of
//! spatial dimensions. [`Cfl`] uses this element's `h` and `v`;
//! [`GlobalCfl`] uses the values reduced over every element, so all
//! elements agree on one step.

use std::io::{Read, Write};

use tempo_chooser::{Migratable, StepChooser, StepContext};
use tempo_core::codec::{read_f64_le, read_u32_le, write_f64_le, write_u32_le};
use tempo_core::{
    ChooserDecision, ChooserError, MigrateError, QuantityCompute, StepDirection, StepQuantity,
    StepRequest, UNCONSTRAINED_GOAL,
};
use tempo_system::EvolutionSystem;
use tracing::trace;

/// Inputs to one CFL evaluation.
struct CflInputs {
    safety_factor: f64,
    dim: u32,
    stability_factor: f64,
    spacing: f64,
    speed: f64,
    last_step: f64,
}

/// Evaluate the CFL rule with its input guards.
///
/// `spacing_tag` and `speed_tag` name the quantities the inputs came from,
/// for error reporting.
fn cfl_decision(
    chooser: &str,
    inputs: CflInputs,
    spacing_tag: StepQuantity,
    speed_tag: StepQuantity,
) -> Result<ChooserDecision, ChooserError> {
    let CflInputs {
        safety_factor,
        dim,
        stability_factor,
        spacing,
        speed,
        last_step,
    } = inputs;

    if safety_factor.is_nan() {
        return Err(ChooserError::Configuration {
            chooser: chooser.to_string(),
            reason: "safety factor is unset".to_string(),
        });
    }
    if safety_factor <= 0.0 || safety_factor.is_infinite() {
        return Err(ChooserError::Configuration {
            chooser: chooser.to_string(),
            reason: format!("safety factor must be finite and positive, got {safety_factor}"),
        });
    }
    if dim == 0 {
        return Err(ChooserError::Configuration {
            chooser: chooser.to_string(),
            reason: "dimension must be at least 1".to_string(),
        });
    }

    let invalid = |quantity, value| ChooserError::InvalidQuantity {
        chooser: chooser.to_string(),
        quantity,
        value,
    };
    if speed.is_nan() || speed < 0.0 {
        return Err(invalid(speed_tag, speed));
    }
    if spacing.is_nan() || spacing < 0.0 {
        return Err(invalid(spacing_tag, spacing));
    }
    if stability_factor.is_nan() || stability_factor <= 0.0 {
        return Err(invalid(StepQuantity::StabilityFactor, stability_factor));
    }

    if speed == 0.0 || spacing == 0.0 {
        trace!(chooser, speed, spacing, "degenerate CFL input, step unconstrained");
        return Ok(unconstrained(last_step));
    }
    let bound = safety_factor * stability_factor * spacing / (speed * f64::from(dim));
    if !bound.is_finite() {
        trace!(chooser, bound, "non-finite CFL bound, step unconstrained");
        return Ok(unconstrained(last_step));
    }

    Ok(ChooserDecision {
        request: StepRequest::toward(bound, last_step),
        accept_current_step: last_step.abs() <= bound,
    })
}

/// The unconstrained decision, signed like `last_step`.
pub(crate) fn unconstrained(last_step: f64) -> ChooserDecision {
    ChooserDecision {
        request: StepRequest {
            size_goal: UNCONSTRAINED_GOAL.copysign(last_step),
            direction_hint: StepDirection::Unconstrained,
        },
        accept_current_step: true,
    }
}

fn dimension_of<S: EvolutionSystem>() -> u32 {
    // Out-of-range dimensions become 0 and fail at first evaluation.
    u32::try_from(S::VOLUME_DIM).unwrap_or(0)
}

// ── Cfl ────────────────────────────────────────────────────────────

/// CFL chooser on this element's own spacing and speed.
///
/// The safety factor must be finite and strictly positive. Zero is a
/// configuration error, since it would demand zero-length steps. The
/// default instance has an unset (NaN) safety factor and fails with a
/// configuration error at first evaluation.
///
/// # Examples
///
/// ```
/// use tempo_chooser::{StepChooser, StepContext};
/// use tempo_choosers::Cfl;
/// use tempo_core::StepQuantity;
///
/// let cfl = Cfl::with_dimension(0.5, 3);
/// let ctx = StepContext::new(0.01)
///     .with(StepQuantity::MinimumGridSpacing, 0.1)
///     .with(StepQuantity::StabilityFactor, 0.9)
///     .with(StepQuantity::LargestCharacteristicSpeed, 2.0);
/// let d = cfl.evaluate(&ctx).unwrap();
/// assert!((d.request.size_goal - 0.0075).abs() < 1e-15);
/// assert!(!d.accept_current_step);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cfl {
    safety_factor: f64,
    dim: u32,
}

impl Cfl {
    /// A CFL chooser for a `dim`-dimensional system.
    pub fn with_dimension(safety_factor: f64, dim: u32) -> Self {
        Self { safety_factor, dim }
    }

    /// A CFL chooser taking its dimension from `S`.
    pub fn for_system<S: EvolutionSystem>(safety_factor: f64) -> Self {
        Self::with_dimension(safety_factor, dimension_of::<S>())
    }

    /// The configured safety factor.
    pub fn safety_factor(&self) -> f64 {
        self.safety_factor
    }

    /// The configured spatial dimension.
    pub fn dimension(&self) -> u32 {
        self.dim
    }
}

impl Default for Cfl {
    fn default() -> Self {
        Self::with_dimension(f64::NAN, 1)
    }
}

impl StepChooser for Cfl {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn argument_tags(&self) -> &'static [StepQuantity] {
        &[
            StepQuantity::MinimumGridSpacing,
            StepQuantity::StabilityFactor,
            StepQuantity::LargestCharacteristicSpeed,
        ]
    }

    fn compute_tags(&self) -> &'static [QuantityCompute] {
        &[
            QuantityCompute::MinimumGridSpacingCompute,
            QuantityCompute::StabilityFactorCompute,
            QuantityCompute::LargestCharacteristicSpeedCompute,
        ]
    }

    fn uses_local_data(&self) -> bool {
        true
    }

    fn can_be_delayed(&self) -> bool {
        true
    }

    fn evaluate(&self, ctx: &StepContext) -> Result<ChooserDecision, ChooserError> {
        let name = self.name();
        let inputs = CflInputs {
            safety_factor: self.safety_factor,
            dim: self.dim,
            stability_factor: ctx.require(StepQuantity::StabilityFactor, name)?,
            spacing: ctx.require(StepQuantity::MinimumGridSpacing, name)?,
            speed: ctx.require(StepQuantity::LargestCharacteristicSpeed, name)?,
            last_step: ctx.last_step(),
        };
        cfl_decision(
            name,
            inputs,
            StepQuantity::MinimumGridSpacing,
            StepQuantity::LargestCharacteristicSpeed,
        )
    }

    fn write_state(&self, w: &mut dyn Write) -> Result<(), MigrateError> {
        write_f64_le(w, self.safety_factor)?;
        write_u32_le(w, self.dim)
    }

    fn clone_box(&self) -> Box<dyn StepChooser> {
        Box::new(*self)
    }
}

impl Migratable for Cfl {
    const TYPE_TAG: &'static str = "Cfl";

    fn read_state(r: &mut dyn Read) -> Result<Self, MigrateError> {
        let safety_factor = read_f64_le(r)?;
        let dim = read_u32_le(r)?;
        Ok(Self { safety_factor, dim })
    }
}

// ── GlobalCfl ──────────────────────────────────────────────────────

/// CFL chooser on the spacing and speed reduced over all elements.
///
/// Evaluated only after the cross-element reduction has settled. The
/// safety factor follows the same rules as [`Cfl`]'s.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlobalCfl {
    safety_factor: f64,
    dim: u32,
}

impl GlobalCfl {
    /// A global CFL chooser for a `dim`-dimensional system.
    pub fn with_dimension(safety_factor: f64, dim: u32) -> Self {
        Self { safety_factor, dim }
    }

    /// A global CFL chooser taking its dimension from `S`.
    pub fn for_system<S: EvolutionSystem>(safety_factor: f64) -> Self {
        Self::with_dimension(safety_factor, dimension_of::<S>())
    }

    /// The configured safety factor.
    pub fn safety_factor(&self) -> f64 {
        self.safety_factor
    }

    /// The configured spatial dimension.
    pub fn dimension(&self) -> u32 {
        self.dim
    }
}

impl Default for GlobalCfl {
    fn default() -> Self {
        Self::with_dimension(f64::NAN, 1)
    }
}

impl StepChooser for GlobalCfl {
    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    fn argument_tags(&self) -> &'static [StepQuantity] {
        &[
            StepQuantity::GlobalMinimumGridSpacing,
            StepQuantity::StabilityFactor,
            StepQuantity::GlobalLargestCharacteristicSpeed,
        ]
    }

    fn compute_tags(&self) -> &'static [QuantityCompute] {
        &[
            QuantityCompute::GlobalReduction,
            QuantityCompute::StabilityFactorCompute,
        ]
    }

    fn uses_local_data(&self) -> bool {
        false
    }

    fn can_be_delayed(&self) -> bool {
        true
    }

    fn evaluate(&self, ctx: &StepContext) -> Result<ChooserDecision, ChooserError> {
        let name = self.name();
        let inputs = CflInputs {
            safety_factor: self.safety_factor,
            dim: self.dim,
            stability_factor: ctx.require(StepQuantity::StabilityFactor, name)?,
            spacing: ctx.require(StepQuantity::GlobalMinimumGridSpacing, name)?,
            speed: ctx.require(StepQuantity::GlobalLargestCharacteristicSpeed, name)?,
            last_step: ctx.last_step(),
        };
        cfl_decision(
            name,
            inputs,
            StepQuantity::GlobalMinimumGridSpacing,
            StepQuantity::GlobalLargestCharacteristicSpeed,
        )
    }

    fn write_state(&self, w: &mut dyn Write) -> Result<(), MigrateError> {
        write_f64_le(w, self.safety_factor)?;
        write_u32_le(w, self.dim)
    }

    fn clone_box(&self) -> Box<dyn StepChooser> {
        Box::new(*self)
    }
}

impl Migratable for GlobalCfl {
    const TYPE_TAG: &'static str = "GlobalCfl";

    fn read_state(r: &mut dyn Read) -> Result<Self, MigrateError> {
        let safety_factor = read_f64_le(r)?;
        let dim = read_u32_le(r)?;
        Ok(Self { safety_factor, dim })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempo_system::NewtonianEuler;

    fn local_ctx(last: f64, h: f64, sigma: f64, v: f64) -> StepContext {
        StepContext::new(last)
            .with(StepQuantity::MinimumGridSpacing, h)
            .with(StepQuantity::StabilityFactor, sigma)
            .with(StepQuantity::LargestCharacteristicSpeed, v)
    }

    fn global_ctx(last: f64, h: f64, sigma: f64, v: f64) -> StepContext {
        StepContext::new(last)
            .with(StepQuantity::GlobalMinimumGridSpacing, h)
            .with(StepQuantity::StabilityFactor, sigma)
            .with(StepQuantity::GlobalLargestCharacteristicSpeed, v)
    }

    #[test]
    fn three_dimensional_scenario() {
        let d = Cfl::with_dimension(0.5, 3)
            .evaluate(&local_ctx(0.01, 0.1, 0.9, 2.0))
            .unwrap();
        assert!((d.request.size_goal - 0.0075).abs() < 1e-15);
        assert!(d.request.size_goal > 0.0);
        assert_eq!(d.request.direction_hint, StepDirection::Shrink);
        assert!(!d.accept_current_step);
    }

    #[test]
    fn backward_integration_keeps_sign() {
        let d = Cfl::with_dimension(0.5, 3)
            .evaluate(&local_ctx(-0.001, 0.1, 0.9, 2.0))
            .unwrap();
        assert!((d.request.size_goal + 0.0075).abs() < 1e-15);
        assert_eq!(d.request.direction_hint, StepDirection::Expand);
        assert!(d.accept_current_step);
    }

    #[test]
    fn step_exactly_at_bound_is_accepted() {
        let d = Cfl::with_dimension(1.0, 1)
            .evaluate(&local_ctx(0.5, 1.0, 1.0, 2.0))
            .unwrap();
        assert_eq!(d.request.size_goal, 0.5);
        assert!(d.accept_current_step);
    }

    #[test]
    fn zero_speed_is_unconstrained() {
        let d = Cfl::with_dimension(0.5, 2)
            .evaluate(&local_ctx(0.01, 0.1, 0.9, 0.0))
            .unwrap();
        assert!(d.request.is_unconstrained());
        assert!(d.accept_current_step);
    }

    #[test]
    fn zero_spacing_is_unconstrained() {
        let d = Cfl::with_dimension(0.5, 2)
            .evaluate(&local_ctx(0.01, 0.0, 0.9, 1.0))
            .unwrap();
        assert!(d.request.is_unconstrained());
        assert!(d.accept_current_step);
    }

    #[test]
    fn infinite_spacing_is_unconstrained() {
        let d = Cfl::with_dimension(0.5, 2)
            .evaluate(&local_ctx(0.01, f64::INFINITY, 0.9, 1.0))
            .unwrap();
        assert!(d.request.is_unconstrained());
    }

    #[test]
    fn unset_safety_factor_fails_fast() {
        let err = Cfl::default()
            .evaluate(&local_ctx(0.01, 0.1, 0.9, 2.0))
            .unwrap_err();
        assert_eq!(
            err,
            ChooserError::Configuration {
                chooser: "Cfl".into(),
                reason: "safety factor is unset".into()
            }
        );
    }

    #[test]
    fn bad_configuration_rejected() {
        let ctx = local_ctx(0.01, 0.1, 0.9, 2.0);
        for cfl in [
            Cfl::with_dimension(-0.5, 3),
            Cfl::with_dimension(0.0, 3),
            Cfl::with_dimension(f64::INFINITY, 3),
            Cfl::with_dimension(0.5, 0),
        ] {
            assert!(matches!(
                cfl.evaluate(&ctx),
                Err(ChooserError::Configuration { .. })
            ));
        }
    }

    #[test]
    fn configuration_checked_before_degenerate_inputs() {
        let err = Cfl::default()
            .evaluate(&local_ctx(0.01, 0.1, 0.9, 0.0))
            .unwrap_err();
        assert!(matches!(err, ChooserError::Configuration { .. }));
    }

    #[test]
    fn broken_quantities_rejected() {
        let cfl = Cfl::with_dimension(0.5, 1);
        let cases = [
            (local_ctx(0.01, 0.1, 0.9, -1.0), StepQuantity::LargestCharacteristicSpeed),
            (local_ctx(0.01, 0.1, 0.9, f64::NAN), StepQuantity::LargestCharacteristicSpeed),
            (local_ctx(0.01, -0.1, 0.9, 1.0), StepQuantity::MinimumGridSpacing),
            (local_ctx(0.01, 0.1, 0.0, 1.0), StepQuantity::StabilityFactor),
            (local_ctx(0.01, 0.1, f64::NAN, 1.0), StepQuantity::StabilityFactor),
        ];
        for (ctx, expected) in cases {
            match cfl.evaluate(&ctx) {
                Err(ChooserError::InvalidQuantity { quantity, .. }) => {
                    assert_eq!(quantity, expected)
                }
                other => panic!("expected InvalidQuantity({expected}), got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_input_reported() {
        let ctx = StepContext::new(0.1).with(StepQuantity::MinimumGridSpacing, 0.1);
        let err = Cfl::with_dimension(0.5, 1).evaluate(&ctx).unwrap_err();
        assert_eq!(
            err,
            ChooserError::MissingQuantity {
                chooser: "Cfl".into(),
                quantity: StepQuantity::StabilityFactor
            }
        );
    }

    #[test]
    fn dimension_from_system() {
        assert_eq!(Cfl::for_system::<NewtonianEuler<3>>(0.5).dimension(), 3);
        assert_eq!(GlobalCfl::for_system::<NewtonianEuler<1>>(0.5).dimension(), 1);
    }

    #[test]
    fn global_cfl_reads_reduced_quantities() {
        let g = GlobalCfl::with_dimension(0.5, 3);
        assert!(!g.uses_local_data());
        let d = g.evaluate(&global_ctx(0.01, 0.1, 0.9, 2.0)).unwrap();
        assert!((d.request.size_goal - 0.0075).abs() < 1e-15);

        let err = g.evaluate(&local_ctx(0.01, 0.1, 0.9, 2.0)).unwrap_err();
        assert!(matches!(
            err,
            ChooserError::MissingQuantity {
                quantity: StepQuantity::GlobalMinimumGridSpacing,
                ..
            }
        ));
    }

    #[test]
    fn state_round_trips() {
        let original = Cfl::with_dimension(0.25, 2);
        let mut buf = Vec::new();
        original.write_state(&mut buf).unwrap();
        assert_eq!(buf.len(), 12);
        let restored = Cfl::read_state(&mut buf.as_slice()).unwrap();
        assert_eq!(restored, original);

        let mut buf = Vec::new();
        Cfl::default().write_state(&mut buf).unwrap();
        assert!(Cfl::read_state(&mut buf.as_slice())
            .unwrap()
            .safety_factor()
            .is_nan());
    }

    proptest! {
        #[test]
        fn faster_waves_never_raise_the_bound(
            v1 in 1e-6f64..1e6,
            dv in 0.0f64..1e6,
            h in 1e-6f64..10.0,
            sigma in 0.1f64..2.0,
            dim in 1u32..4,
        ) {
            let cfl = Cfl::with_dimension(0.8, dim);
            let slow = cfl.evaluate(&local_ctx(1.0, h, sigma, v1)).unwrap();
            let fast = cfl.evaluate(&local_ctx(1.0, h, sigma, v1 + dv)).unwrap();
            prop_assert!(fast.request.magnitude() <= slow.request.magnitude());
        }

        #[test]
        fn goal_sign_matches_last_step(
            last in prop_oneof![-1e3f64..-1e-9, 1e-9f64..1e3],
            v in 0.0f64..1e3,
            h in 1e-6f64..10.0,
        ) {
            let d = Cfl::with_dimension(0.5, 2)
                .evaluate(&local_ctx(last, h, 1.0, v))
                .unwrap();
            prop_assert_eq!(d.request.size_goal.is_sign_negative(), last < 0.0);
        }

        #[test]
        fn zero_speed_always_accepts(
            last in -1e3f64..1e3,
            h in 1e-6f64..10.0,
            sigma in 0.1f64..2.0,
            dim in 1u32..4,
        ) {
            let d = Cfl::with_dimension(0.5, dim)
                .evaluate(&local_ctx(last, h, sigma, 0.0))
                .unwrap();
            prop_assert!(d.request.is_unconstrained());
            prop_assert!(d.accept_current_step);
        }
    }
}

//! The [`StepChooser`] trait and the [`Migratable`] restore contract.
//!
//! Choosers are small strategy objects. They declare the quantities they
//! consume up front, as argument tags, so the driver can resolve those
//! inputs before evaluation and new choosers plug in without touching the
//! time-integration loop.

use std::io::{Read, Write};

use tempo_core::{ChooserDecision, ChooserError, MigrateError, QuantityCompute, StepQuantity};

use crate::context::StepContext;

/// A pluggable step-size criterion.
///
/// # Contract
///
/// - `evaluate()` is a pure function of the context: no hidden state, no
///   side effects, same context gives the same decision.
/// - Numeric edge cases the declared inputs can produce (zero speed, zero
///   spacing) are handled inside the chooser by returning an
///   unconstrained goal, never by returning a non-finite one.
/// - `argument_tags()` and `compute_tags()` return fixed lists; the
///   registry checks them once at registration. Every argument tag's
///   [`StepQuantity::compute`] must appear among the compute tags.
///
/// # Object safety
///
/// This trait is object-safe; the registry stores choosers as
/// `Vec<Box<dyn StepChooser>>`. The static half of the migration
/// contract lives in [`Migratable`].
///
/// # Examples
///
/// A chooser that never constrains the step:
///
/// ```
/// use std::io::Write;
/// use tempo_chooser::{StepChooser, StepContext};
/// use tempo_core::{ChooserDecision, ChooserError, MigrateError, QuantityCompute, StepQuantity};
///
/// #[derive(Clone)]
/// struct Anything;
///
/// impl StepChooser for Anything {
///     fn type_tag(&self) -> &'static str { "Anything" }
///     fn argument_tags(&self) -> &'static [StepQuantity] { &[] }
///     fn compute_tags(&self) -> &'static [QuantityCompute] { &[] }
///     fn uses_local_data(&self) -> bool { true }
///     fn can_be_delayed(&self) -> bool { true }
///     fn evaluate(&self, _ctx: &StepContext) -> Result<ChooserDecision, ChooserError> {
///         Ok(ChooserDecision::unconstrained())
///     }
///     fn write_state(&self, _w: &mut dyn Write) -> Result<(), MigrateError> { Ok(()) }
///     fn clone_box(&self) -> Box<dyn StepChooser> { Box::new(self.clone()) }
/// }
///
/// let d = Anything.evaluate(&StepContext::new(0.1)).unwrap();
/// assert!(d.accept_current_step);
/// assert_eq!(Anything.name(), "Anything");
/// ```
pub trait StepChooser: Send + 'static {
    /// Human-readable name for error reporting and logging.
    ///
    /// Defaults to the type tag.
    fn name(&self) -> &str {
        self.type_tag()
    }

    /// Stable identifier of the concrete type, written into snapshots.
    fn type_tag(&self) -> &'static str;

    /// Quantities this chooser reads from the [`StepContext`].
    fn argument_tags(&self) -> &'static [StepQuantity];

    /// How the argument quantities are derived when not already cached.
    fn compute_tags(&self) -> &'static [QuantityCompute];

    /// Whether every input is local to one element.
    ///
    /// When `false` the driver defers evaluation until the cross-element
    /// reduction has settled.
    fn uses_local_data(&self) -> bool;

    /// Whether evaluation may be deferred later in the step pipeline.
    ///
    /// An optimization hint for local choosers. A chooser that reads global
    /// data must return `true`.
    fn can_be_delayed(&self) -> bool;

    /// Judge the step just taken and propose the next one.
    fn evaluate(&self, ctx: &StepContext) -> Result<ChooserDecision, ChooserError>;

    /// Write the full configuration state as an opaque payload.
    ///
    /// [`Migratable::read_state`] must rebuild an identical chooser from
    /// exactly these bytes.
    fn write_state(&self, w: &mut dyn Write) -> Result<(), MigrateError>;

    /// Clone into a new box.
    fn clone_box(&self) -> Box<dyn StepChooser>;
}

/// The restore half of the migration contract.
///
/// Implemented by every concrete chooser so a type table can rebuild it
/// from a snapshot without the caller knowing the concrete type.
pub trait Migratable: StepChooser + Sized {
    /// Stable type identifier. Must equal [`StepChooser::type_tag`] and
    /// never change between releases.
    const TYPE_TAG: &'static str;

    /// Rebuild a chooser from a payload written by
    /// [`StepChooser::write_state`].
    fn read_state(r: &mut dyn Read) -> Result<Self, MigrateError>;
}

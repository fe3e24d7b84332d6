//! Quantity tags: the declarative inputs of a step chooser.
//!
//! A chooser names the quantities it needs as a fixed list of
//! [`StepQuantity`] argument tags. Each quantity names the
//! [`QuantityCompute`] that derives it when it is not already cached, so
//! the driver can resolve a chooser's inputs without knowing its type.

use std::fmt;

/// An external quantity a chooser may consume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepQuantity {
    /// Minimum distance between neighbouring grid points in this element.
    MinimumGridSpacing,
    /// Stability factor of the time stepper in use.
    StabilityFactor,
    /// Largest characteristic speed over this element's field state.
    LargestCharacteristicSpeed,
    /// [`MinimumGridSpacing`](Self::MinimumGridSpacing) reduced over all elements.
    GlobalMinimumGridSpacing,
    /// [`LargestCharacteristicSpeed`](Self::LargestCharacteristicSpeed)
    /// reduced over all elements.
    GlobalLargestCharacteristicSpeed,
}

/// How a [`StepQuantity`] is derived when it has not been cached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QuantityCompute {
    /// Scan the element's grid coordinates for the smallest spacing.
    MinimumGridSpacingCompute,
    /// Ask the time stepper for its stable step factor.
    StabilityFactorCompute,
    /// Evaluate the PDE system's characteristic speeds on the local fields.
    LargestCharacteristicSpeedCompute,
    /// Combine per-element contributions in a cross-element reduction.
    GlobalReduction,
}

impl StepQuantity {
    /// Number of distinct quantities.
    pub const COUNT: usize = 5;

    /// Every quantity, in index order.
    pub const ALL: [StepQuantity; Self::COUNT] = [
        Self::MinimumGridSpacing,
        Self::StabilityFactor,
        Self::LargestCharacteristicSpeed,
        Self::GlobalMinimumGridSpacing,
        Self::GlobalLargestCharacteristicSpeed,
    ];

    /// Dense index of this quantity, in `0..COUNT`.
    pub fn index(self) -> usize {
        match self {
            Self::MinimumGridSpacing => 0,
            Self::StabilityFactor => 1,
            Self::LargestCharacteristicSpeed => 2,
            Self::GlobalMinimumGridSpacing => 3,
            Self::GlobalLargestCharacteristicSpeed => 4,
        }
    }

    /// The computation that derives this quantity.
    pub fn compute(self) -> QuantityCompute {
        match self {
            Self::MinimumGridSpacing => QuantityCompute::MinimumGridSpacingCompute,
            Self::StabilityFactor => QuantityCompute::StabilityFactorCompute,
            Self::LargestCharacteristicSpeed => {
                QuantityCompute::LargestCharacteristicSpeedCompute
            }
            Self::GlobalMinimumGridSpacing | Self::GlobalLargestCharacteristicSpeed => {
                QuantityCompute::GlobalReduction
            }
        }
    }

    /// Whether the quantity is available without cross-element communication.
    pub fn is_local(self) -> bool {
        self.compute() != QuantityCompute::GlobalReduction
    }
}

impl fmt::Display for StepQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MinimumGridSpacing => "minimum grid spacing",
            Self::StabilityFactor => "stability factor",
            Self::LargestCharacteristicSpeed => "largest characteristic speed",
            Self::GlobalMinimumGridSpacing => "global minimum grid spacing",
            Self::GlobalLargestCharacteristicSpeed => "global largest characteristic speed",
        };
        f.write_str(name)
    }
}

/// A set of [`StepQuantity`] tags.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct QuantitySet {
    bits: u8,
}

impl QuantitySet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Add a quantity.
    pub fn insert(&mut self, quantity: StepQuantity) {
        self.bits |= 1 << quantity.index();
    }

    /// Whether the set contains `quantity`.
    pub fn contains(&self, quantity: StepQuantity) -> bool {
        self.bits & (1 << quantity.index()) != 0
    }

    /// Return the union of two sets.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Elements of `self` not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        Self {
            bits: self.bits & !other.bits,
        }
    }

    /// Returns `true` if the set contains no quantities.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Number of quantities in the set.
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Whether any member needs a cross-element reduction.
    pub fn needs_reduction(&self) -> bool {
        self.iter().any(|q| !q.is_local())
    }

    /// Iterate over the members in index order.
    pub fn iter(&self) -> impl Iterator<Item = StepQuantity> + '_ {
        StepQuantity::ALL.into_iter().filter(|q| self.contains(*q))
    }
}

impl fmt::Debug for QuantitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<StepQuantity> for QuantitySet {
    fn from_iter<I: IntoIterator<Item = StepQuantity>>(iter: I) -> Self {
        let mut set = Self::empty();
        for quantity in iter {
            set.insert(quantity);
        }
        set
    }
}

impl<'a> FromIterator<&'a StepQuantity> for QuantitySet {
    fn from_iter<I: IntoIterator<Item = &'a StepQuantity>>(iter: I) -> Self {
        iter.into_iter().copied().collect()
    }
}

//! Test utilities and mock types for tempo development.
//!
//! Provides a mock [`StabilityQuantitySource`] and a set of fixture
//! choosers (see [`fixtures`]) for registry, driver, and migration tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{FailingChooser, FixedChooser};

use tempo_system::{StabilityQuantitySource, SystemError};

/// Mock implementation of [`StabilityQuantitySource`].
///
/// Returns whatever spacing and speed it was built with. Set
/// [`fail_speed`](MockSource::fail_speed) to make the speed query error
/// the way an unphysical field state would.
#[derive(Clone, Debug)]
pub struct MockSource {
    pub spacing: f64,
    pub speed: f64,
    pub fail_speed: bool,
}

impl MockSource {
    pub fn new(spacing: f64, speed: f64) -> Self {
        Self {
            spacing,
            speed,
            fail_speed: false,
        }
    }

    /// A source whose speed query always fails.
    pub fn unphysical(spacing: f64) -> Self {
        Self {
            spacing,
            speed: f64::NAN,
            fail_speed: true,
        }
    }
}

impl StabilityQuantitySource for MockSource {
    fn minimum_grid_spacing(&self) -> f64 {
        self.spacing
    }

    fn largest_characteristic_speed(&self) -> Result<f64, SystemError> {
        if self.fail_speed {
            return Err(SystemError::UnphysicalState {
                point: 0,
                reason: "mock source configured to fail".to_string(),
            });
        }
        Ok(self.speed)
    }
}

//! Element meshes and their minimum grid spacing.
//!
//! An element is a logically Cartesian block of grid points. Points are
//! stored with the first axis varying fastest. The minimum grid spacing
//! is the smallest Euclidean distance between two points that are
//! neighbours along one logical axis, which is what bounds the stable
//! step on a curved or stretched mesh.

use std::sync::OnceLock;

use crate::error::SystemError;

/// Grid points of one element in `DIM` dimensions.
#[derive(Clone, Debug)]
pub struct ElementMesh<const DIM: usize> {
    extents: [usize; DIM],
    coords: Vec<[f64; DIM]>,
    minimum_grid_spacing: OnceLock<f64>,
}

impl<const DIM: usize> ElementMesh<DIM> {
    /// Build a mesh from explicit point coordinates.
    ///
    /// Every axis must have at least two points and `coords` must hold
    /// exactly one entry per point.
    pub fn from_coordinates(
        extents: [usize; DIM],
        coords: Vec<[f64; DIM]>,
    ) -> Result<Self, SystemError> {
        for (axis, &extent) in extents.iter().enumerate() {
            if extent < 2 {
                return Err(SystemError::DegenerateMesh { axis, extent });
            }
        }
        let expected: usize = extents.iter().product();
        if coords.len() != expected {
            return Err(SystemError::ShapeMismatch {
                what: "mesh coordinates",
                expected,
                found: coords.len(),
            });
        }
        Ok(Self {
            extents,
            coords,
            minimum_grid_spacing: OnceLock::new(),
        })
    }

    /// An evenly spaced box spanning `lower..=upper` on every axis.
    pub fn uniform(
        lower: [f64; DIM],
        upper: [f64; DIM],
        extents: [usize; DIM],
    ) -> Result<Self, SystemError> {
        let n: usize = extents.iter().product();
        let mut coords = Vec::with_capacity(n);
        for flat in 0..n {
            let index = unflatten(flat, &extents);
            let mut point = [0.0; DIM];
            for d in 0..DIM {
                let denom = extents[d].saturating_sub(1).max(1) as f64;
                point[d] = lower[d] + (upper[d] - lower[d]) * index[d] as f64 / denom;
            }
            coords.push(point);
        }
        Self::from_coordinates(extents, coords)
    }

    /// Number of points along each axis.
    pub fn extents(&self) -> [usize; DIM] {
        self.extents
    }

    /// Total number of grid points.
    pub fn number_of_points(&self) -> usize {
        self.coords.len()
    }

    /// Point coordinates, first axis fastest.
    pub fn coordinates(&self) -> &[[f64; DIM]] {
        &self.coords
    }

    /// Smallest distance between logically neighbouring points.
    ///
    /// Computed on first use and cached; the mesh is immutable.
    pub fn minimum_grid_spacing(&self) -> f64 {
        *self
            .minimum_grid_spacing
            .get_or_init(|| self.compute_minimum_grid_spacing())
    }

    fn compute_minimum_grid_spacing(&self) -> f64 {
        let mut min = f64::INFINITY;
        let mut stride = 1;
        for d in 0..DIM {
            for flat in 0..self.coords.len() {
                let index = unflatten(flat, &self.extents);
                if index[d] + 1 == self.extents[d] {
                    continue;
                }
                let a = &self.coords[flat];
                let b = &self.coords[flat + stride];
                let dist2: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
                min = min.min(dist2.sqrt());
            }
            stride *= self.extents[d];
        }
        min
    }
}

fn unflatten<const DIM: usize>(mut flat: usize, extents: &[usize; DIM]) -> [usize; DIM] {
    let mut index = [0; DIM];
    for d in 0..DIM {
        index[d] = flat % extents[d];
        flat /= extents[d];
    }
    index
}

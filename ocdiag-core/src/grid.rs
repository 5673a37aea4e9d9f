//! Staggered vertical grid built from a dataset's depth coordinate.
//!
//! Ocean models store tracers at cell centres (e.g. `deptht`) and declare the
//! cell interfaces through a bounds field referenced by the coordinate's
//! `bounds` attribute. The bounds field has shape `(levels, 2)`, holding the
//! top and bottom depth of every cell.
//!
//! From it the [`VerticalGrid`] derives:
//!
//! - `centers`: the `n` cell-centre depths
//! - `outer`: the `n + 1` interface depths (top of the first cell, then the bottom of each cell)
//! - `thickness`: the `n` cell thicknesses, $h_k = z^{outer}_{k+1} - z^{outer}_k$
//!
//! The thickness is the metric used to weight vertical integrals and averages.
//! Grids are cheap to build and are rebuilt on every operator call.

use crate::dataset::{Dataset, BOUNDS_ATTRIBUTE};
use crate::errors::{DiagError, DiagResult};
use log::debug;
use ndarray::{s, Array1, ArrayView2, Ix1};

/// A one-dimensional staggered grid along the vertical axis.
#[derive(Debug, Clone, PartialEq)]
pub struct VerticalGrid {
    axis: String,
    centers: Array1<f64>,
    outer: Array1<f64>,
    thickness: Array1<f64>,
}

impl VerticalGrid {
    /// Build the grid from the dataset's declared vertical axis.
    ///
    /// Fails with [`DiagError::MissingGridMetadata`] if the depth coordinate is
    /// absent or not one-dimensional, if it lacks a `bounds` attribute, or if the
    /// referenced bounds field is absent or does not have shape `(levels, 2)`.
    /// Leading dimensions of length one in the bounds field (such as a single
    /// time step) are ignored.
    pub fn build(dataset: &Dataset) -> DiagResult<Self> {
        let axis = dataset.vertical_axis();
        let missing = |reason: String| DiagError::MissingGridMetadata {
            coordinate: axis.to_string(),
            reason,
        };

        let coord = dataset
            .get(axis)
            .ok_or_else(|| missing("coordinate not found in dataset".to_string()))?;
        if coord.dims().len() != 1 {
            return Err(missing(format!(
                "expected a one-dimensional coordinate, found dimensions {:?}",
                coord.dims()
            )));
        }
        let centers = coord
            .values()
            .clone()
            .into_dimensionality::<Ix1>()
            .map_err(|e| missing(e.to_string()))?;

        let bounds_name = dataset
            .bounds_of(axis)
            .ok_or_else(|| missing(format!("no '{}' attribute", BOUNDS_ATTRIBUTE)))?;
        let bounds = dataset.get(bounds_name).ok_or_else(|| {
            missing(format!("bounds field '{}' not found in dataset", bounds_name))
        })?;

        let shape = bounds.shape();
        let ndim = shape.len();
        if ndim < 2 || shape[..ndim - 2].iter().any(|&len| len != 1) {
            return Err(missing(format!(
                "bounds field '{}' has shape {:?}, expected (levels, 2)",
                bounds_name, shape
            )));
        }
        let bounds = bounds
            .values()
            .to_shape((shape[ndim - 2], shape[ndim - 1]))
            .map_err(|e| missing(e.to_string()))?
            .into_owned();
        if bounds.ncols() != 2 || bounds.nrows() != centers.len() {
            return Err(missing(format!(
                "bounds field '{}' has shape {:?}, expected ({}, 2)",
                bounds_name,
                bounds.shape(),
                centers.len()
            )));
        }

        let grid = Self::from_bounds(axis, centers, bounds.view())?;
        debug!("Built vertical grid on '{}' with {} levels", axis, grid.len());
        Ok(grid)
    }

    /// Build a grid from explicit cell centres and `(levels, 2)` cell bounds.
    pub fn from_bounds(
        axis: &str,
        centers: Array1<f64>,
        bounds: ArrayView2<f64>,
    ) -> DiagResult<Self> {
        if centers.is_empty() {
            return Err(DiagError::MissingGridMetadata {
                coordinate: axis.to_string(),
                reason: "coordinate has no levels".to_string(),
            });
        }
        let mut outer = Array1::<f64>::zeros(centers.len() + 1);
        outer[0] = bounds[[0, 0]];
        outer.slice_mut(s![1..]).assign(&bounds.column(1));

        let thickness = &outer.slice(s![1..]) - &outer.slice(s![..-1]);

        Ok(Self {
            axis: axis.to_string(),
            centers,
            outer,
            thickness,
        })
    }

    /// Name of the vertical dimension
    pub fn axis(&self) -> &str {
        &self.axis
    }

    pub fn centers(&self) -> &Array1<f64> {
        &self.centers
    }

    pub fn outer(&self) -> &Array1<f64> {
        &self.outer
    }

    /// Cell thickness, used as the integration weight
    pub fn thickness(&self) -> &Array1<f64> {
        &self.thickness
    }

    /// Number of levels (cell centres)
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }
}

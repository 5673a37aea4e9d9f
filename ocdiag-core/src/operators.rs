//! Vertical integral, average and derivative of dataset fields.
//!
//! All operators build a [`VerticalGrid`] from the dataset and work along the
//! dataset's vertical axis, so a field with dimensions
//! `(time_counter, deptht, y, x)` is reduced to `(time_counter, y, x)` by
//! [`integrate`] and [`average`]. Missing values (NaN) are skipped.
//!
//! Levels can be restricted with a [`DepthFilter`]. Excluded levels are treated
//! exactly like missing values.

use crate::dataset::Dataset;
use crate::errors::{DiagError, DiagResult};
use crate::field::Field;
use crate::grid::VerticalGrid;
use ndarray::{Array1, ArrayD, Axis, Zip};

/// Restriction of a vertical operator to part of the water column.
///
/// Depths are compared against the cell centres of the vertical grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DepthFilter {
    /// Use every level.
    #[default]
    NoFilter,
    /// Levels with a centre depth strictly less than the value (shallower levels).
    DepthBelow(f64),
    /// Levels with a centre depth strictly greater than the value (deeper levels).
    DepthAbove(f64),
    /// Levels strictly between `upper` and `lower`.
    DepthRange { upper: f64, lower: f64 },
    /// Element-wise mask with the same shape as the field; `false` excludes the value.
    BooleanMask(ArrayD<bool>),
}

impl DepthFilter {
    /// Build a filter from optional upper and lower depth bounds.
    ///
    /// When both bounds are given the levels must satisfy both.
    pub fn from_bounds(upper: Option<f64>, lower: Option<f64>) -> Self {
        match (upper, lower) {
            (None, None) => DepthFilter::NoFilter,
            (None, Some(lower)) => DepthFilter::DepthBelow(lower),
            (Some(upper), None) => DepthFilter::DepthAbove(upper),
            (Some(upper), Some(lower)) => DepthFilter::DepthRange { upper, lower },
        }
    }

    /// Levels kept by a depth-based filter, or `None` for filters that do not
    /// depend on depth alone.
    fn level_mask(&self, grid: &VerticalGrid) -> Option<Array1<bool>> {
        let centers = grid.centers();
        match self {
            DepthFilter::NoFilter | DepthFilter::BooleanMask(_) => None,
            DepthFilter::DepthBelow(lower) => Some(centers.mapv(|z| z < *lower)),
            DepthFilter::DepthAbove(upper) => Some(centers.mapv(|z| z > *upper)),
            DepthFilter::DepthRange { upper, lower } => {
                Some(centers.mapv(|z| z > *upper && z < *lower))
            }
        }
    }
}

/// Threshold condition used by [`extent_where`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExtentCondition {
    /// Values strictly below the threshold
    Below(f64),
    /// Values strictly above the threshold
    Above(f64),
}

impl ExtentCondition {
    fn holds(&self, value: f64) -> bool {
        match self {
            ExtentCondition::Below(threshold) => value < *threshold,
            ExtentCondition::Above(threshold) => value > *threshold,
        }
    }
}

/// A field prepared for a vertical operation: the grid, the position of the vertical
/// axis in the field, and the filtered values.
struct VerticalView {
    grid: VerticalGrid,
    axis: Axis,
    dims: Vec<String>,
    values: ArrayD<f64>,
}

impl VerticalView {
    fn new(dataset: &Dataset, name: &str, filter: &DepthFilter) -> DiagResult<Self> {
        let grid = VerticalGrid::build(dataset)?;
        let field = dataset.field(name)?;
        let axis = field
            .axis_of(grid.axis())
            .ok_or_else(|| DiagError::MissingDimension {
                field: name.to_string(),
                dimension: grid.axis().to_string(),
            })?;

        let levels = field.values().len_of(axis);
        if levels != grid.len() {
            return Err(DiagError::MalformedField {
                name: name.to_string(),
                reason: format!(
                    "{} levels along '{}' but the vertical grid has {}",
                    levels,
                    grid.axis(),
                    grid.len()
                ),
            });
        }

        let mut values = field.values().clone();
        if let DepthFilter::BooleanMask(mask) = filter {
            if mask.shape() != values.shape() {
                return Err(DiagError::MaskShapeMismatch {
                    field: name.to_string(),
                    expected: values.shape().to_vec(),
                    got: mask.shape().to_vec(),
                });
            }
            Zip::from(&mut values).and(mask).for_each(|v, &keep| {
                if !keep {
                    *v = f64::NAN;
                }
            });
        } else if let Some(keep_levels) = filter.level_mask(&grid) {
            for mut lane in values.lanes_mut(axis) {
                for (v, &keep) in lane.iter_mut().zip(keep_levels.iter()) {
                    if !keep {
                        *v = f64::NAN;
                    }
                }
            }
        }

        Ok(Self {
            axis,
            dims: field.dims().to_vec(),
            values,
            grid,
        })
    }

    /// Dimensions left once the vertical axis is reduced
    fn reduced_dims(&self) -> Vec<String> {
        self.dims
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != self.axis.index())
            .map(|(_, d)| d.clone())
            .collect()
    }

    fn reduce<F>(&self, f: F) -> Field
    where
        F: Fn(ndarray::ArrayView1<f64>, &Array1<f64>) -> f64,
    {
        let h = self.grid.thickness();
        let values = self.values.map_axis(self.axis, |lane| f(lane, h));
        Field::new(self.reduced_dims(), values)
    }
}

/// Thickness-weighted sum of `name` over the vertical axis.
///
/// $$ I = \sum_k f_k h_k $$
///
/// Missing and filtered-out levels do not contribute; a column without any valid
/// level integrates to zero.
pub fn integrate(dataset: &Dataset, name: &str, filter: &DepthFilter) -> DiagResult<Field> {
    let view = VerticalView::new(dataset, name, filter)?;
    Ok(view.reduce(|lane, h| {
        lane.iter()
            .zip(h.iter())
            .filter(|(v, _)| !v.is_nan())
            .map(|(v, w)| v * w)
            .sum()
    }))
}

/// Thickness-weighted mean of `name` over the vertical axis.
///
/// $$ \bar{f} = \frac{\sum_k f_k h_k}{\sum_k h_k} $$
///
/// Both sums only run over valid levels, so a column without any valid level is NaN.
pub fn average(dataset: &Dataset, name: &str, filter: &DepthFilter) -> DiagResult<Field> {
    let view = VerticalView::new(dataset, name, filter)?;
    Ok(view.reduce(|lane, h| {
        let (weighted, weights) = lane
            .iter()
            .zip(h.iter())
            .filter(|(v, _)| !v.is_nan())
            .fold((0.0_f64, 0.0_f64), |(s, w_sum), (v, w)| (s + v * w, w_sum + w));
        weighted / weights
    }))
}

/// Vertical derivative of `name`, located on the cell centres.
///
/// The field is first interpolated onto the cell interfaces (mean of the two adjacent
/// centres, with the first and last centre values extended to the top and bottom
/// interfaces), then differenced and divided by the cell thickness:
///
/// $$ \partial_z f_k = \frac{f^{outer}_{k+1} - f^{outer}_k}{h_k} $$
pub fn derivate(dataset: &Dataset, name: &str) -> DiagResult<Field> {
    let view = VerticalView::new(dataset, name, &DepthFilter::NoFilter)?;
    let h = view.grid.thickness();
    let n = view.grid.len();

    let mut out = ArrayD::<f64>::zeros(view.values.raw_dim());
    for (lane, mut result) in view
        .values
        .lanes(view.axis)
        .into_iter()
        .zip(out.lanes_mut(view.axis))
    {
        let mut outer = Array1::<f64>::zeros(n + 1);
        outer[0] = lane[0];
        outer[n] = lane[n - 1];
        for k in 1..n {
            outer[k] = 0.5 * (lane[k - 1] + lane[k]);
        }
        for k in 0..n {
            result[k] = (outer[k + 1] - outer[k]) / h[k];
        }
    }
    Ok(Field::new(view.dims, out))
}

/// Vertical extent of the levels where `name` satisfies `condition`.
///
/// This is the integral of the indicator function of the condition, i.e. the summed
/// thickness of the matching cells. Missing values never match.
pub fn extent_where(dataset: &Dataset, name: &str, condition: ExtentCondition) -> DiagResult<Field> {
    let view = VerticalView::new(dataset, name, &DepthFilter::NoFilter)?;
    Ok(view.reduce(|lane, h| {
        lane.iter()
            .zip(h.iter())
            .filter(|(v, _)| condition.holds(**v))
            .map(|(_, w)| w)
            .sum()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{attributes, AttrValue};
    use is_close::is_close;
    use ndarray::{array, IxDyn};

    /// Three levels centred at 1, 4 and 10 m with thicknesses 2, 4 and 8 m,
    /// and two columns along `x`.
    fn column_dataset() -> Dataset {
        let mut ds = Dataset::new();
        ds.insert_coord(
            "deptht",
            Field::new(["deptht"], array![1.0, 4.0, 10.0].into_dyn())
                .with_attrs(attributes([("bounds", AttrValue::from("deptht_bounds"))])),
        );
        ds.insert(
            "deptht_bounds",
            Field::new(
                ["deptht", "axis_nbounds"],
                array![[0.0, 2.0], [2.0, 6.0], [6.0, 14.0]].into_dyn(),
            ),
        );
        ds.insert(
            "CHL",
            Field::new(
                ["deptht", "x"],
                array![[1.0, 10.0], [2.0, f64::NAN], [3.0, 1.0]].into_dyn(),
            ),
        );
        ds.insert("surface", Field::new(["x"], array![1.0, 2.0].into_dyn()));
        ds
    }

    fn column(field: &Field, i: usize) -> f64 {
        field.values()[IxDyn(&[i])]
    }

    #[test]
    fn filter_from_bounds() {
        assert_eq!(DepthFilter::from_bounds(None, None), DepthFilter::NoFilter);
        assert_eq!(
            DepthFilter::from_bounds(None, Some(5.0)),
            DepthFilter::DepthBelow(5.0)
        );
        assert_eq!(
            DepthFilter::from_bounds(Some(2.0), None),
            DepthFilter::DepthAbove(2.0)
        );
        assert_eq!(
            DepthFilter::from_bounds(Some(2.0), Some(5.0)),
            DepthFilter::DepthRange {
                upper: 2.0,
                lower: 5.0
            }
        );
    }

    #[test]
    fn integrate_full_column() {
        let ds = column_dataset();
        let result = integrate(&ds, "CHL", &DepthFilter::NoFilter).unwrap();

        assert_eq!(result.dims(), &["x".to_string()]);
        // 1*2 + 2*4 + 3*8
        assert_eq!(column(&result, 0), 34.0);
        // NaN level skipped: 10*2 + 1*8
        assert_eq!(column(&result, 1), 28.0);
    }

    #[test]
    fn integrate_shallower_than_lower_bound() {
        let ds = column_dataset();
        let result = integrate(&ds, "CHL", &DepthFilter::DepthBelow(5.0)).unwrap();
        assert_eq!(column(&result, 0), 10.0);
        assert_eq!(column(&result, 1), 20.0);
    }

    #[test]
    fn integrate_deeper_than_upper_bound() {
        let ds = column_dataset();
        let result = integrate(&ds, "CHL", &DepthFilter::DepthAbove(2.0)).unwrap();
        assert_eq!(column(&result, 0), 32.0);
        assert_eq!(column(&result, 1), 8.0);
    }

    #[test]
    fn integrate_depth_range_requires_both_bounds() {
        let ds = column_dataset();
        let filter = DepthFilter::from_bounds(Some(2.0), Some(5.0));
        let result = integrate(&ds, "CHL", &filter).unwrap();
        assert_eq!(column(&result, 0), 8.0);
        // Only the missing level lies in the range
        assert_eq!(column(&result, 1), 0.0);
    }

    #[test]
    fn average_weights_by_thickness() {
        let ds = column_dataset();
        let result = average(&ds, "CHL", &DepthFilter::NoFilter).unwrap();
        assert!(is_close!(column(&result, 0), 34.0 / 14.0));
        assert!(is_close!(column(&result, 1), 2.8));
    }

    #[test]
    fn average_of_empty_selection_is_nan() {
        let ds = column_dataset();
        let filter = DepthFilter::DepthRange {
            upper: 2.0,
            lower: 5.0,
        };
        let result = average(&ds, "CHL", &filter).unwrap();
        assert_eq!(column(&result, 0), 2.0);
        assert!(column(&result, 1).is_nan());
    }

    #[test]
    fn average_with_boolean_mask() {
        let ds = column_dataset();
        let mask = array![[true, false], [false, false], [true, true]].into_dyn();
        let result = average(&ds, "CHL", &DepthFilter::BooleanMask(mask)).unwrap();
        // (1*2 + 3*8) / (2 + 8)
        assert!(is_close!(column(&result, 0), 2.6));
        assert!(is_close!(column(&result, 1), 1.0));
    }

    #[test]
    fn boolean_mask_must_match_shape() {
        let ds = column_dataset();
        let mask = array![true, false, true].into_dyn();
        let err = average(&ds, "CHL", &DepthFilter::BooleanMask(mask)).unwrap_err();
        assert_eq!(
            err,
            DiagError::MaskShapeMismatch {
                field: "CHL".to_string(),
                expected: vec![3, 2],
                got: vec![3],
            }
        );
    }

    #[test]
    fn derivative_extends_boundary_values() {
        let ds = column_dataset();
        let result = derivate(&ds, "CHL").unwrap();
        assert_eq!(result.dims(), &["deptht".to_string(), "x".to_string()]);

        let values = result.values();
        // Interfaces: [1, 1.5, 2.5, 3]
        assert_eq!(values[IxDyn(&[0, 0])], 0.25);
        assert_eq!(values[IxDyn(&[1, 0])], 0.25);
        assert_eq!(values[IxDyn(&[2, 0])], 0.0625);
    }

    #[test]
    fn extent_below_threshold() {
        let ds = column_dataset();
        let result = extent_where(&ds, "CHL", ExtentCondition::Below(2.5)).unwrap();
        assert_eq!(column(&result, 0), 6.0);
        // 1.0 at the bottom matches, NaN never does
        assert_eq!(column(&result, 1), 8.0);

        let result = extent_where(&ds, "CHL", ExtentCondition::Above(2.5)).unwrap();
        assert_eq!(column(&result, 0), 8.0);
        assert_eq!(column(&result, 1), 2.0);
    }

    #[test]
    fn field_without_vertical_dimension() {
        let ds = column_dataset();
        let err = integrate(&ds, "surface", &DepthFilter::NoFilter).unwrap_err();
        assert_eq!(
            err,
            DiagError::MissingDimension {
                field: "surface".to_string(),
                dimension: "deptht".to_string(),
            }
        );
    }

    #[test]
    fn missing_grid_metadata_propagates() {
        let mut ds = column_dataset();
        ds.remove("deptht_bounds");
        for result in [
            integrate(&ds, "CHL", &DepthFilter::NoFilter),
            average(&ds, "CHL", &DepthFilter::NoFilter),
            derivate(&ds, "CHL"),
        ] {
            assert!(matches!(
                result,
                Err(DiagError::MissingGridMetadata { .. })
            ));
        }
    }
}

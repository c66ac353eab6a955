//! Separable-axis resampling.
//!
//! On a separable target grid a source coordinate can be turned into a
//! target row and column with two 1-D interpolations instead of a 2-D
//! nearest-neighbour search.

use ndarray::{Array2, ArrayView2};
use tracing::debug;

use crate::aggregate::{aggregate, scatter};
use crate::error::{RegridError, Result};
use crate::interpolation::AxisInterpolator;
use crate::types::{AggregationRule, BoundingBox, LatLonGrid, SamplingMethod};

/// Maps source samples onto a separable target grid by axis interpolation.
#[derive(Debug, Clone)]
pub struct AxisIndexResampler<'a> {
    target: &'a LatLonGrid,
    bounds: BoundingBox,
    rows: AxisInterpolator,
    cols: AxisInterpolator,
}

impl<'a> AxisIndexResampler<'a> {
    /// Prepare the row and column interpolators for `target`.
    ///
    /// Fails with [`RegridError::NonSeparableTargetGrid`] when latitude is not
    /// a strictly decreasing function of the row alone or longitude is not a
    /// strictly increasing function of the column alone.
    pub fn new(target: &'a LatLonGrid, sampling: SamplingMethod) -> Result<Self> {
        target.check_separable()?;

        let lat_axis = target.lat_axis().to_vec();
        let lon_axis = target.lon_axis().to_vec();
        // Separable: the first entry of each axis is its max (lat) or min (lon)
        let bounds = BoundingBox::new(
            lon_axis[0],
            lat_axis[lat_axis.len() - 1],
            lon_axis[lon_axis.len() - 1],
            lat_axis[0],
        );

        Ok(Self {
            target,
            bounds,
            rows: AxisInterpolator::for_axis(&lat_axis, sampling)?,
            cols: AxisInterpolator::for_axis(&lon_axis, sampling)?,
        })
    }

    /// Extent of the target axes.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Target cell id for one source sample, if it lands on the grid.
    ///
    /// The sample must satisfy `min_lat < lat <= max_lat` and
    /// `min_lon <= lon < max_lon`; fractional indices are truncated.
    pub fn cell_id(&self, lat: f64, lon: f64) -> Option<usize> {
        if !self.bounds.contains_half_open(lon, lat) {
            return None;
        }
        let row = self.rows.eval(lat)?;
        let col = self.cols.eval(lon)?;
        if row.is_nan() || col.is_nan() {
            return None;
        }

        let (n_rows, n_cols) = self.target.shape();
        let (row, col) = (row as usize, col as usize);
        (row < n_rows && col < n_cols).then_some(row * n_cols + col)
    }

    /// `(cell id, value)` pairs for every valid source sample.
    pub fn assign(&self, source: &LatLonGrid, field: ArrayView2<'_, f32>) -> Vec<(usize, f32)> {
        source
            .lat()
            .iter()
            .zip(source.lon().iter())
            .zip(field.iter())
            .filter(|(_, value)| !value.is_nan())
            .filter_map(|((&lat, &lon), &value)| self.cell_id(lat, lon).map(|id| (id, value)))
            .collect()
    }

    /// Resample `field` onto the target grid.
    ///
    /// Returns the source field unchanged when the source grid equals the
    /// target grid, and an all-NaN grid when no sample lands on the target.
    pub fn resample(
        &self,
        source: &LatLonGrid,
        field: ArrayView2<'_, f32>,
        rule: AggregationRule,
    ) -> Result<Array2<f32>> {
        if field.dim() != source.shape() {
            return Err(RegridError::invalid_shape(format!(
                "field shape {:?} does not match source grid shape {:?}",
                field.dim(),
                source.shape()
            )));
        }
        if source == self.target {
            debug!("Source grid equals target grid, skipping resampling");
            return Ok(field.to_owned());
        }

        let pairs = self.assign(source, field);
        debug!(
            samples = field.len(),
            assigned = pairs.len(),
            sampling = %self.rows.method(),
            rule = %rule,
            "Assigned samples by axis interpolation"
        );

        let cells = aggregate(pairs, rule);
        Ok(scatter(&cells, self.target.shape()))
    }
}

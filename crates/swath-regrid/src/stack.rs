//! Helpers for (rows, cols, layers) stacks built from many swaths.

use chrono::{Datelike, NaiveDate};
use ndarray::{s, Array2, Array3, ArrayView3, Axis};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{RegridError, Result};
use crate::index::CoordinateIndex;
use crate::types::{BoundingBox, LatLonGrid};

/// Number of days in `year`.
pub fn days_in_year(year: i32) -> Result<u32> {
    NaiveDate::from_ymd_opt(year, 12, 31)
        .map(|d| d.ordinal())
        .ok_or_else(|| RegridError::config(format!("year {year} is out of range")))
}

/// Build a daily stack indexed by day-of-year.
///
/// The stack has `days_in_year + 1` layers so that layer `doy` holds day
/// `doy`; layer 0 and every day without data stay NaN. A later entry for the
/// same day overwrites an earlier one.
pub fn assemble_doy_stack<I>(year: i32, shape: (usize, usize), layers: I) -> Result<Array3<f32>>
where
    I: IntoIterator<Item = (u32, Array2<f32>)>,
{
    let days = days_in_year(year)?;
    let mut stack = Array3::from_elem((shape.0, shape.1, days as usize + 1), f32::NAN);

    let mut filled = 0usize;
    for (doy, layer) in layers {
        if doy == 0 || doy > days {
            return Err(RegridError::InvalidDayOfYear { year, doy, days });
        }
        if layer.dim() != shape {
            return Err(RegridError::invalid_shape(format!(
                "layer for day {doy} has shape {:?}, expected {:?}",
                layer.dim(),
                shape
            )));
        }
        stack.index_axis_mut(Axis(2), doy as usize).assign(&layer);
        filled += 1;
    }

    debug!(year, days, filled, "Assembled day-of-year stack");
    Ok(stack)
}

/// Cut the rows and columns of `grid` and `stack` that overlap `bbox`.
///
/// The kept rows span every row holding a latitude inside the box and the
/// kept columns span every column holding a longitude inside it (edges
/// inclusive). Returns `None` when either range is empty.
pub fn extract_region(
    grid: &LatLonGrid,
    stack: ArrayView3<'_, f32>,
    bbox: &BoundingBox,
) -> Result<Option<(LatLonGrid, Array3<f32>)>> {
    let (rows, cols, _) = stack.dim();
    if (rows, cols) != grid.shape() {
        return Err(RegridError::invalid_shape(format!(
            "stack layer shape {:?} does not match grid shape {:?}",
            (rows, cols),
            grid.shape()
        )));
    }

    let lat_rows = index_span(grid.lat().indexed_iter().filter_map(|((r, _), &lat)| {
        (lat >= bbox.min_lat && lat <= bbox.max_lat).then_some(r)
    }));
    let lon_cols = index_span(grid.lon().indexed_iter().filter_map(|((_, c), &lon)| {
        (lon >= bbox.min_lon && lon <= bbox.max_lon).then_some(c)
    }));

    let (Some((r0, r1)), Some((c0, c1))) = (lat_rows, lon_cols) else {
        return Ok(None);
    };

    let sub_grid = LatLonGrid::new(
        grid.lat().slice(s![r0..=r1, c0..=c1]).to_owned(),
        grid.lon().slice(s![r0..=r1, c0..=c1]).to_owned(),
    )?;
    let sub_stack = stack.slice(s![r0..=r1, c0..=c1, ..]).to_owned();
    Ok(Some((sub_grid, sub_stack)))
}

fn index_span(indices: impl Iterator<Item = usize>) -> Option<(usize, usize)> {
    indices.fold(None, |span, i| match span {
        None => Some((i, i)),
        Some((lo, hi)) => Some((lo.min(i), hi.max(i))),
    })
}

/// NaN-aware mean over rows and columns, one value per layer.
pub fn spatial_mean(stack: ArrayView3<'_, f32>) -> Vec<f32> {
    stack
        .axis_iter(Axis(2))
        .map(|layer| {
            let (sum, n) = layer
                .iter()
                .filter(|v| !v.is_nan())
                .fold((0.0f64, 0usize), |(s, n), &v| (s + v as f64, n + 1));
            if n == 0 {
                f32::NAN
            } else {
                (sum / n as f64) as f32
            }
        })
        .collect()
}

/// Count how many swath points fall nearest to each target cell.
///
/// Every finite swath point is assigned to its nearest target point, with no
/// bounding-box filter. Swaths are processed in parallel and summed.
pub fn count_observations(target: &LatLonGrid, swaths: &[LatLonGrid]) -> Array2<u32> {
    let index = CoordinateIndex::build(target);
    let shape = target.shape();

    let counts = swaths
        .par_iter()
        .map(|swath| {
            let mut local = Array2::<u32>::zeros(shape);
            if let Some(flat) = local.as_slice_mut() {
                for (&lat, &lon) in swath.lat().iter().zip(swath.lon().iter()) {
                    if let Some(id) = index.nearest(lat, lon) {
                        flat[id] += 1;
                    }
                }
            }
            local
        })
        .reduce(|| Array2::<u32>::zeros(shape), |a, b| a + b);

    debug!(
        swaths = swaths.len(),
        observations = counts.sum(),
        "Counted swath observations"
    );
    counts
}

//! Source magnification.
//!
//! When the target grid is much finer than the source, most target cells
//! receive no sample. Magnifying the source first densifies the candidate
//! points: coordinates are upsampled bilinearly, values are replicated from
//! the nearest source sample so no new physical values are invented.

use ndarray::{Array2, ArrayView2};
use tracing::debug;

use crate::error::{RegridError, Result};
use crate::interpolation::{bilinear_interpolate, nearest_interpolate};
use crate::types::LatLonGrid;

/// Upsample a source grid and its field by `factor` along both axes.
///
/// The output has shape `(rows * factor, cols * factor)`. Output index `i`
/// reads input position `i * (n - 1) / (n * factor - 1)`, so the first and
/// last samples of each axis stay on the input corners. A factor of 1
/// returns copies of the inputs.
pub fn magnify(
    grid: &LatLonGrid,
    field: ArrayView2<'_, f32>,
    factor: usize,
) -> Result<(LatLonGrid, Array2<f32>)> {
    if factor == 0 {
        return Err(RegridError::InvalidMagnification(factor));
    }
    if field.dim() != grid.shape() {
        return Err(RegridError::invalid_shape(format!(
            "field shape {:?} does not match source grid shape {:?}",
            field.dim(),
            grid.shape()
        )));
    }
    if factor == 1 {
        return Ok((grid.clone(), field.to_owned()));
    }

    let (rows, cols) = grid.shape();
    let out_rows = rows * factor;
    let out_cols = cols * factor;
    let scale_y = axis_scale(rows, out_rows);
    let scale_x = axis_scale(cols, out_cols);

    let lat = Array2::from_shape_fn((out_rows, out_cols), |(r, c)| {
        bilinear_interpolate(grid.lat().view(), c as f64 * scale_x, r as f64 * scale_y)
    });
    let lon = Array2::from_shape_fn((out_rows, out_cols), |(r, c)| {
        bilinear_interpolate(grid.lon().view(), c as f64 * scale_x, r as f64 * scale_y)
    });
    let values = Array2::from_shape_fn((out_rows, out_cols), |(r, c)| {
        nearest_interpolate(field, c as f64 * scale_x, r as f64 * scale_y).unwrap_or(f32::NAN)
    });

    debug!(
        factor,
        from = ?(rows, cols),
        to = ?(out_rows, out_cols),
        "Magnified source grid"
    );

    Ok((LatLonGrid::new(lat, lon)?, values))
}

fn axis_scale(input: usize, output: usize) -> f64 {
    (input - 1) as f64 / (output - 1).max(1) as f64
}

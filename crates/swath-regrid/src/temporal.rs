//! NaN-aware moving average along the layer axis.

use ndarray::{Array2, Array3, ArrayView3, Axis, Zip};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{RegridError, Result};

/// Smooth a (rows, cols, layers) stack with a centred moving average.
///
/// The layer axis is padded with `window / 2` missing layers on each side and
/// output layer `k` is the NaN-aware mean of padded layers `k..k + window`.
/// Missing samples, including the padding, are left out of the mean; a
/// window with no valid sample yields NaN.
pub fn smooth_temporal(stack: ArrayView3<'_, f32>, window: usize) -> Result<Array3<f32>> {
    if window == 0 {
        return Err(RegridError::InvalidWindow(window));
    }
    let (rows, cols, layers) = stack.dim();
    let pad = window / 2;

    let smoothed: Vec<Array2<f32>> = (0..layers)
        .into_par_iter()
        .map(|k| {
            let first = k.saturating_sub(pad);
            let end = (k + window).saturating_sub(pad).min(layers);
            window_mean(stack, first..end, (rows, cols))
        })
        .collect();

    let mut output = Array3::from_elem((rows, cols, layers), f32::NAN);
    for (k, layer) in smoothed.iter().enumerate() {
        output.index_axis_mut(Axis(2), k).assign(layer);
    }

    debug!(layers, window, "Smoothed stack along layer axis");
    Ok(output)
}

fn window_mean(
    stack: ArrayView3<'_, f32>,
    range: std::ops::Range<usize>,
    shape: (usize, usize),
) -> Array2<f32> {
    let mut sum = Array2::<f64>::zeros(shape);
    let mut count = Array2::<u32>::zeros(shape);

    for l in range {
        Zip::from(&mut sum)
            .and(&mut count)
            .and(stack.index_axis(Axis(2), l))
            .for_each(|s, n, &v| {
                if !v.is_nan() {
                    *s += v as f64;
                    *n += 1;
                }
            });
    }

    Zip::from(&sum).and(&count).map_collect(|&s, &n| {
        if n == 0 {
            f32::NAN
        } else {
            (s / n as f64) as f32
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f32]) -> Array3<f32> {
        Array3::from_shape_fn((1, 1, values.len()), |(_, _, l)| values[l])
    }

    #[test]
    fn test_window_three_edges_use_available_layers() {
        let stack = series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let out = smooth_temporal(stack.view(), 3).unwrap();

        // Layer 0 averages layers 0 and 1 only
        assert_eq!(out[[0, 0, 0]], 1.5);
        assert_eq!(out[[0, 0, 1]], 2.0);
        assert_eq!(out[[0, 0, 2]], 3.0);
        assert_eq!(out[[0, 0, 4]], 4.5);
    }

    #[test]
    fn test_even_window_looks_back() {
        // Window 2 covers layers k-1 and k
        let stack = series(&[2.0, 4.0, 6.0]);
        let out = smooth_temporal(stack.view(), 2).unwrap();
        assert_eq!(out[[0, 0, 0]], 2.0);
        assert_eq!(out[[0, 0, 1]], 3.0);
        assert_eq!(out[[0, 0, 2]], 5.0);
    }

    #[test]
    fn test_missing_samples_are_skipped() {
        let stack = series(&[f32::NAN, 3.0, f32::NAN, f32::NAN, f32::NAN]);
        let out = smooth_temporal(stack.view(), 3).unwrap();

        assert_eq!(out[[0, 0, 0]], 3.0);
        assert_eq!(out[[0, 0, 2]], 3.0);
        // Entire window missing
        assert!(out[[0, 0, 4]].is_nan());
    }

    #[test]
    fn test_window_one_is_identity() {
        let stack = Array3::from_shape_fn((2, 2, 3), |(r, c, l)| (r + c * 2 + l * 4) as f32);
        let out = smooth_temporal(stack.view(), 1).unwrap();
        assert_eq!(out, stack);
    }

    #[test]
    fn test_zero_window_rejected() {
        let stack = series(&[1.0]);
        assert!(matches!(
            smooth_temporal(stack.view(), 0),
            Err(RegridError::InvalidWindow(0))
        ));
    }
}

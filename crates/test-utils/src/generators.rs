//! Test data generators for swath and grid coordinates and fields.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

use ndarray::{Array2, Array3};

/// Creates cell-centre coordinates for a regular north-up grid.
///
/// Row 0 is the northernmost row. Latitude of row `r` is
/// `max_lat - (r + 0.5) * resolution`, longitude of column `c` is
/// `min_lon + (c + 0.5) * resolution`.
///
/// # Returns
///
/// `(lat, lon)` arrays of shape `(rows, cols)`.
///
/// # Example
///
/// ```
/// use test_utils::regular_coords;
///
/// let (lat, lon) = regular_coords((0.0, 0.0, 4.0, 2.0), 1.0);
/// assert_eq!(lat.dim(), (2, 4));
/// assert_eq!(lat[[0, 0]], 1.5);
/// assert_eq!(lon[[0, 3]], 3.5);
/// ```
pub fn regular_coords(bbox: (f64, f64, f64, f64), resolution: f64) -> (Array2<f64>, Array2<f64>) {
    let (min_lon, min_lat, max_lon, max_lat) = bbox;
    let rows = ((max_lat - min_lat) / resolution).round() as usize;
    let cols = ((max_lon - min_lon) / resolution).round() as usize;
    let lat = Array2::from_shape_fn((rows, cols), |(r, _)| max_lat - (r as f64 + 0.5) * resolution);
    let lon = Array2::from_shape_fn((rows, cols), |(_, c)| min_lon + (c as f64 + 0.5) * resolution);
    (lat, lon)
}

/// Creates coordinates for a swath tilted against the meridians.
///
/// Moving along a row shifts latitude by `tilt * step`, moving down a column
/// shifts longitude by `tilt * step`, so the result is never separable when
/// `tilt != 0`.
///
/// # Arguments
///
/// * `rows`, `cols` - Swath shape
/// * `origin` - `(lat, lon)` of the first sample
/// * `step` - Spacing between neighbouring samples in degrees
/// * `tilt` - Cross-coupling between the two axes
pub fn tilted_swath(
    rows: usize,
    cols: usize,
    origin: (f64, f64),
    step: f64,
    tilt: f64,
) -> (Array2<f64>, Array2<f64>) {
    let (lat0, lon0) = origin;
    let lat = Array2::from_shape_fn((rows, cols), |(r, c)| {
        lat0 - r as f64 * step + c as f64 * step * tilt
    });
    let lon = Array2::from_shape_fn((rows, cols), |(r, c)| {
        lon0 + c as f64 * step + r as f64 * step * tilt
    });
    (lat, lon)
}

/// Creates a field with predictable values.
///
/// Each cell value is `col * 1000 + row`, so a value identifies its origin.
///
/// # Example
///
/// ```
/// use test_utils::create_test_field;
///
/// let field = create_test_field(5, 10);
/// assert_eq!(field.dim(), (5, 10));
/// assert_eq!(field[[1, 0]], 1.0);
/// assert_eq!(field[[0, 1]], 1000.0);
/// ```
pub fn create_test_field(rows: usize, cols: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(row, col)| (col * 1000 + row) as f32)
}

/// Creates a field with temperature-like values in Kelvin.
///
/// Values range from approximately 250K to 310K, as a gradient from the
/// top-left to the bottom-right.
pub fn create_temperature_field(rows: usize, cols: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(row, col)| {
        let x_factor = col as f32 / cols.max(1) as f32;
        let y_factor = row as f32 / rows.max(1) as f32;
        250.0 + (x_factor * 30.0) + (y_factor * 30.0)
    })
}

/// Creates a categorical field with integer class codes in `0..classes`.
///
/// Deterministic for a given seed.
pub fn create_categorical_field(rows: usize, cols: usize, classes: u32, seed: u32) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(row, col)| {
        (simple_hash(col as u32, row as u32, seed) % classes.max(1)) as f32
    })
}

/// Creates a field with NaN values at specified positions.
///
/// # Arguments
///
/// * `rows`, `cols` - Field shape
/// * `value` - Fill value for every other cell
/// * `nan_positions` - List of (row, col) positions that should be NaN
pub fn create_field_with_nans(
    rows: usize,
    cols: usize,
    value: f32,
    nan_positions: &[(usize, usize)],
) -> Array2<f32> {
    let mut data = Array2::from_elem((rows, cols), value);
    for &(row, col) in nan_positions {
        if row < rows && col < cols {
            data[[row, col]] = f32::NAN;
        }
    }
    data
}

/// Creates a (rows, cols, layers) stack with scattered missing samples.
///
/// Roughly one sample in `nan_every` is NaN (0 disables holes). Valid samples
/// lie in `0.0..100.0`. Deterministic for a given seed.
pub fn create_stack_with_gaps(
    rows: usize,
    cols: usize,
    layers: usize,
    nan_every: u32,
    seed: u32,
) -> Array3<f32> {
    Array3::from_shape_fn((rows, cols, layers), |(row, col, layer)| {
        let hash = simple_hash(col as u32, row as u32, seed.wrapping_add(layer as u32));
        if nan_every > 0 && hash % nan_every == 0 {
            f32::NAN
        } else {
            (hash % 10_000) as f32 / 100.0
        }
    })
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

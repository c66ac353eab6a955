//! Single-layer regridding entry point.
//!
//! ```text
//! resample(target, source, field, params)
//!      │
//!      ├─► validate shapes (fail fast)
//!      ├─► source == target ? return field
//!      ├─► magnify source (factor > 1)
//!      │
//!      ├─► target separable ─► AxisIndexResampler ─┐
//!      └─► otherwise ────────► CoordinateIndex ────┤
//!                                                  ▼
//!                                      aggregate + scatter
//! ```

use ndarray::{Array2, ArrayView2};
use tracing::debug;

use crate::aggregate::{aggregate, scatter};
use crate::axis::AxisIndexResampler;
use crate::error::{RegridError, Result};
use crate::index::CoordinateIndex;
use crate::magnify::magnify;
use crate::types::{AggregationRule, LatLonGrid, ResampleParams, ResampleStrategy};

/// Regrid one 2-D field from `source` onto `target`.
///
/// The output always has the target shape; cells that received no valid
/// sample are NaN.
pub fn resample(
    target: &LatLonGrid,
    source: &LatLonGrid,
    field: ArrayView2<'_, f32>,
    params: &ResampleParams,
) -> Result<Array2<f32>> {
    validate(source, field, params)?;

    if source == target {
        debug!("Source grid equals target grid, resampling is not required");
        return Ok(field.to_owned());
    }

    if params.magnification > 1 {
        let (grid, values) = magnify(source, field, params.magnification)?;
        route(target, &grid, values.view(), params)
    } else {
        route(target, source, field, params)
    }
}

/// Shape and parameter checks shared by the single-layer and stack paths.
pub(crate) fn validate(
    source: &LatLonGrid,
    field: ArrayView2<'_, f32>,
    params: &ResampleParams,
) -> Result<()> {
    if field.dim() != source.shape() {
        return Err(RegridError::invalid_shape(format!(
            "field shape {:?} does not match source grid shape {:?}",
            field.dim(),
            source.shape()
        )));
    }
    if params.magnification == 0 {
        return Err(RegridError::InvalidMagnification(params.magnification));
    }
    Ok(())
}

fn route(
    target: &LatLonGrid,
    source: &LatLonGrid,
    field: ArrayView2<'_, f32>,
    params: &ResampleParams,
) -> Result<Array2<f32>> {
    if params.strategy == ResampleStrategy::Auto {
        match AxisIndexResampler::new(target, params.sampling) {
            Ok(resampler) => return resampler.resample(source, field, params.aggregation),
            Err(RegridError::NonSeparableTargetGrid(reason)) => {
                debug!(%reason, "Target grid is not separable, using nearest-index search");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(resample_nearest_index(target, source, field, params.aggregation))
}

/// Generic path: assign each source sample to the target point nearest to it.
///
/// Samples outside the closed bounding box of the target coordinates are
/// dropped, so a source that does not overlap the target yields all NaN.
pub fn resample_nearest_index(
    target: &LatLonGrid,
    source: &LatLonGrid,
    field: ArrayView2<'_, f32>,
    rule: AggregationRule,
) -> Array2<f32> {
    let bounds = target.bounds();
    let index = CoordinateIndex::build(target);

    let pairs: Vec<(usize, f32)> = source
        .lat()
        .iter()
        .zip(source.lon().iter())
        .zip(field.iter())
        .filter(|((&lat, &lon), value)| !value.is_nan() && bounds.contains(lon, lat))
        .filter_map(|((&lat, &lon), &value)| index.nearest(lat, lon).map(|id| (id, value)))
        .collect();

    debug!(
        samples = field.len(),
        assigned = pairs.len(),
        target_points = index.len(),
        rule = %rule,
        "Assigned samples by nearest-index search"
    );

    let cells = aggregate(pairs, rule);
    scatter(&cells, target.shape())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, SamplingMethod};
    use ndarray::array;

    fn regular_target() -> LatLonGrid {
        LatLonGrid::regular(&BoundingBox::new(0.0, 0.0, 4.0, 4.0), 1.0).unwrap()
    }

    /// A 2x2 source with one sample inside each quadrant of the target.
    fn quadrant_source() -> (LatLonGrid, Array2<f32>) {
        let grid = LatLonGrid::new(
            array![[3.4, 3.4], [1.4, 1.4]],
            array![[0.6, 2.6], [0.6, 2.6]],
        )
        .unwrap();
        (grid, array![[1.0, 2.0], [3.0, 4.0]])
    }

    #[test]
    fn test_identity_returns_field() {
        let target = regular_target();
        let field = Array2::from_shape_fn((4, 4), |(r, c)| (r * 4 + c) as f32);
        for strategy in [ResampleStrategy::Auto, ResampleStrategy::NearestIndex] {
            let params = ResampleParams::default().with_strategy(strategy).with_magnification(3);
            let out = resample(&target, &target, field.view(), &params).unwrap();
            assert_eq!(out, field);
        }
    }

    #[test]
    fn test_both_strategies_agree_on_separable_target() {
        let target = regular_target();
        let (source, field) = quadrant_source();

        let auto = resample(&target, &source, field.view(), &ResampleParams::default()).unwrap();
        let generic = resample(
            &target,
            &source,
            field.view(),
            &ResampleParams::default().with_strategy(ResampleStrategy::NearestIndex),
        )
        .unwrap();

        assert_eq!(auto.dim(), (4, 4));
        assert_eq!(auto[[0, 0]], 1.0);
        assert_eq!(auto[[0, 2]], 2.0);
        assert_eq!(auto[[2, 0]], 3.0);
        assert_eq!(auto[[2, 2]], 4.0);
        for (a, g) in auto.iter().zip(generic.iter()) {
            assert!(a == g || (a.is_nan() && g.is_nan()));
        }
    }

    #[test]
    fn test_non_separable_target_falls_back() {
        // Slightly rotated target: latitude varies along rows
        let target = LatLonGrid::new(
            array![[1.0, 1.1], [0.0, 0.1]],
            array![[0.0, 1.0], [0.0, 1.0]],
        )
        .unwrap();
        let source = LatLonGrid::new(array![[0.9, 0.05]], array![[0.1, 0.9]]).unwrap();
        let field = array![[5.0f32, 7.0]];

        let out = resample(&target, &source, field.view(), &ResampleParams::default()).unwrap();

        assert_eq!(out[[0, 0]], 5.0);
        assert_eq!(out[[1, 1]], 7.0);
        assert!(out[[0, 1]].is_nan());
    }

    #[test]
    fn test_rejects_mismatched_field() {
        let target = regular_target();
        let (source, _) = quadrant_source();
        let field = array![[1.0f32, 2.0, 3.0]];

        let err = resample(&target, &source, field.view(), &ResampleParams::default()).unwrap_err();
        assert!(matches!(err, RegridError::InvalidGridShape(_)));
    }

    #[test]
    fn test_magnification_fills_more_cells() {
        let target = LatLonGrid::regular(&BoundingBox::new(0.0, 0.0, 8.0, 8.0), 1.0).unwrap();
        let source = LatLonGrid::regular(&BoundingBox::new(0.0, 0.0, 8.0, 8.0), 4.0).unwrap();
        let field = array![[1.0f32, 2.0], [3.0, 4.0]];
        let params = ResampleParams::new(SamplingMethod::Nearest, AggregationRule::Mean);

        let plain = resample(&target, &source, field.view(), &params).unwrap();
        let magnified =
            resample(&target, &source, field.view(), &params.with_magnification(4)).unwrap();

        let filled = |a: &Array2<f32>| a.iter().filter(|v| !v.is_nan()).count();
        assert_eq!(filled(&plain), 4);
        assert!(filled(&magnified) > filled(&plain));
        // Magnification replicates values, never invents new ones
        assert!(magnified
            .iter()
            .all(|v| v.is_nan() || [1.0, 2.0, 3.0, 4.0].contains(v)));
    }
}
